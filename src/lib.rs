pub mod config;
pub mod data;
pub mod logging;
pub mod pipeline;
pub mod server;
