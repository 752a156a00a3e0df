use anyhow::{anyhow, Result};
use salesdash::config::ServerConfig;
use salesdash::logging::{self, log, obj, v_str, Domain, Level};
use salesdash::server::{self, Dashboard};

fn main() -> Result<()> {
    let cfg = ServerConfig::from_env()
        .apply_args(std::env::args().skip(1))
        .map_err(|e| anyhow!(e))?;

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("run_id", v_str(logging::run_id())),
            ("addr", v_str(&cfg.bind_addr())),
            ("debug", serde_json::json!(cfg.debug)),
        ]),
    );

    let dashboard = Dashboard::generated(&cfg.title);
    let manifest = dashboard.manifest();
    logging::log_dataset_ready(
        dashboard.records().len(),
        manifest.total_sales,
        &manifest.hash_sha256,
    );

    server::serve(&cfg, &dashboard)
}
