//! Structured JSON-lines logging.
//!
//! Every record is one JSON object on stdout carrying a run id and a
//! process-wide sequence number. When `LOG_DIR` is set, records are also
//! appended to `<LOG_DIR>/<run_id>/events.jsonl`.
//!
//! Filtering is driven by the environment:
//! - `LOG_LEVEL`: minimum level (`trace`..`fatal`, default `info`)
//! - `LOG_DOMAINS`: comma-separated domains, or `all`
//! - `PROFILE_SAMPLE`: fraction of [`ProfileScope`]s that emit timings

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,     // Dataset generation, export
    Pipeline, // Filter/aggregate runs
    Http,     // Requests, responses, socket errors
    System,   // Startup, shutdown, config
    Profile,  // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Pipeline => "pipeline",
            Domain::Http => "http",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn enabled_in(&self, spec: &str) -> bool {
        spec == "all" || spec.split(',').any(|d| d.trim() == self.as_str())
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS") {
            Ok(spec) => self.enabled_in(&spec),
            Err(_) => true,
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

fn open_events_file(run_id: &str) -> Option<Mutex<BufWriter<File>>> {
    let base = std::env::var("LOG_DIR").ok()?;
    let mut run_dir = PathBuf::from(base);
    run_dir.push(run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return None;
    }
    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(run_dir.join("events.jsonl"))
    {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to open events log: {}", err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let events = open_events_file(&run_id);
        RunContext { run_id, events }
    })
}

/// Id shared by every record this process emits.
pub fn run_id() -> &'static str {
    &ensure_run_context().run_id
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

pub fn ts_epoch_secs() -> u64 {
    Utc::now().timestamp() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let ctx = ensure_run_context();
    let line = format_record(&ctx.run_id, next_seq(), level, domain, event, fields);
    if let Some(writer) = &ctx.events {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
    println!("{}", line);
}

fn format_record(
    run_id: &str,
    seq: u64,
    level: Level,
    domain: Domain,
    event: &str,
    mut fields: Map<String, Value>,
) -> String {
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(seq));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry).to_string()
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Domain helpers
// =============================================================================

pub fn log_dataset_ready(rows: usize, total_sales: i64, hash: &str) {
    log(
        Level::Info,
        Domain::Data,
        "dataset_ready",
        obj(&[
            ("rows", json!(rows)),
            ("total_sales", json!(total_sales)),
            ("hash_sha256", v_str(hash)),
        ]),
    );
}

pub fn log_request(level: Level, method: &str, path: &str, status: u16, bytes: usize) {
    log(
        level,
        Domain::Http,
        "request",
        obj(&[
            ("method", v_str(method)),
            ("path", v_str(path)),
            ("status", json!(status)),
            ("bytes", json!(bytes)),
        ]),
    );
}

pub fn log_update(seq: u64, products: usize, regions: usize, rows: usize, total_sales: i64) {
    log(
        Level::Debug,
        Domain::Pipeline,
        "update",
        obj(&[
            ("update_seq", json!(seq)),
            ("products", json!(products)),
            ("regions", json!(regions)),
            ("rows", json!(rows)),
            ("total_sales", json!(total_sales)),
        ]),
    );
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits a `profile` record with the elapsed time when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    let bucket = (seq % 10_000) as f64 / 10_000.0;
                    bucket < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
