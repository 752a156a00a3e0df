use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub title: String,
    /// Log every request at info instead of debug.
    pub debug: bool,
    /// How long a connection may sit before its request head arrives.
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            title: "Energy NZ Dash".to_string(),
            debug: false,
            read_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(d.host),
            port: lookup("PORT").and_then(|v| v.trim().parse().ok()).unwrap_or(d.port),
            title: lookup("DASH_TITLE").unwrap_or(d.title),
            debug: lookup("DEBUG").map(|v| parse_flag(&v)).unwrap_or(d.debug),
            read_timeout_ms: lookup("READ_TIMEOUT_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(d.read_timeout_ms),
        }
    }

    /// Apply `--host <h>` / `--port <n>` / `--debug` overrides from the command line.
    pub fn apply_args<I>(mut self, args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" => {
                    self.host = args.next().ok_or("--host needs a value")?;
                }
                "--port" => {
                    let v = args.next().ok_or("--port needs a value")?;
                    self.port = v.parse().map_err(|e| format!("bad --port {}: {}", v, e))?;
                }
                "--debug" => self.debug = true,
                other => return Err(format!("unknown argument: {}", other)),
            }
        }
        Ok(self)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
