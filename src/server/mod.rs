//! HTTP front end.
//!
//! A blocking, one-connection-at-a-time server. [`Dashboard::handle`] maps a
//! parsed request line to a response and does not touch the socket, so the
//! routing is testable without binding a port.
//!
//! Endpoints:
//!   GET /                 - dashboard page
//!   GET /api/health       - health check
//!   GET /api/options      - product and region labels
//!   GET /api/records      - full dataset as JSON
//!   GET /api/records.csv  - full dataset as CSV
//!   GET /api/manifest     - dataset manifest
//!   GET /api/update       - derived views for ?product=..&region=..

pub mod page;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::ServerConfig;
use crate::data::manifest::{build_manifest, DatasetManifest};
use crate::data::{self, SalesRecord, PRODUCTS, REGIONS};
use crate::logging::{self, log, obj, v_str, Domain, Level, ProfileScope};
use crate::pipeline::{self, DerivedViews, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    /// Parse an HTTP request line such as `GET /api/update?product=A HTTP/1.1`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or("empty request line")?;
        let target = parts.next().ok_or("missing request target")?;
        if !target.starts_with('/') {
            return Err(format!("bad request target: {}", target));
        }
        let (path, raw_query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        let query = url::form_urlencoded::parse(raw_query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
        })
    }

    /// Build the selection from repeated and/or comma-separated `product` and
    /// `region` parameters. A missing parameter means an empty set.
    pub fn selection(&self) -> Selection {
        let mut products = Vec::new();
        let mut regions = Vec::new();
        for (k, v) in &self.query {
            let target = match k.as_str() {
                "product" | "products" => &mut products,
                "region" | "regions" => &mut regions,
                _ => continue,
            };
            target.extend(
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }
        Selection::new(products, regions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn json(body: String) -> Self {
        Self { status: 200, content_type: "application/json", body }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self { status, content_type: "text/plain", body: body.to_string() }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "BAD REQUEST",
            404 => "NOT FOUND",
            405 => "METHOD NOT ALLOWED",
            431 => "REQUEST HEADER FIELDS TOO LARGE",
            _ => "INTERNAL SERVER ERROR",
        }
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

#[derive(Serialize)]
struct UpdateResponse<'a> {
    selection: &'a Selection,
    #[serde(flatten)]
    views: &'a DerivedViews,
}

/// Immutable dataset plus a counter numbering updates in the logs.
pub struct Dashboard {
    records: Vec<SalesRecord>,
    manifest: DatasetManifest,
    title: String,
    update_seq: AtomicU64,
}

impl Dashboard {
    pub fn new(records: Vec<SalesRecord>, title: &str) -> Self {
        let manifest = build_manifest(&records, logging::ts_epoch_secs());
        Self {
            records,
            manifest,
            title: title.to_string(),
            update_seq: AtomicU64::new(0),
        }
    }

    /// Dashboard over the generated series.
    pub fn generated(title: &str) -> Self {
        Self::new(data::generate(), title)
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn manifest(&self) -> &DatasetManifest {
        &self.manifest
    }

    pub fn handle(&self, req: &Request) -> Response {
        if req.method != "GET" {
            return Response::text(405, "Method Not Allowed");
        }
        match req.path.as_str() {
            "/" | "/index.html" => Response {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: page::render(&self.title),
            },
            "/api/health" => Response::json(json!({"status": "ok"}).to_string()),
            "/api/options" => {
                Response::json(json!({"products": PRODUCTS, "regions": REGIONS}).to_string())
            }
            "/api/records" => self.to_json_response(&self.records),
            "/api/records.csv" => Response {
                status: 200,
                content_type: "text/csv",
                body: data::to_csv(&self.records),
            },
            "/api/manifest" => self.to_json_response(&self.manifest),
            "/api/update" => self.update(&req.selection()),
            _ => Response::text(404, "Not Found"),
        }
    }

    fn update(&self, selection: &Selection) -> Response {
        let seq = self.update_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let unknown = selection.unknown_labels();
        if !unknown.is_empty() {
            log(
                Level::Warn,
                Domain::Pipeline,
                "unknown_labels",
                obj(&[("update_seq", json!(seq)), ("labels", json!(unknown))]),
            );
        }
        let views = {
            let _scope =
                ProfileScope::with_context("pipeline_update", &[("update_seq", json!(seq))]);
            pipeline::update(selection, &self.records)
        };
        logging::log_update(
            seq,
            selection.products.len(),
            selection.regions.len(),
            views.filtered.len(),
            views.total_sales(),
        );
        self.to_json_response(&UpdateResponse { selection, views: &views })
    }

    fn to_json_response<T: Serialize>(&self, value: &T) -> Response {
        match serde_json::to_string(value) {
            Ok(body) => Response::json(body),
            Err(err) => {
                log(
                    Level::Error,
                    Domain::Http,
                    "encode_failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                );
                Response::text(500, "Internal Server Error")
            }
        }
    }
}

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: u64 = 8 * 1024;

/// Read the request head from `stream`, dispatch it, write the response.
/// Returns the request line (if any) and the response that was sent.
///
/// A client that sends nothing within `read_timeout` makes this return an
/// error instead of holding up the accept loop.
pub fn handle_connection(
    dashboard: &Dashboard,
    stream: &mut TcpStream,
    read_timeout: Duration,
) -> Result<(Option<Request>, Response)> {
    stream
        .set_read_timeout(Some(read_timeout))
        .context("set read timeout")?;
    let limited = stream.try_clone().context("clone stream")?.take(MAX_HEAD_BYTES);
    let mut reader = BufReader::new(limited);
    let mut request_line = String::new();
    let mut head_len = reader.read_line(&mut request_line).context("read request line")?;
    // drain headers; bodies are not used by any route
    loop {
        let mut header = String::new();
        let n = reader.read_line(&mut header).context("read header")?;
        head_len += n;
        if n == 0 || header.trim().is_empty() {
            break;
        }
    }

    let (req, resp) = if head_len as u64 >= MAX_HEAD_BYTES {
        (None, Response::text(431, "Request Header Fields Too Large"))
    } else {
        match Request::parse(request_line.trim_end()) {
            Ok(req) => {
                let resp = dashboard.handle(&req);
                (Some(req), resp)
            }
            Err(err) => (None, Response::text(400, &err)),
        }
    };
    stream
        .write_all(resp.to_http().as_bytes())
        .context("write response")?;
    Ok((req, resp))
}

/// Bind and serve until the process is killed.
pub fn serve(cfg: &ServerConfig, dashboard: &Dashboard) -> Result<()> {
    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr).with_context(|| format!("bind {}", addr))?;
    log(
        Level::Info,
        Domain::System,
        "listening",
        obj(&[
            ("msg", v_str(&format!("dashboard at http://{}", addr))),
            ("addr", v_str(&addr)),
            ("title", v_str(&cfg.title)),
            ("read_timeout_ms", json!(cfg.read_timeout_ms)),
        ]),
    );

    let request_level = if cfg.debug { Level::Info } else { Level::Debug };
    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Http,
                    "accept_failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                );
                continue;
            }
        };
        match handle_connection(dashboard, &mut stream, cfg.read_timeout()) {
            Ok((req, resp)) => {
                let (method, path) = req
                    .as_ref()
                    .map(|r| (r.method.as_str(), r.path.as_str()))
                    .unwrap_or(("?", "?"));
                logging::log_request(request_level, method, path, resp.status, resp.body.len());
            }
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Http,
                    "connection_failed",
                    obj(&[("error", v_str(&format!("{:#}", err)))]),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line() {
        let req =
            Request::parse("GET /api/update?product=Product+A&region=North%2CEast HTTP/1.1")
                .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/api/update");
        assert_eq!(
            req.query,
            vec![
                ("product".to_string(), "Product A".to_string()),
                ("region".to_string(), "North,East".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Request::parse("").is_err());
        assert!(Request::parse("GET").is_err());
        assert!(Request::parse("GET api/health HTTP/1.1").is_err());
    }

    #[test]
    fn test_selection_merges_repeats_and_lists() {
        let req = Request::parse(
            "GET /api/update?product=Product%20A&product=Product%20B,Product%20A&region=North&x=1 HTTP/1.1",
        )
        .unwrap();
        let sel = req.selection();
        assert_eq!(sel, Selection::new(["Product A", "Product B"], ["North"]));
    }

    #[test]
    fn test_selection_missing_param_is_empty() {
        let req = Request::parse("GET /api/update?product=Product+C HTTP/1.1").unwrap();
        let sel = req.selection();
        assert_eq!(sel.products.len(), 1);
        assert!(sel.regions.is_empty());
    }

    #[test]
    fn test_http_framing() {
        let resp = Response::text(404, "Not Found");
        let raw = resp.to_http();
        assert!(raw.starts_with("HTTP/1.1 404 NOT FOUND\r\n"));
        assert!(raw.contains("Content-Length: 9\r\n"));
        assert!(raw.ends_with("\r\n\r\nNot Found"));
    }
}
