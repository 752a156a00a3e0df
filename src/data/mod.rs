//! Synthetic sales dataset.
//!
//! One record per day for a fixed window, with a drifting sales figure and
//! product/region labels assigned round-robin. The table is built once at
//! startup and only read afterwards.

pub mod manifest;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PRODUCTS: [&str; 3] = ["Product A", "Product B", "Product C"];
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
pub const CSV_COLUMNS: [&str; 4] = ["date", "sales", "product", "region"];

pub const DAYS: usize = 100;
pub const BASE_SALES: i64 = 3000;
pub const SALES_FLOOR: i64 = 500;

const ANCHOR: (i32, u32, u32) = (2023, 1, 1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub sales: i64,
    pub product: String,
    pub region: String,
}

/// First day of the series.
pub fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(ANCHOR.0, ANCHOR.1, ANCHOR.2).expect("valid anchor date")
}

/// Periodic adjustment applied to the running base on day `i`.
pub fn adjustment(i: usize) -> i64 {
    let week = (i % 7) as i64 - 3;
    let month = (i % 30) as i64 - 15;
    week * 50 + month * 20
}

/// Build the full series.
///
/// The accumulator carries over from day to day and is never clamped itself;
/// only the value recorded for each day is floored at [`SALES_FLOOR`].
pub fn generate() -> Vec<SalesRecord> {
    let start = anchor_date();
    let mut base = BASE_SALES;
    let mut out = Vec::with_capacity(DAYS);
    for i in 0..DAYS {
        base += adjustment(i);
        out.push(SalesRecord {
            date: start + Duration::days(i as i64),
            sales: base.max(SALES_FLOOR),
            product: PRODUCTS[i % PRODUCTS.len()].to_string(),
            region: REGIONS[i % REGIONS.len()].to_string(),
        });
    }
    out
}

pub fn is_known_product(label: &str) -> bool {
    PRODUCTS.contains(&label)
}

pub fn is_known_region(label: &str) -> bool {
    REGIONS.contains(&label)
}

// =============================================================================
// CSV
// =============================================================================

pub fn to_csv(records: &[SalesRecord]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');
    for r in records {
        out.push_str(&format!(
            "{},{},{},{}\n",
            r.date.format("%Y-%m-%d"),
            r.sales,
            r.product,
            r.region
        ));
    }
    out
}

pub fn write_csv(path: &Path, records: &[SalesRecord]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    fs::write(path, to_csv(records)).map_err(|e| e.to_string())
}

pub fn parse_csv(text: &str) -> Result<Vec<SalesRecord>, String> {
    let mut header_seen = false;
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !header_seen {
            let header: Vec<&str> = trimmed.split(',').map(|s| s.trim()).collect();
            if header != CSV_COLUMNS {
                return Err(format!(
                    "schema mismatch: got {:?} expected {:?}",
                    header, CSV_COLUMNS
                ));
            }
            header_seen = true;
            continue;
        }
        records.push(parse_row(trimmed).map_err(|e| format!("line {}: {}", idx + 1, e))?);
    }
    if !header_seen {
        return Err("missing_header".to_string());
    }
    Ok(records)
}

fn parse_row(line: &str) -> Result<SalesRecord, String> {
    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
    if parts.len() != CSV_COLUMNS.len() {
        return Err(format!("expected {} columns, got {}", CSV_COLUMNS.len(), parts.len()));
    }
    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
        .map_err(|e| format!("bad date: {}", e))?;
    let sales = parts[1]
        .parse::<i64>()
        .map_err(|e| format!("bad sales: {}", e))?;
    Ok(SalesRecord {
        date,
        sales,
        product: parts[2].to_string(),
        region: parts[3].to_string(),
    })
}
