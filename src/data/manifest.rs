use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::{to_csv, SalesRecord, CSV_COLUMNS, PRODUCTS, REGIONS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub row_count: u64,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub total_sales: i64,
    pub min_sales: Option<i64>,
    pub max_sales: Option<i64>,
    pub columns: Vec<String>,
    pub products: Vec<String>,
    pub regions: Vec<String>,
    /// SHA-256 of the CSV rendering of the records.
    pub hash_sha256: String,
    pub generated_at_epoch: u64,
}

pub fn build_manifest(records: &[SalesRecord], generated_at_epoch: u64) -> DatasetManifest {
    DatasetManifest {
        row_count: records.len() as u64,
        date_min: records.iter().map(|r| r.date).min(),
        date_max: records.iter().map(|r| r.date).max(),
        total_sales: records.iter().map(|r| r.sales).sum(),
        min_sales: records.iter().map(|r| r.sales).min(),
        max_sales: records.iter().map(|r| r.sales).max(),
        columns: CSV_COLUMNS.iter().map(|s| s.to_string()).collect(),
        products: PRODUCTS.iter().map(|s| s.to_string()).collect(),
        regions: REGIONS.iter().map(|s| s.to_string()).collect(),
        hash_sha256: records_sha256(records),
        generated_at_epoch,
    }
}

pub fn records_sha256(records: &[SalesRecord]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(to_csv(records).as_bytes());
    hex::encode(hasher.finalize())
}

pub fn default_manifest_path(csv_path: &Path) -> PathBuf {
    let mut p = csv_path.to_path_buf();
    let fname = csv_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("sales.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate;

    #[test]
    fn test_manifest_covers_full_series() {
        let records = generate();
        let m = build_manifest(&records, 0);
        assert_eq!(m.row_count, 100);
        assert_eq!(m.date_min, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(m.date_max, NaiveDate::from_ymd_opt(2023, 4, 10));
        assert_eq!(m.min_sales, Some(500));
        assert_eq!(m.hash_sha256.len(), 64);
    }

    #[test]
    fn test_manifest_empty() {
        let m = build_manifest(&[], 0);
        assert_eq!(m.row_count, 0);
        assert_eq!(m.date_min, None);
        assert_eq!(m.total_sales, 0);
    }

    #[test]
    fn test_hash_tracks_content() {
        let mut records = generate();
        let before = records_sha256(&records);
        assert_eq!(before, records_sha256(&generate()));
        records[3].sales += 1;
        assert_ne!(before, records_sha256(&records));
    }

    #[test]
    fn test_default_manifest_path() {
        let p = default_manifest_path(Path::new("data/sales.csv"));
        assert_eq!(p, PathBuf::from("data/sales.csv.manifest.json"));
    }
}
