use salesdash::data::manifest::{build_manifest, default_manifest_path, records_sha256};
use salesdash::data::{generate, parse_csv, write_csv};
use std::fs;
use tempfile::TempDir;

#[test]
fn csv_file_reads_back_identical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sales.csv");
    let records = generate();
    write_csv(&path, &records).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("date,sales,product,region\n2023-01-01,2550,Product A,North\n"));
    let back = parse_csv(&text).unwrap();
    assert_eq!(back, records);
    assert_eq!(records_sha256(&back), records_sha256(&records));
}

#[test]
fn manifest_written_next_to_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sales.csv");
    let records = generate();
    write_csv(&path, &records).unwrap();

    let manifest = build_manifest(&records, 1_700_000_000);
    let out = default_manifest_path(&path);
    fs::write(&out, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();

    assert_eq!(out, dir.path().join("sales.csv.manifest.json"));
    let loaded: salesdash::data::manifest::DatasetManifest =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.total_sales, 95_760);
}

#[test]
fn truncated_csv_is_rejected() {
    let err = parse_csv("").unwrap_err();
    assert_eq!(err, "missing_header");
}
