use salesdash::data::manifest::{build_manifest, default_manifest_path};
use salesdash::data::{generate, write_csv};
use salesdash::logging::{log_dataset_ready, ts_epoch_secs};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let path = PathBuf::from(
        env::args()
            .nth(1)
            .unwrap_or_else(|| "data/sales.csv".to_string()),
    );

    let records = generate();
    if let Err(err) = write_csv(&path, &records) {
        eprintln!("failed to write {}: {}", path.display(), err);
        std::process::exit(1);
    }

    let manifest = build_manifest(&records, ts_epoch_secs());
    let out_path = default_manifest_path(&path);
    let body = match serde_json::to_string_pretty(&manifest) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("failed to encode manifest: {}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(2);
    }
    log_dataset_ready(records.len(), manifest.total_sales, &manifest.hash_sha256);
    println!("wrote {} and {}", path.display(), out_path.display());
}
