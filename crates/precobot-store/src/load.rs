//! Catalog directory loading.
//!
//! Two file shapes coexist in one directory and are merged: a list of
//! [`ProductRecord`] objects, and a flat `{name: price}` mapping. A file
//! that fails to read or parse is logged and skipped, never fatal.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{error, warn};

use precobot_core::{CatalogResult, PriceIndex, ProductRecord};

const CATALOG_EXTENSION: &str = "json";

/// The two accepted file shapes, decided once at parse time.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Records(Vec<ProductRecord>),
    Prices(IndexMap<String, f64>),
}

#[derive(Debug, Default)]
pub struct LoadedCatalog {
    pub records: Vec<ProductRecord>,
    pub index: PriceIndex,
}

/// Load every `.json` file in `dir`, merging all of them into one catalog.
///
/// Files are processed in lexicographic filename order, so price
/// collisions resolve the same way on every run (last writer wins).
/// Failure to read the directory itself is returned to the caller;
/// per-file failures are logged and skipped.
pub fn load_dir(dir: &Path) -> CatalogResult<LoadedCatalog> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == CATALOG_EXTENSION)
        })
        .collect();
    paths.sort();

    let mut loaded = LoadedCatalog::default();

    for path in &paths {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                error!("cannot read {}: {e}", path.display());
                continue;
            }
        };

        match serde_json::from_str::<CatalogFile>(&content) {
            Ok(CatalogFile::Records(records)) => {
                for record in records {
                    loaded.index.insert_options(&record.options);
                    loaded.records.push(record);
                }
            }
            Ok(CatalogFile::Prices(prices)) => {
                for (name, price) in &prices {
                    loaded.index.insert(name, *price);
                }
            }
            Err(e) => {
                error!("malformed catalog file {}: {e}", path.display());
            }
        }
    }

    if loaded.records.is_empty() && loaded.index.is_empty() {
        warn!("no catalog data found in {}", dir.display());
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_merges_list_and_flat_shapes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "catalog.json",
            r#"[{"code": "c1", "model": "iPhone", "options": [{"name": "Bateria iPhone 14", "valor": 150.0}]}]"#,
        );
        write_file(
            dir.path(),
            "extras.json",
            r#"{"Pelicula iPhone 14": 40.0}"#,
        );

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.index.get("bateria iphone 14"), Some(150.0));
        assert_eq!(loaded.index.get("pelicula iphone 14"), Some(40.0));
    }

    #[test]
    fn test_invalid_file_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "broken.json", "{not valid json");
        write_file(dir.path(), "prices.json", r#"{"tela iphone 14": 300.0}"#);

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.index.len(), 1);
        assert_eq!(loaded.index.get("tela iphone 14"), Some(300.0));
    }

    #[test]
    fn test_non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.txt", "not a catalog");

        let loaded = load_dir(dir.path()).unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.index.is_empty());
    }

    #[test]
    fn test_lexicographic_order_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.json", r#"{"bateria iphone 14": 100.0}"#);
        write_file(dir.path(), "b.json", r#"{"bateria iphone 14": 120.0}"#);

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.index.get("bateria iphone 14"), Some(120.0));
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(load_dir(&missing).is_err());
    }
}
