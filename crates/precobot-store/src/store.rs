//! The catalog store: process-wide shared state behind one lock, with
//! whole-file JSON persistence.
//!
//! Lookups and stats take the read lock. Mutations take the write lock
//! for the whole read-modify-write-persist unit, which serializes
//! concurrent add/edit calls and keeps generated codes unique.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::debug;

use precobot_core::{
    model_label, parse_line, CatalogError, CatalogResult, CatalogStats, PriceIndex, ProductRecord,
};

use crate::load::load_dir;

/// Prefix of generated record codes, kept from the shop's existing files.
const CODE_PREFIX: &str = "new-";

pub struct CatalogStore {
    output: PathBuf,
    state: RwLock<CatalogState>,
}

struct CatalogState {
    records: Vec<ProductRecord>,
    index: PriceIndex,
    next_code: u64,
}

// ---------------------------------------------------------------------------
// Mutation reporting
// ---------------------------------------------------------------------------

/// What happened to each input line of an add/edit call.
#[derive(Debug, Clone, PartialEq)]
pub enum LineStatus {
    /// A new record was appended.
    Added { code: String, names: Vec<String> },
    /// An existing record's options were fully replaced.
    Replaced { code: String, names: Vec<String> },
    /// No record's model contained the derived label. The line was
    /// dropped, catalog unchanged.
    NoMatch { model: String },
    /// The line had no price token and was skipped.
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct MutationReport {
    pub lines: Vec<LineStatus>,
    /// Option names actually written to the catalog, across all lines.
    pub applied: Vec<String>,
}

impl MutationReport {
    /// Models from edit lines that matched no record.
    pub fn unmatched_models(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                LineStatus::NoMatch { model } => Some(model.as_str()),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

impl CatalogStore {
    /// Load all catalog files under `catalog_dir` and bind the canonical
    /// output file. The output usually lives inside the catalog directory,
    /// so persisted mutations are picked up by the next open.
    pub fn open(catalog_dir: &Path, output: &Path) -> CatalogResult<Self> {
        let loaded = load_dir(catalog_dir)?;
        let next_code = seed_next_code(&loaded.records);
        Ok(Self {
            output: output.to_path_buf(),
            state: RwLock::new(CatalogState {
                records: loaded.records,
                index: loaded.index,
                next_code,
            }),
        })
    }

    /// Case-insensitive substring lookup over the price index.
    pub fn lookup(&self, query: &str) -> Vec<(String, f64)> {
        self.read_state().index.search(query)
    }

    pub fn stats(&self) -> CatalogStats {
        let state = self.read_state();
        CatalogStats {
            total_records: state.records.len(),
            total_options: state.records.iter().map(|r| r.options.len()).sum(),
            total_prices: state.index.len(),
        }
    }

    /// Append one record per parseable line of `text`, then persist.
    pub fn add(&self, text: &str) -> CatalogResult<MutationReport> {
        let mut state = self.write_state();
        let mut report = MutationReport::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let options = parse_line(line);
            if options.is_empty() {
                report.lines.push(LineStatus::Skipped);
                continue;
            }

            let model = model_label(&options);
            let code = format!("{CODE_PREFIX}{}", state.next_code);
            state.next_code += 1;

            state.index.insert_options(&options);
            let names: Vec<String> = options.iter().map(|opt| opt.name.clone()).collect();
            state
                .records
                .push(ProductRecord::new(code.clone(), model, options));

            report.applied.extend(names.iter().cloned());
            report.lines.push(LineStatus::Added { code, names });
        }

        self.persist(&state.records)?;
        Ok(report)
    }

    /// Replace the options of the first record whose model contains each
    /// line's derived label (case-insensitive), then persist. Lines that
    /// match nothing are dropped, visible only in the report.
    pub fn edit(&self, text: &str) -> CatalogResult<MutationReport> {
        let mut state = self.write_state();
        let mut report = MutationReport::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let options = parse_line(line);
            if options.is_empty() {
                report.lines.push(LineStatus::Skipped);
                continue;
            }

            let model = model_label(&options);
            let needle = model.to_lowercase();
            let matched = state
                .records
                .iter()
                .position(|record| record.model.to_lowercase().contains(&needle));

            match matched {
                Some(pos) => {
                    let code = state.records[pos].code.clone();
                    state.records[pos].options = options.clone();
                    state.index.insert_options(&options);

                    let names: Vec<String> = options.iter().map(|opt| opt.name.clone()).collect();
                    report.applied.extend(names.iter().cloned());
                    report.lines.push(LineStatus::Replaced { code, names });
                }
                None => report.lines.push(LineStatus::NoMatch { model }),
            }
        }

        self.persist(&state.records)?;
        Ok(report)
    }

    /// Overwrite the canonical output file with the full catalog, pretty
    /// printed, non-ASCII text left unescaped.
    ///
    /// On failure the in-memory state already holds the attempted change;
    /// the file stays stale until the next successful write.
    fn persist(&self, records: &[ProductRecord]) -> CatalogResult<()> {
        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CatalogError::Persist(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser)?;
        buf.push(b'\n');

        std::fs::write(&self.output, &buf).map_err(|e| {
            CatalogError::Persist(format!("cannot write {}: {e}", self.output.display()))
        })?;

        debug!("persisted {} records to {}", records.len(), self.output.display());
        Ok(())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// First code number to hand out: one past the highest existing `new-N`
/// suffix, floored by the record count so pre-existing hand-written codes
/// never collide with the original length-based scheme.
fn seed_next_code(records: &[ProductRecord]) -> u64 {
    let highest = records
        .iter()
        .filter_map(|record| record.code.strip_prefix(CODE_PREFIX))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    highest.max(records.len() as u64) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use precobot_core::ServiceOption;

    fn write_file(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn test_store(dir: &Path) -> CatalogStore {
        CatalogStore::open(dir, &dir.join("precos.json")).unwrap()
    }

    fn seeded_store(dir: &Path) -> CatalogStore {
        write_file(
            dir,
            "catalog.json",
            r#"[
                {"code": "new-1", "model": "iPhone", "options": [
                    {"name": "Bateria iPhone 14", "valor": 150.0},
                    {"name": "Tela iPhone 14", "valor": 300.0}
                ]},
                {"code": "new-2", "model": "Galaxy", "options": [
                    {"name": "Bateria Galaxy S22", "valor": 180.0}
                ]}
            ]"#,
        );
        test_store(dir)
    }

    #[test]
    fn test_lookup_substring() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let results = store.lookup("iPhone 14");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("bateria iphone 14".into(), 150.0));

        assert!(store.lookup("motorola").is_empty());
    }

    #[test]
    fn test_add_appends_record_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let report = store.add("Vidro traseiro iPhone 14 250.00").unwrap();
        assert_eq!(report.applied, vec!["Vidro traseiro iPhone 14"]);
        assert!(matches!(&report.lines[0], LineStatus::Added { code, .. } if code == "new-3"));

        assert_eq!(store.stats().total_records, 3);
        assert_eq!(store.lookup("vidro traseiro").len(), 1);

        // The canonical file deserializes back to the in-memory catalog.
        let written = std::fs::read_to_string(dir.path().join("precos.json")).unwrap();
        let records: Vec<ProductRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].code, "new-3");
        assert_eq!(records[2].model, "traseiro");
        assert_eq!(
            records[2].options,
            vec![ServiceOption::new("Vidro traseiro iPhone 14", 250.0)]
        );
    }

    #[test]
    fn test_add_skips_unparseable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let report = store
            .add("just words no price\nBateria iPhone 15 170\n\n")
            .unwrap();
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0], LineStatus::Skipped);
        assert_eq!(report.applied, vec!["Bateria iPhone 15"]);
        assert_eq!(store.stats().total_records, 3);
    }

    #[test]
    fn test_add_codes_stay_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        store.add("Bateria iPhone 15 170").unwrap();
        let report = store.add("Tela iPhone 15 350").unwrap();
        assert!(matches!(&report.lines[0], LineStatus::Added { code, .. } if code == "new-4"));
    }

    #[test]
    fn test_edit_replaces_whole_options_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        // Label derives to "iPhone", matching the first record's model.
        let report = store.edit("Bateria iPhone 14 160.00").unwrap();
        assert_eq!(report.applied, vec!["Bateria iPhone 14"]);

        // Replacement, not merge: the old screen option is gone from the
        // record, and the new battery price is indexed.
        let written = std::fs::read_to_string(dir.path().join("precos.json")).unwrap();
        let records: Vec<ProductRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(records[0].options.len(), 1);
        assert_eq!(records[0].options[0].price, 160.0);
        assert_eq!(store.lookup("bateria iphone 14")[0].1, 160.0);
        assert_eq!(store.stats().total_records, 2);
    }

    #[test]
    fn test_edit_without_match_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let report = store.edit("Bateria Redmi 12 90").unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.unmatched_models(), vec!["Redmi"]);
        assert_eq!(store.stats().total_records, 2);
        assert!(store.lookup("redmi").is_empty());
    }

    #[test]
    fn test_persisted_file_loads_on_next_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = test_store(dir.path());
            store.add("Bateria iPhone 14 150").unwrap();
        }

        let reopened = test_store(dir.path());
        assert_eq!(reopened.stats().total_records, 1);
        assert_eq!(reopened.lookup("bateria iphone 14").len(), 1);
    }

    #[test]
    fn test_seed_next_code() {
        let records = vec![
            ProductRecord::new("new-7".into(), "iPhone".into(), vec![]),
            ProductRecord::new("legacy".into(), "Galaxy".into(), vec![]),
        ];
        assert_eq!(seed_next_code(&records), 8);

        let hand_written = vec![
            ProductRecord::new("a".into(), "x".into(), vec![]),
            ProductRecord::new("b".into(), "y".into(), vec![]),
        ];
        assert_eq!(seed_next_code(&hand_written), 3);

        assert_eq!(seed_next_code(&[]), 1);
    }
}
