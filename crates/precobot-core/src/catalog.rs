use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProductRecord
// ---------------------------------------------------------------------------

/// One catalog entry: a product (or repair family) with its priced options.
///
/// Field names on the wire match the shop's existing data files, which is
/// why an option's price serializes as `valor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub options: Vec<ServiceOption>,
}

impl ProductRecord {
    pub fn new(code: String, model: String, options: Vec<ServiceOption>) -> Self {
        Self {
            code,
            model,
            options,
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceOption
// ---------------------------------------------------------------------------

/// A single named, priced line item: a part or a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOption {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "valor", default)]
    pub price: f64,
}

impl ServiceOption {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

// ---------------------------------------------------------------------------
// PriceIndex
// ---------------------------------------------------------------------------

/// Case-folded option name → price, in insertion order.
///
/// Last writer wins: a later-loaded file or a later edit overwrites the
/// price stored under the same name.
#[derive(Debug, Clone, Default)]
pub struct PriceIndex {
    entries: IndexMap<String, f64>,
}

impl PriceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a price under the case-folded name. Empty names are ignored.
    pub fn insert(&mut self, name: &str, price: f64) {
        let key = name.trim().to_lowercase();
        if !key.is_empty() {
            self.entries.insert(key, price);
        }
    }

    /// Register every option of a record.
    pub fn insert_options(&mut self, options: &[ServiceOption]) {
        for opt in options {
            self.insert(&opt.name, opt.price);
        }
    }

    /// Unanchored, case-insensitive substring search over the keys.
    pub fn search(&self, query: &str) -> Vec<(String, f64)> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|(name, _)| name.contains(&needle))
            .map(|(name, price)| (name.clone(), *price))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(&name.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, price)| (name.as_str(), *price))
    }
}

// ---------------------------------------------------------------------------
// CatalogStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub total_records: usize,
    pub total_options: usize,
    pub total_prices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_case_folds() {
        let mut index = PriceIndex::new();
        index.insert("Bateria iPhone 14", 150.0);
        assert_eq!(index.get("bateria iphone 14"), Some(150.0));
        assert_eq!(index.get("BATERIA IPHONE 14"), Some(150.0));
    }

    #[test]
    fn test_last_writer_wins() {
        let mut index = PriceIndex::new();
        index.insert("tela iphone 14", 300.0);
        index.insert("Tela iPhone 14", 320.0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("tela iphone 14"), Some(320.0));
    }

    #[test]
    fn test_search_substring() {
        let mut index = PriceIndex::new();
        index.insert("Bateria iPhone 14", 150.0);
        index.insert("Tela iPhone 14", 300.0);
        index.insert("Bateria iPhone 13", 130.0);

        let results = index.search("iphone 14");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "bateria iphone 14");
        assert_eq!(results[1].0, "tela iphone 14");

        assert!(index.search("galaxy s22").is_empty());
    }

    #[test]
    fn test_search_preserves_insertion_order() {
        let mut index = PriceIndex::new();
        index.insert("c part", 3.0);
        index.insert("a part", 1.0);
        index.insert("b part", 2.0);

        let names: Vec<String> = index.search("part").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["c part", "a part", "b part"]);
    }

    #[test]
    fn test_empty_name_ignored() {
        let mut index = PriceIndex::new();
        index.insert("   ", 10.0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_option_serializes_price_as_valor() {
        let opt = ServiceOption::new("Bateria iPhone 14", 150.0);
        let json = serde_json::to_string(&opt).unwrap();
        assert!(json.contains("\"valor\":150.0"));

        let back: ServiceOption = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opt);
    }
}
