//! # Stock Model
//!
//! Polymorphic per-product inventory representation and aggregation.
//!
//! ## The Stock Shape Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   One field, three shapes                               │
//! │                                                                         │
//! │  Fragrances (flat, keyed by volume variant):                            │
//! │    { "50ml": 10, "100ml": 5 }                                           │
//! │                                                                         │
//! │  Apparel (nested, color → size → count):                                │
//! │    { "Noir": { "S": 5, "M": 10 }, "Blanc": { "S": 3 } }                 │
//! │                                                                         │
//! │  Accessories (nested, color → total):                                   │
//! │    { "Noir": { "total": 25 }, "Argent": { "total": 18 } }               │
//! │                                                                         │
//! │  All three aggregate the same way: walk exactly two levels and sum      │
//! │  every integer leaf. Anything else (strings, deeper nesting) is         │
//! │  ignored; the walk must never fail for an unrelated category.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The canonical in-memory representation is a tagged entry per top-level
//! key: `Count` for flat integer entries, `Variants` for one nested level.
//! Raw JSON documents are translated into this shape at the storage
//! boundary via [`Stock::from_value`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Stock Representation
// =============================================================================

/// One top-level entry of a product's stock document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StockEntry {
    /// Flat variant count, e.g. `"50ml": 10`.
    Count(i64),
    /// One nested level of counts, e.g. `"Noir": {"S": 5, "M": 10}`.
    Variants(BTreeMap<String, i64>),
}

/// A product's full stock structure.
///
/// ## Invariants
/// - Every leaf is a non-negative integer (enforced at write time;
///   [`Stock::from_value`] drops anything else when reading)
/// - Aggregation walks exactly two levels, never deeper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stock {
    entries: BTreeMap<String, StockEntry>,
}

/// Derived availability figures for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Sum of all integer leaves in the stock structure.
    pub total_units: i64,
    /// `total_units > 0`.
    pub in_stock: bool,
}

impl Stock {
    /// Builds a stock from a raw JSON document.
    ///
    /// ## Tolerance Policy
    /// This function is pure and total: it never fails, whatever the
    /// document looks like. The stock shape varies by product category and
    /// reading it must not become a point of failure for unrelated
    /// categories. Concretely:
    /// - `null` / missing / non-object input → empty stock
    /// - non-integer leaves (strings, floats, booleans) are ignored
    /// - negative integer leaves are ignored
    /// - nesting deeper than two levels is ignored
    pub fn from_value(value: &Value) -> Self {
        let mut entries = BTreeMap::new();

        let Value::Object(map) = value else {
            return Stock { entries };
        };

        for (key, entry) in map {
            match entry {
                Value::Number(n) => {
                    if let Some(count) = n.as_i64().filter(|c| *c >= 0) {
                        entries.insert(key.clone(), StockEntry::Count(count));
                    }
                }
                Value::Object(inner) => {
                    let variants: BTreeMap<String, i64> = inner
                        .iter()
                        .filter_map(|(variant, leaf)| {
                            leaf.as_i64()
                                .filter(|c| *c >= 0)
                                .map(|c| (variant.clone(), c))
                        })
                        .collect();
                    entries.insert(key.clone(), StockEntry::Variants(variants));
                }
                _ => {}
            }
        }

        Stock { entries }
    }

    /// Builds a stock from a JSON string, treating unparsable input as an
    /// empty document. Used at the storage boundary.
    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Stock::from_value(&value),
            Err(_) => Stock::default(),
        }
    }

    /// Scaffolds the default stock structure for a newly created product:
    /// `{color: {size: 0, ...}}` when sizes exist (apparel), otherwise
    /// `{color: {"total": 0}}` (accessories, fragrances).
    pub fn scaffold(colors: &[String], sizes: &[String]) -> Self {
        let entries = colors
            .iter()
            .map(|color| {
                let variants: BTreeMap<String, i64> = if sizes.is_empty() {
                    [("total".to_string(), 0)].into_iter().collect()
                } else {
                    sizes.iter().map(|size| (size.clone(), 0)).collect()
                };
                (color.clone(), StockEntry::Variants(variants))
            })
            .collect();

        Stock { entries }
    }

    /// Total available units: the sum of every integer leaf.
    pub fn total_units(&self) -> i64 {
        self.entries
            .values()
            .map(|entry| match entry {
                StockEntry::Count(count) => *count,
                StockEntry::Variants(variants) => variants.values().sum(),
            })
            .sum()
    }

    /// Computes the derived availability figures.
    pub fn availability(&self) -> Availability {
        let total_units = self.total_units();
        Availability {
            total_units,
            in_stock: total_units > 0,
        }
    }

    /// Resolves the available units for a requested (color, size) variant.
    ///
    /// ## Resolution Policy
    /// Most specific tracked figure first:
    /// 1. The color matches a top-level key → that entry (narrowed by size
    ///    for nested entries; unknown size within a tracked color is 0).
    /// 2. A color was requested but the stock is color-keyed (has nested
    ///    entries) and the color is untracked → 0.
    /// 3. The size matches a top-level key (flat stocks keyed by variant
    ///    label like "50ml") → that entry.
    /// 4. Otherwise the request doesn't name a tracked dimension → total.
    pub fn units_for_variant(&self, color: Option<&str>, size: Option<&str>) -> i64 {
        if let Some(color) = color {
            match self.entries.get(color) {
                Some(StockEntry::Count(count)) => return *count,
                Some(StockEntry::Variants(variants)) => {
                    return match size {
                        Some(size) => variants.get(size).copied().unwrap_or(0),
                        None => variants.values().sum(),
                    };
                }
                None if self.has_nested_entries() => return 0,
                None => {}
            }
        }

        if let Some(size) = size {
            if let Some(entry) = self.entries.get(size) {
                return match entry {
                    StockEntry::Count(count) => *count,
                    StockEntry::Variants(variants) => variants.values().sum(),
                };
            }
        }

        self.total_units()
    }

    /// True when the stock has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn has_nested_entries(&self) -> bool {
        self.entries
            .values()
            .any(|entry| matches!(entry, StockEntry::Variants(_)))
    }
}

/// Checks a raw stock document for negative integer leaves.
///
/// Write-time guard: [`Stock::from_value`] silently drops negative leaves
/// when reading, but an admin replacing a stock structure with negative
/// counts should get an error, not silent data loss.
pub fn has_negative_leaf(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };

    map.values().any(|entry| match entry {
        Value::Number(n) => n.as_i64().is_some_and(|c| c < 0),
        Value::Object(inner) => inner
            .values()
            .any(|leaf| leaf.as_i64().is_some_and(|c| c < 0)),
        _ => false,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_stock_total() {
        let stock = Stock::from_value(&json!({"50ml": 10}));
        let availability = stock.availability();
        assert_eq!(availability.total_units, 10);
        assert!(availability.in_stock);
    }

    #[test]
    fn test_nested_stock_total() {
        let stock = Stock::from_value(&json!({
            "Noir": {"S": 5, "M": 10},
            "Blanc": {"S": 3}
        }));
        assert_eq!(stock.total_units(), 18);
    }

    #[test]
    fn test_mixed_stock_total() {
        let stock = Stock::from_value(&json!({
            "50ml": 7,
            "Noir": {"total": 3}
        }));
        assert_eq!(stock.total_units(), 10);
    }

    #[test]
    fn test_empty_and_null_stock() {
        let empty = Stock::from_value(&json!({}));
        assert_eq!(empty.total_units(), 0);
        assert!(!empty.availability().in_stock);

        let null = Stock::from_value(&Value::Null);
        assert_eq!(null.total_units(), 0);
        assert!(!null.availability().in_stock);
    }

    #[test]
    fn test_malformed_leaves_are_ignored() {
        let stock = Stock::from_value(&json!({
            "Noir": {"S": 5, "M": "many"},
            "Blanc": "out of stock",
            "Rouge": {"S": {"deep": 99}},
            "half": 2.5
        }));
        // Only the one well-formed leaf counts.
        assert_eq!(stock.total_units(), 5);
    }

    #[test]
    fn test_negative_leaves_are_ignored_on_read() {
        let stock = Stock::from_value(&json!({"50ml": -3, "100ml": 4}));
        assert_eq!(stock.total_units(), 4);
        assert!(stock.total_units() >= 0);
    }

    #[test]
    fn test_has_negative_leaf() {
        assert!(has_negative_leaf(&json!({"50ml": -1})));
        assert!(has_negative_leaf(&json!({"Noir": {"S": -2}})));
        assert!(!has_negative_leaf(&json!({"Noir": {"S": 2}})));
        assert!(!has_negative_leaf(&json!({})));
    }

    #[test]
    fn test_scaffold_apparel() {
        let colors = vec!["Noir".to_string(), "Blanc".to_string()];
        let sizes = vec!["S".to_string(), "M".to_string()];
        let stock = Stock::scaffold(&colors, &sizes);

        assert_eq!(stock.total_units(), 0);
        assert_eq!(stock.units_for_variant(Some("Noir"), Some("S")), 0);
        // Unknown size on a tracked color is zero, not a fallback.
        assert_eq!(stock.units_for_variant(Some("Noir"), Some("XL")), 0);
    }

    #[test]
    fn test_scaffold_accessory_uses_total_key() {
        let colors = vec!["Argent".to_string()];
        let stock = Stock::scaffold(&colors, &[]);
        let value = serde_json::to_value(&stock).unwrap();
        assert_eq!(value, json!({"Argent": {"total": 0}}));
    }

    #[test]
    fn test_variant_resolution_nested() {
        let stock = Stock::from_value(&json!({
            "Noir": {"S": 5, "M": 10},
            "Blanc": {"S": 3}
        }));

        assert_eq!(stock.units_for_variant(Some("Noir"), Some("S")), 5);
        assert_eq!(stock.units_for_variant(Some("Noir"), None), 15);
        // Untracked color against a color-keyed stock: nothing available.
        assert_eq!(stock.units_for_variant(Some("Rouge"), Some("S")), 0);
    }

    #[test]
    fn test_variant_resolution_flat() {
        let stock = Stock::from_value(&json!({"50ml": 10, "100ml": 5}));

        // Flat stocks are keyed by variant label, reachable via size.
        assert_eq!(stock.units_for_variant(None, Some("50ml")), 10);
        // No tracked dimension named: fall back to the total.
        assert_eq!(stock.units_for_variant(None, None), 15);
        assert_eq!(stock.units_for_variant(Some("Noir"), None), 15);
    }

    #[test]
    fn test_serialization_round_trip() {
        let stock = Stock::from_value(&json!({
            "50ml": 10,
            "Noir": {"S": 5}
        }));
        let raw = serde_json::to_string(&stock).unwrap();
        let back = Stock::from_json_str(&raw);
        assert_eq!(back, stock);
    }

    #[test]
    fn test_unparsable_json_is_empty() {
        let stock = Stock::from_json_str("not json at all");
        assert!(stock.is_empty());
        assert_eq!(stock.total_units(), 0);
    }
}
