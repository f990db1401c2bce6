//! Seed boundary: loosely-typed table rows are coerced into records here, once.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use labstock_core::{LedgerId, RecordId};

use crate::ledger::InventoryLedger;
use crate::record::InventoryRecord;

/// One row of the seed table, as read.
///
/// Missing columns default to empty. Both the descriptive column names and
/// the lab spreadsheet's short headers (`cat_no.`, `lot #`) are accepted.
/// `record_id` is present in exported tables so ids survive a re-seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedRow {
    #[serde(alias = "id")]
    pub record_id: String,
    #[serde(alias = "item_name")]
    pub item: String,
    #[serde(alias = "cat_no.", alias = "cat_no")]
    pub catalog_number: String,
    #[serde(deserialize_with = "lenient_cell")]
    pub quantity: String,
    pub location: String,
    pub shelf: String,
    #[serde(deserialize_with = "lenient_cell")]
    pub expiration: String,
    #[serde(alias = "lot #", alias = "lot")]
    pub lot_id: String,
    pub order_unit: String,
    #[serde(alias = "min_stock", deserialize_with = "lenient_cell")]
    pub minimum_stock_level: String,
}

impl SeedRow {
    /// The row's stored record id, if it carries a valid one.
    pub fn stored_id(&self) -> Option<RecordId> {
        self.record_id.trim().parse().ok()
    }

    fn position_key(&self, position: usize) -> String {
        format!(
            "{position}|{}|{}|{}",
            self.catalog_number.trim(),
            self.lot_id.trim(),
            self.expiration.trim()
        )
    }

    /// Coerce into a typed record; `None` for a fully blank row (no item and
    /// no catalog number).
    pub fn into_record(self, id: RecordId) -> Option<InventoryRecord> {
        let item_name = self.item.trim().to_string();
        let catalog_number = self.catalog_number.trim().to_string();
        if item_name.is_empty() && catalog_number.is_empty() {
            return None;
        }
        Some(InventoryRecord {
            id,
            catalog_number,
            item_name,
            quantity: coerce_count(&self.quantity),
            lot_id: self.lot_id.trim().to_string(),
            expiration: parse_expiration(&self.expiration),
            location: self.location.trim().to_string(),
            shelf: self.shelf.trim().to_string(),
            order_unit: self.order_unit.trim().to_string(),
            minimum_stock_level: coerce_count(&self.minimum_stock_level),
        })
    }
}

impl InventoryLedger {
    /// Build a ledger from seed rows, skipping blank rows.
    ///
    /// Stored record ids are kept. Rows without one (or repeating one already
    /// seen) get an id derived from their position and batch key, so the same
    /// seed yields the same ids on every load. Zero-quantity rows are kept
    /// until the next [`InventoryLedger::normalize`].
    pub fn from_seed(id: LedgerId, rows: impl IntoIterator<Item = SeedRow>) -> Self {
        let mut seen = HashSet::new();
        let records: Vec<_> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(position, row)| {
                let record_id = row
                    .stored_id()
                    .filter(|stored| seen.insert(*stored))
                    .unwrap_or_else(|| RecordId::derived(&row.position_key(position)));
                row.into_record(record_id)
            })
            .collect();
        tracing::debug!(records = records.len(), "seeded inventory ledger");
        Self::with_records(id, records)
    }
}

/// Coerce a cell into a non-negative count.
///
/// Integers parse as-is, decimals truncate toward zero, negatives clamp to
/// zero and anything else (blank, text, NaN) becomes zero.
pub fn coerce_count(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return n.max(0) as u64;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an expiration cell; date-only values normalize to midnight.
/// Unparseable or blank cells are unknown (`None`).
pub fn parse_expiration(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Accept strings, numbers, booleans and nulls for a cell, keeping its text.
fn lenient_cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct CellVisitor;

    impl<'de> Visitor<'de> for CellVisitor {
        type Value = String;

        fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("a string, number or empty cell")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<String, D2::Error> {
            d.deserialize_any(CellVisitor)
        }
    }

    deserializer.deserialize_any(CellVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_coerce_like_a_spreadsheet() {
        assert_eq!(coerce_count("12"), 12);
        assert_eq!(coerce_count(" 7 "), 7);
        assert_eq!(coerce_count("3.9"), 3);
        assert_eq!(coerce_count("-4"), 0);
        assert_eq!(coerce_count("a few"), 0);
        assert_eq!(coerce_count(""), 0);
        assert_eq!(coerce_count("NaN"), 0);
    }

    #[test]
    fn expirations_parse_common_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_expiration("2025-06-01"), Some(midnight));
        assert_eq!(parse_expiration("06/01/2025"), Some(midnight));
        assert_eq!(parse_expiration("2025-06-01 00:00:00"), Some(midnight));
        assert_eq!(
            parse_expiration("2025-06-01T08:15:00"),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 15, 0)
        );
        assert_eq!(parse_expiration("soon"), None);
        assert_eq!(parse_expiration(" "), None);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let row = SeedRow {
            quantity: "5".to_string(),
            ..SeedRow::default()
        };
        assert!(row.into_record(RecordId::new()).is_none());
    }

    #[test]
    fn rows_coerce_once_at_the_boundary() {
        let row = SeedRow {
            item: " Nitrile gloves M ".to_string(),
            catalog_number: "GL-M".to_string(),
            quantity: "ten".to_string(),
            minimum_stock_level: "2.0".to_string(),
            lot_id: "L9".to_string(),
            expiration: "not a date".to_string(),
            ..SeedRow::default()
        };
        let record = row.into_record(RecordId::new()).unwrap();
        assert_eq!(record.item_name, "Nitrile gloves M");
        assert_eq!(record.quantity, 0);
        assert_eq!(record.minimum_stock_level, 2);
        assert_eq!(record.expiration, None);
    }

    #[test]
    fn json_rows_accept_numbers_and_short_headers() {
        let row: SeedRow = serde_json::from_value(serde_json::json!({
            "item": "Trypsin",
            "cat_no.": "T-01",
            "quantity": 4,
            "lot #": "A7",
            "expiration": null,
            "minimum_stock_level": 1.0,
        }))
        .unwrap();
        assert_eq!(row.catalog_number, "T-01");
        assert_eq!(row.lot_id, "A7");
        let record = row.into_record(RecordId::new()).unwrap();
        assert_eq!(record.quantity, 4);
        assert_eq!(record.minimum_stock_level, 1);
    }

    #[test]
    fn from_seed_keeps_zero_rows_until_normalize() {
        let rows = vec![
            SeedRow {
                item: "A".to_string(),
                catalog_number: "A1".to_string(),
                quantity: "0".to_string(),
                ..SeedRow::default()
            },
            SeedRow::default(),
        ];
        let mut ledger = InventoryLedger::from_seed(LedgerId::new(), rows);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(ledger.normalize(), 1);
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn stored_ids_survive_and_duplicates_are_replaced() {
        let id = RecordId::new();
        let row = |record_id: String, lot: &str| SeedRow {
            record_id,
            item: "Agarose".to_string(),
            catalog_number: "ABC100".to_string(),
            quantity: "1".to_string(),
            lot_id: lot.to_string(),
            ..SeedRow::default()
        };
        let ledger = InventoryLedger::from_seed(
            LedgerId::new(),
            vec![
                row(id.to_string(), "L1"),
                row(id.to_string(), "L2"),
                row("not-an-id".to_string(), "L3"),
            ],
        );

        let records = ledger.records();
        assert_eq!(records[0].id, id);
        assert_ne!(records[1].id, id);
        assert_ne!(records[2].id, id);
        assert_eq!(ledger.record(id).unwrap().lot_id, "L1");
    }

    #[test]
    fn rows_without_ids_reload_with_the_same_ids() {
        let rows = || {
            vec![
                SeedRow {
                    item: "Agarose".to_string(),
                    catalog_number: "ABC100".to_string(),
                    quantity: "5".to_string(),
                    lot_id: "L1".to_string(),
                    ..SeedRow::default()
                },
                SeedRow {
                    item: "Agarose".to_string(),
                    catalog_number: "ABC100".to_string(),
                    quantity: "5".to_string(),
                    lot_id: "L1".to_string(),
                    ..SeedRow::default()
                },
            ]
        };
        let first = InventoryLedger::from_seed(LedgerId::new(), rows());
        let second = InventoryLedger::from_seed(LedgerId::new(), rows());

        assert_eq!(first.records(), second.records());
        assert_ne!(first.records()[0].id, first.records()[1].id);
    }
}
