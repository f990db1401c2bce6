//! Read-only "needs attention" classification: low stock, expired, expiring soon.

use chrono::{Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ledger::InventoryLedger;
use crate::record::InventoryRecord;

/// Why a record needs attention.
///
/// Variants are declared in display priority order, so the derived `Ord`
/// sorts the most urgent category first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttentionCategory {
    LowStock,
    Expired,
    ExpiringSoon,
}

impl AttentionCategory {
    pub fn label(self) -> &'static str {
        match self {
            AttentionCategory::LowStock => "low stock",
            AttentionCategory::Expired => "expired",
            AttentionCategory::ExpiringSoon => "expiring soon",
        }
    }
}

impl core::fmt::Display for AttentionCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for the expiry predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    /// Calendar months ahead of `now` that count as "expiring soon".
    pub expiring_window_months: u32,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            expiring_window_months: 2,
        }
    }
}

impl ClassificationPolicy {
    pub fn with_expiring_window_months(mut self, months: u32) -> Self {
        self.expiring_window_months = months;
        self
    }

    /// Expiration strictly before `now`.
    pub fn is_expired(&self, record: &InventoryRecord, now: NaiveDateTime) -> bool {
        record.expiration.is_some_and(|exp| exp < now)
    }

    /// Expiration within `[now, now + window]`, both ends inclusive.
    pub fn is_expiring_soon(&self, record: &InventoryRecord, now: NaiveDateTime) -> bool {
        let window_end = now
            .checked_add_months(Months::new(self.expiring_window_months))
            .unwrap_or(NaiveDateTime::MAX);
        record
            .expiration
            .is_some_and(|exp| exp >= now && exp <= window_end)
    }
}

/// One record of the "needs attention" set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionItem {
    pub record: InventoryRecord,
    /// Total quantity of the record's catalog number.
    pub total_quantity: u64,
    /// Sorted most urgent first; non-empty for items built by
    /// [`InventoryLedger::attention_report`].
    pub categories: Vec<AttentionCategory>,
}

impl AttentionItem {
    /// Category used for display (highlight colour, sort order).
    pub fn primary(&self) -> Option<AttentionCategory> {
        self.categories.iter().min().copied()
    }

    /// Display label of the primary category; `-` when there is none.
    pub fn status(&self) -> &'static str {
        self.primary().map_or("-", AttentionCategory::label)
    }

    pub fn has(&self, category: AttentionCategory) -> bool {
        self.categories.contains(&category)
    }
}

/// Deduplicated union of low-stock, expired and expiring-soon records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionReport {
    pub items: Vec<AttentionItem>,
    pub low_stock_count: usize,
    pub expired_count: usize,
    pub expiring_soon_count: usize,
}

impl AttentionReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, category: AttentionCategory) -> usize {
        match category {
            AttentionCategory::LowStock => self.low_stock_count,
            AttentionCategory::Expired => self.expired_count,
            AttentionCategory::ExpiringSoon => self.expiring_soon_count,
        }
    }
}

impl InventoryLedger {
    /// Every category `record` falls into, most urgent first.
    pub fn classify(
        &self,
        record: &InventoryRecord,
        policy: &ClassificationPolicy,
        now: NaiveDateTime,
    ) -> Vec<AttentionCategory> {
        let mut categories = Vec::new();
        if self.total_quantity(&record.catalog_number) <= record.minimum_stock_level {
            categories.push(AttentionCategory::LowStock);
        }
        if policy.is_expired(record, now) {
            categories.push(AttentionCategory::Expired);
        }
        if policy.is_expiring_soon(record, now) {
            categories.push(AttentionCategory::ExpiringSoon);
        }
        categories
    }

    /// Build the "needs attention" report as of `now`.
    ///
    /// Items are ordered by primary category, then catalog number, then
    /// expiration (unknown last).
    pub fn attention_report(&self, policy: &ClassificationPolicy, now: NaiveDateTime) -> AttentionReport {
        let mut report = AttentionReport::default();

        for record in self.records() {
            let categories = self.classify(record, policy, now);
            if categories.is_empty() {
                continue;
            }
            for category in &categories {
                match category {
                    AttentionCategory::LowStock => report.low_stock_count += 1,
                    AttentionCategory::Expired => report.expired_count += 1,
                    AttentionCategory::ExpiringSoon => report.expiring_soon_count += 1,
                }
            }
            report.items.push(AttentionItem {
                record: record.clone(),
                total_quantity: self.total_quantity(&record.catalog_number),
                categories,
            });
        }

        report.items.sort_by(|a, b| {
            a.primary()
                .cmp(&b.primary())
                .then_with(|| a.record.catalog_number.cmp(&b.record.catalog_number))
                .then_with(|| match (a.record.expiration, b.record.expiration) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => core::cmp::Ordering::Less,
                    (None, Some(_)) => core::cmp::Ordering::Greater,
                    (None, None) => core::cmp::Ordering::Equal,
                })
        });

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use labstock_core::{LedgerId, RecordId};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn record(catalog: &str, quantity: u64, min: u64, expiration: Option<NaiveDateTime>) -> InventoryRecord {
        InventoryRecord {
            id: RecordId::new(),
            catalog_number: catalog.to_string(),
            item_name: format!("item {catalog}"),
            quantity,
            lot_id: "L1".to_string(),
            expiration,
            location: String::new(),
            shelf: String::new(),
            order_unit: String::new(),
            minimum_stock_level: min,
        }
    }

    #[test]
    fn low_stock_boundary_is_inclusive() {
        let ledger = InventoryLedger::with_records(
            LedgerId::new(),
            vec![record("A", 2, 5, None), record("A", 3, 5, None), record("B", 6, 5, None)],
        );
        let policy = ClassificationPolicy::default();
        let now = at(2024, 1, 1);

        assert_eq!(
            ledger.classify(&ledger.records()[0], &policy, now),
            vec![AttentionCategory::LowStock]
        );
        assert!(ledger.classify(&ledger.records()[2], &policy, now).is_empty());
    }

    #[test]
    fn expiring_window_is_two_calendar_months_inclusive() {
        let policy = ClassificationPolicy::default();
        let now = at(2024, 1, 31);

        // Jan 31 + 2 months clamps to Mar 31.
        assert!(policy.is_expiring_soon(&record("A", 1, 0, Some(at(2024, 3, 31))), now));
        assert!(!policy.is_expiring_soon(&record("A", 1, 0, Some(at(2024, 4, 1))), now));
        assert!(policy.is_expiring_soon(&record("A", 1, 0, Some(now)), now));
        assert!(!policy.is_expired(&record("A", 1, 0, Some(now)), now));
        assert!(policy.is_expired(&record("A", 1, 0, Some(at(2024, 1, 30))), now));
        assert!(!policy.is_expired(&record("A", 1, 0, None), now));
    }

    #[test]
    fn report_deduplicates_and_orders_by_priority() {
        let ledger = InventoryLedger::with_records(
            LedgerId::new(),
            vec![
                record("Z", 10, 0, Some(at(2024, 2, 1))),
                record("Y", 10, 0, Some(at(2023, 6, 1))),
                record("X", 1, 5, Some(at(2023, 6, 1))),
                record("W", 10, 0, None),
            ],
        );
        let report = ledger.attention_report(&ClassificationPolicy::default(), at(2024, 1, 1));

        assert_eq!(report.items.len(), 3);
        let order: Vec<_> = report.items.iter().map(|i| i.record.catalog_number.as_str()).collect();
        assert_eq!(order, vec!["X", "Y", "Z"]);
        assert_eq!(
            report.items[0].categories,
            vec![AttentionCategory::LowStock, AttentionCategory::Expired]
        );
        assert_eq!(report.count(AttentionCategory::LowStock), 1);
        assert_eq!(report.expired_count, 2);
        assert_eq!(report.expiring_soon_count, 1);
    }

    #[test]
    fn custom_window_widens_expiring_soon() {
        let policy = ClassificationPolicy::default().with_expiring_window_months(6);
        let now = at(2024, 1, 1);
        assert!(policy.is_expiring_soon(&record("A", 1, 0, Some(at(2024, 6, 1))), now));
    }

    #[test]
    fn hand_built_items_without_categories_have_no_primary() {
        let mut item = AttentionItem {
            record: record("A", 1, 0, None),
            total_quantity: 1,
            categories: Vec::new(),
        };
        assert_eq!(item.primary(), None);
        assert_eq!(item.status(), "-");

        item.categories = vec![AttentionCategory::ExpiringSoon, AttentionCategory::LowStock];
        assert_eq!(item.primary(), Some(AttentionCategory::LowStock));
        assert_eq!(item.status(), "low stock");
    }
}
