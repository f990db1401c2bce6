//! Catalog lookups over the active record set.

use serde::{Deserialize, Serialize};

use crate::ledger::InventoryLedger;
use crate::record::InventoryRecord;

/// Per-catalog-number aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub catalog_number: String,
    pub item_name: String,
    pub total_quantity: u64,
    pub minimum_stock_level: u64,
    pub batch_count: usize,
}

impl CatalogSummary {
    pub fn is_low_stock(&self) -> bool {
        self.total_quantity <= self.minimum_stock_level
    }
}

impl InventoryLedger {
    /// Case-insensitive substring search on item name and catalog number.
    ///
    /// A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&InventoryRecord> {
        let needle = query.trim().to_lowercase();
        self.records()
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.item_name.to_lowercase().contains(&needle)
                    || r.catalog_number.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// One summary per catalog number, in order of first appearance.
    pub fn catalog_summaries(&self) -> Vec<CatalogSummary> {
        let mut summaries: Vec<CatalogSummary> = Vec::new();
        for record in self.records() {
            if summaries.iter().any(|s| s.catalog_number == record.catalog_number) {
                continue;
            }
            summaries.push(CatalogSummary {
                catalog_number: record.catalog_number.clone(),
                item_name: record.item_name.clone(),
                total_quantity: self.total_quantity(&record.catalog_number),
                minimum_stock_level: self.minimum_stock_level(&record.catalog_number),
                batch_count: self.records_for(&record.catalog_number).count(),
            });
        }
        summaries
    }
}
