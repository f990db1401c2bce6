//! Audit history carried over from earlier exports.
//!
//! The log tables are append-only across sessions: a ledger seeded from the
//! Inventory table gets its earlier Update_Log, Location_Audit_Log and
//! Order_Log rows restored before any new command runs.

use chrono::{DateTime, NaiveDateTime, Utc};

use labstock_core::{DomainError, DomainResult, RecordId};

use crate::entry::{LedgerEntry, LocationChange, OrderRequest};
use crate::export::{LOCATION_AUDIT_LOG_TABLE, ORDER_LOG_TABLE, Table, UPDATE_LOG_TABLE};
use crate::seed::parse_expiration;

/// Previously logged audit rows, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerHistory {
    pub updates: Vec<LedgerEntry>,
    pub locations: Vec<LocationChange>,
    pub orders: Vec<OrderRequest>,
}

impl LedgerHistory {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.locations.is_empty() && self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len() + self.locations.len() + self.orders.len()
    }

    /// Parse exported log tables. Tables with other names are ignored and a
    /// missing log table is simply empty history.
    pub fn from_tables<'a>(tables: impl IntoIterator<Item = &'a Table>) -> DomainResult<Self> {
        let mut history = Self::default();
        for table in tables {
            match table.name.as_str() {
                UPDATE_LOG_TABLE => {
                    for row in rows(table) {
                        history.updates.push(LedgerEntry {
                            timestamp: row.timestamp()?,
                            catalog_number: row.text("catalog_number"),
                            item_name: row.text("item"),
                            action: row.text("action").parse().map_err(|_| row.invalid("action"))?,
                            quantity: row.count("quantity")?,
                            initials: row.text("initials"),
                            lot_id: row.text("lot_id"),
                            expiration: row.expiration()?,
                        });
                    }
                }
                LOCATION_AUDIT_LOG_TABLE => {
                    for row in rows(table) {
                        history.locations.push(LocationChange {
                            timestamp: row.timestamp()?,
                            record_id: row
                                .text("record_id")
                                .parse::<RecordId>()
                                .map_err(|_| row.invalid("record_id"))?,
                            catalog_number: row.text("catalog_number"),
                            item_name: row.text("item"),
                            lot_id: row.text("lot_id"),
                            from_location: row.text("from_location"),
                            from_shelf: row.text("from_shelf"),
                            to_location: row.text("to_location"),
                            to_shelf: row.text("to_shelf"),
                            initials: row.text("initials"),
                        });
                    }
                }
                ORDER_LOG_TABLE => {
                    for row in rows(table) {
                        history.orders.push(OrderRequest {
                            timestamp: row.timestamp()?,
                            catalog_number: row.text("catalog_number"),
                            item_name: row.text("item"),
                            quantity: row.count("quantity")?,
                            order_unit: row.text("order_unit"),
                            initials: row.text("initials"),
                            note: row.text("note"),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(history)
    }
}

struct Row<'a> {
    table: &'a Table,
    index: usize,
}

fn rows(table: &Table) -> impl Iterator<Item = Row<'_>> {
    (0..table.rows.len()).map(move |index| Row { table, index })
}

impl Row<'_> {
    fn text(&self, header: &str) -> String {
        self.table.cell(self.index, header).unwrap_or("").trim().to_string()
    }

    fn invalid(&self, header: &str) -> DomainError {
        DomainError::validation(format!(
            "{} row {}: invalid {} '{}'",
            self.table.name,
            self.index + 1,
            header,
            self.text(header)
        ))
    }

    fn timestamp(&self) -> DomainResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.text("timestamp"))
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| self.invalid("timestamp"))
    }

    fn count(&self, header: &str) -> DomainResult<u64> {
        self.text(header).parse().map_err(|_| self.invalid(header))
    }

    /// Blank means unknown; anything else must parse.
    fn expiration(&self) -> DomainResult<Option<NaiveDateTime>> {
        let raw = self.text("expiration");
        if raw.is_empty() {
            return Ok(None);
        }
        parse_expiration(&raw)
            .map(Some)
            .ok_or_else(|| self.invalid("expiration"))
    }
}
