use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};

use labstock_core::RecordId;
use labstock_inventory::{
    AddStock, AlertMessage, AlertStyle, ClassificationPolicy, InventoryLedger, InventoryRecord,
    RelocateBatch, RemoveStock, RequestReorder, format_expiration,
};

use crate::args::Command;

/// One user session: the ledger it owns plus the display settings.
#[derive(Debug, Clone)]
pub struct Session {
    ledger: InventoryLedger,
    policy: ClassificationPolicy,
    style: AlertStyle,
}

impl Session {
    pub fn new(ledger: InventoryLedger, policy: ClassificationPolicy, style: AlertStyle) -> Self {
        Self { ledger, policy, style }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InventoryLedger {
        &mut self.ledger
    }

    /// Apply one command.
    ///
    /// `occurred_at` stamps audit rows; `today` is the lab-local clock used
    /// for expiry classification.
    pub fn execute(
        &mut self,
        command: &Command,
        occurred_at: DateTime<Utc>,
        today: NaiveDateTime,
    ) -> anyhow::Result<String> {
        match command {
            Command::List { query } => Ok(self.list(query.as_deref().unwrap_or(""))),
            Command::Report { .. } => Ok(self.report(today)),
            Command::Add {
                catalog_number,
                item_name,
                quantity,
                lot_id,
                expiration,
                location,
                shelf,
                order_unit,
                minimum_stock_level,
                initials,
            } => {
                let record = self.ledger.add(AddStock {
                    record_id: RecordId::new(),
                    catalog_number: catalog_number.clone(),
                    item_name: item_name.clone(),
                    quantity: *quantity,
                    lot_id: lot_id.clone(),
                    expiration: *expiration,
                    location: location.clone(),
                    shelf: shelf.clone(),
                    order_unit: order_unit.clone(),
                    minimum_stock_level: *minimum_stock_level,
                    initials: initials.clone(),
                    occurred_at,
                })?;
                Ok(format!(
                    "added {} x {} (Cat#: {}) as record {}; total now {}",
                    record.quantity,
                    record.item_name,
                    record.catalog_number,
                    record.id,
                    self.ledger.total_quantity(&record.catalog_number)
                ))
            }
            Command::Remove {
                catalog_number,
                lot_id,
                expiration,
                quantity,
                initials,
            } => {
                let outcome = self.ledger.remove(RemoveStock {
                    catalog_number: catalog_number.clone(),
                    lot_id: lot_id.clone(),
                    expiration: *expiration,
                    requested_quantity: *quantity,
                    initials: initials.clone(),
                    occurred_at,
                })?;
                let mut out = format!(
                    "removed {} from {} lot {}; total now {}",
                    outcome.removed,
                    catalog_number.trim(),
                    lot_id.trim(),
                    self.ledger.total_quantity(catalog_number.trim())
                );
                if outcome.is_partial() {
                    let _ = write!(
                        out,
                        "\nwarning: only {} of {} requested were in stock ({} short)",
                        outcome.removed,
                        outcome.requested,
                        outcome.shortfall()
                    );
                }
                Ok(out)
            }
            Command::Relocate {
                record_id,
                location,
                shelf,
                initials,
            } => {
                let changed = self.ledger.relocate(RelocateBatch {
                    record_id: *record_id,
                    location: location.clone(),
                    shelf: shelf.clone(),
                    initials: initials.clone(),
                    occurred_at,
                })?;
                Ok(if changed {
                    format!("moved record {record_id} to {} / {}", location.trim(), shelf.trim())
                } else {
                    format!("record {record_id} is already at {} / {}", location.trim(), shelf.trim())
                })
            }
            Command::Reorder {
                catalog_number,
                quantity,
                initials,
                item_name,
                order_unit,
                note,
            } => {
                let request = self.ledger.request_reorder(RequestReorder {
                    catalog_number: catalog_number.clone(),
                    item_name: item_name.clone(),
                    quantity: *quantity,
                    order_unit: order_unit.clone(),
                    initials: initials.clone(),
                    note: note.clone(),
                    occurred_at,
                })?;
                Ok(format!(
                    "order requested: {} {} of {} (Cat#: {})",
                    request.quantity, request.order_unit, request.item_name, request.catalog_number
                ))
            }
            Command::Export { .. } => Ok(String::new()),
        }
    }

    fn list(&self, query: &str) -> String {
        let records = self.ledger.search(query);
        if records.is_empty() {
            return "no matching items".to_string();
        }
        records.into_iter().map(record_line).collect::<Vec<_>>().join("\n")
    }

    fn report(&self, today: NaiveDateTime) -> String {
        let mut out = String::from("Catalog totals:\n");
        for summary in self.ledger.catalog_summaries() {
            let _ = writeln!(
                out,
                "  {} (Cat#: {}): {} in {} batch(es), min {}{}",
                summary.item_name,
                summary.catalog_number,
                summary.total_quantity,
                summary.batch_count,
                summary.minimum_stock_level,
                if summary.is_low_stock() { "  [LOW]" } else { "" }
            );
        }

        let report = self.ledger.attention_report(&self.policy, today);
        match AlertMessage::compose(&report, &self.style) {
            None => out.push_str("\nNo items are expired, expiring soon, or at/below minimum stock."),
            Some(alert) => {
                out.push('\n');
                out.push_str(&alert.body);
            }
        }
        out
    }
}

fn record_line(record: &InventoryRecord) -> String {
    format!(
        "{}  {} (Cat#: {})  qty {}  lot {}  exp {}  @ {} / {}",
        record.id,
        record.item_name,
        record.catalog_number,
        record.quantity,
        if record.lot_id.is_empty() { "-" } else { record.lot_id.as_str() },
        format_expiration(record.expiration),
        record.location,
        record.shelf
    )
}
