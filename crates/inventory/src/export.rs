//! Named export tables, independent of the destination format.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::AttentionReport;
use crate::ledger::InventoryLedger;
use crate::record::format_expiration;

pub const INVENTORY_TABLE: &str = "Inventory";
pub const UPDATE_LOG_TABLE: &str = "Update_Log";
pub const LOCATION_AUDIT_LOG_TABLE: &str = "Location_Audit_Log";
pub const ORDER_LOG_TABLE: &str = "Order_Log";
pub const ALERTS_TABLE: &str = "Alerts";

/// Append-only tables; earlier rows must be carried into every later export.
pub const LOG_TABLES: &[&str] = &[UPDATE_LOG_TABLE, LOCATION_AUDIT_LOG_TABLE, ORDER_LOG_TABLE];

/// Inventory columns; these are also accepted as seed headers.
pub const INVENTORY_HEADERS: &[&str] = &[
    "record_id",
    "item",
    "catalog_number",
    "quantity",
    "minimum_stock_level",
    "order_unit",
    "location",
    "shelf",
    "lot_id",
    "expiration",
];

const UPDATE_LOG_HEADERS: &[&str] = &[
    "timestamp",
    "catalog_number",
    "item",
    "action",
    "quantity",
    "initials",
    "lot_id",
    "expiration",
];

const LOCATION_AUDIT_LOG_HEADERS: &[&str] = &[
    "timestamp",
    "record_id",
    "catalog_number",
    "item",
    "lot_id",
    "from_location",
    "from_shelf",
    "to_location",
    "to_shelf",
    "initials",
];

const ORDER_LOG_HEADERS: &[&str] = &[
    "timestamp",
    "catalog_number",
    "item",
    "quantity",
    "order_unit",
    "initials",
    "note",
];

const ALERTS_HEADERS: &[&str] = &[
    "record_id",
    "item",
    "catalog_number",
    "quantity",
    "total_quantity",
    "minimum_stock_level",
    "location",
    "shelf",
    "lot_id",
    "expiration",
    "status",
    "categories",
];

/// A named table of text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Cell by header name.
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Unknown expirations export as an empty cell so the file re-seeds cleanly.
fn expiration_cell(expiration: Option<NaiveDateTime>) -> String {
    match expiration {
        Some(_) => format_expiration(expiration),
        None => String::new(),
    }
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Snapshot of the ledger as named tables.
///
/// Tables come out in a fixed order (Inventory, Update_Log,
/// Location_Audit_Log, Order_Log); empty logs are still present with headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTables {
    pub tables: Vec<Table>,
}

impl ExportTables {
    pub fn from_ledger(ledger: &InventoryLedger) -> Self {
        let mut inventory = Table::new(INVENTORY_TABLE, INVENTORY_HEADERS);
        for r in ledger.records() {
            inventory.rows.push(vec![
                r.id.to_string(),
                r.item_name.clone(),
                r.catalog_number.clone(),
                r.quantity.to_string(),
                r.minimum_stock_level.to_string(),
                r.order_unit.clone(),
                r.location.clone(),
                r.shelf.clone(),
                r.lot_id.clone(),
                expiration_cell(r.expiration),
            ]);
        }

        let mut updates = Table::new(UPDATE_LOG_TABLE, UPDATE_LOG_HEADERS);
        for e in ledger.update_log().iter() {
            updates.rows.push(vec![
                timestamp(e.timestamp),
                e.catalog_number.clone(),
                e.item_name.clone(),
                e.action.to_string(),
                e.quantity.to_string(),
                e.initials.clone(),
                e.lot_id.clone(),
                expiration_cell(e.expiration),
            ]);
        }

        let mut locations = Table::new(LOCATION_AUDIT_LOG_TABLE, LOCATION_AUDIT_LOG_HEADERS);
        for c in ledger.location_log().iter() {
            locations.rows.push(vec![
                timestamp(c.timestamp),
                c.record_id.to_string(),
                c.catalog_number.clone(),
                c.item_name.clone(),
                c.lot_id.clone(),
                c.from_location.clone(),
                c.from_shelf.clone(),
                c.to_location.clone(),
                c.to_shelf.clone(),
                c.initials.clone(),
            ]);
        }

        let mut orders = Table::new(ORDER_LOG_TABLE, ORDER_LOG_HEADERS);
        for o in ledger.order_log().iter() {
            orders.rows.push(vec![
                timestamp(o.timestamp),
                o.catalog_number.clone(),
                o.item_name.clone(),
                o.quantity.to_string(),
                o.order_unit.clone(),
                o.initials.clone(),
                o.note.clone(),
            ]);
        }

        Self {
            tables: vec![inventory, updates, locations, orders],
        }
    }

    /// Append the "needs attention" set as an `Alerts` table, in report order.
    pub fn with_alerts(mut self, report: &AttentionReport) -> Self {
        let mut alerts = Table::new(ALERTS_TABLE, ALERTS_HEADERS);
        for item in &report.items {
            let r = &item.record;
            alerts.rows.push(vec![
                r.id.to_string(),
                r.item_name.clone(),
                r.catalog_number.clone(),
                r.quantity.to_string(),
                item.total_quantity.to_string(),
                r.minimum_stock_level.to_string(),
                r.location.clone(),
                r.shelf.clone(),
                r.lot_id.clone(),
                expiration_cell(r.expiration),
                item.status().to_string(),
                item.categories
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join("; "),
            ]);
        }
        self.tables.retain(|t| t.name != ALERTS_TABLE);
        self.tables.push(alerts);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}
