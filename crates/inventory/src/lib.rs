//! Lab-supply inventory ledger.
//!
//! Batch-aware stock tracking with an append-only audit trail, implemented
//! as deterministic domain logic (no IO, no storage). Seed rows are coerced
//! into typed records at the boundary; exports are plain named tables.

pub mod alert;
pub mod classify;
pub mod entry;
pub mod export;
pub mod history;
pub mod ledger;
pub mod query;
pub mod record;
pub mod seed;

pub use alert::{AlertMessage, AlertStyle};
pub use classify::{AttentionCategory, AttentionItem, AttentionReport, ClassificationPolicy};
pub use entry::{LedgerAction, LedgerEntry, LocationChange, OrderRequest};
pub use export::{
    ALERTS_TABLE, ExportTables, INVENTORY_TABLE, LOCATION_AUDIT_LOG_TABLE, LOG_TABLES, ORDER_LOG_TABLE,
    Table, UPDATE_LOG_TABLE,
};
pub use history::LedgerHistory;
pub use ledger::{
    AddStock, BatchDeduction, BatchRelocated, InventoryCommand, InventoryEvent, InventoryLedger,
    RelocateBatch, RemovalOutcome, RemoveStock, ReorderRequested, RequestReorder, StockAdded,
    StockRemoved,
};
pub use query::CatalogSummary;
pub use record::{BatchKey, InventoryRecord, format_expiration};
pub use seed::{SeedRow, coerce_count, parse_expiration};
