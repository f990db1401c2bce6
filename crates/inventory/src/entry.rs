//! Append-only audit rows: stock updates, location edits and reorder requests.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use labstock_core::{DomainError, RecordId};

/// Kind of stock movement recorded in the update log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAction {
    Add,
    Remove,
}

impl LedgerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerAction::Add => "Add",
            LedgerAction::Remove => "Remove",
        }
    }
}

impl core::str::FromStr for LedgerAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Add" => Ok(LedgerAction::Add),
            "Remove" => Ok(LedgerAction::Remove),
            other => Err(DomainError::validation(format!("unknown ledger action '{other}'"))),
        }
    }
}

impl core::fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Add or Remove action (Update_Log row).
///
/// `quantity` is always the amount actually moved, never the amount requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub catalog_number: String,
    pub item_name: String,
    pub action: LedgerAction,
    pub quantity: u64,
    pub initials: String,
    pub lot_id: String,
    pub expiration: Option<NaiveDateTime>,
}

/// A storage location edit (Location_Audit_Log row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationChange {
    pub timestamp: DateTime<Utc>,
    pub record_id: RecordId,
    pub catalog_number: String,
    pub item_name: String,
    pub lot_id: String,
    pub from_location: String,
    pub from_shelf: String,
    pub to_location: String,
    pub to_shelf: String,
    pub initials: String,
}

/// A reorder request (Order_Log row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub timestamp: DateTime<Utc>,
    pub catalog_number: String,
    pub item_name: String,
    pub quantity: u64,
    pub order_unit: String,
    pub initials: String,
    pub note: String,
}
