use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use labstock_core::{DomainError, DomainResult, Entity, RecordId, ValueObject};

/// One physical batch of a catalog item.
///
/// Several records may share a `catalog_number`, one per lot/expiration
/// batch (or more, since adds never merge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    pub catalog_number: String,
    pub item_name: String,
    /// Units remaining in this batch.
    pub quantity: u64,
    /// Empty when the lot is unknown.
    pub lot_id: String,
    pub expiration: Option<NaiveDateTime>,
    pub location: String,
    pub shelf: String,
    pub order_unit: String,
    /// Reorder threshold for the whole catalog number.
    pub minimum_stock_level: u64,
}

impl InventoryRecord {
    /// True when this record belongs to the batch identified by `key`.
    pub fn matches(&self, key: &BatchKey) -> bool {
        self.lot_id == key.lot_id && self.expiration == Some(key.expiration)
    }

    /// A row with neither an item name nor a catalog number carries no information.
    pub fn is_blank(&self) -> bool {
        self.item_name.trim().is_empty() && self.catalog_number.trim().is_empty()
    }

    /// `true` once the batch has been fully consumed.
    pub fn is_depleted(&self) -> bool {
        self.quantity == 0
    }
}

impl Entity for InventoryRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A resolved batch selection: both lot and expiration are known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchKey {
    pub lot_id: String,
    pub expiration: NaiveDateTime,
}

impl ValueObject for BatchKey {}

impl BatchKey {
    /// Resolve a user selection into a batch key.
    ///
    /// A blank lot or a missing expiration does not identify a batch and is
    /// rejected with [`DomainError::InvalidSelection`].
    pub fn resolve(lot_id: &str, expiration: Option<NaiveDateTime>) -> DomainResult<Self> {
        let lot_id = lot_id.trim();
        if lot_id.is_empty() {
            return Err(DomainError::invalid_selection("lot number is required"));
        }
        let Some(expiration) = expiration else {
            return Err(DomainError::invalid_selection("expiration date is required"));
        };
        Ok(Self {
            lot_id: lot_id.to_string(),
            expiration,
        })
    }
}

impl core::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "lot {} exp {}", self.lot_id, format_expiration(Some(self.expiration)))
    }
}

/// Render an expiration the way it was most likely entered: date-only when
/// the time part is midnight, `-` when unknown.
pub fn format_expiration(expiration: Option<NaiveDateTime>) -> String {
    match expiration {
        None => "-".to_string(),
        Some(ts) if ts.time() == chrono::NaiveTime::MIN => ts.format("%Y-%m-%d").to_string(),
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
