use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use labstock_core::{Aggregate, AggregateRoot, DomainError, DomainResult, Entity, LedgerId, RecordId};
use labstock_events::{AuditLog, Event};

use crate::entry::{LedgerAction, LedgerEntry, LocationChange, OrderRequest};
use crate::history::LedgerHistory;
use crate::record::{BatchKey, InventoryRecord};

/// Aggregate root: the lab's working set of batches plus its audit logs.
///
/// All mutation goes through typed commands. `handle` decides (and may
/// reject) without touching state; `apply` evolves state and appends the
/// matching audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryLedger {
    id: LedgerId,
    records: Vec<InventoryRecord>,
    update_log: AuditLog<LedgerEntry>,
    location_log: AuditLog<LocationChange>,
    order_log: AuditLog<OrderRequest>,
    version: u64,
}

impl InventoryLedger {
    /// Create an empty ledger.
    pub fn new(id: LedgerId) -> Self {
        Self {
            id,
            records: Vec::new(),
            update_log: AuditLog::new(),
            location_log: AuditLog::new(),
            order_log: AuditLog::new(),
            version: 0,
        }
    }

    /// Create a ledger holding already-typed records (e.g. from a seed).
    ///
    /// Seeding is not an audited action: no update-log rows are written.
    pub fn with_records(id: LedgerId, records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let mut ledger = Self::new(id);
        ledger.records = records.into_iter().collect();
        ledger
    }

    pub fn id_typed(&self) -> LedgerId {
        self.id
    }

    /// Active records in storage order.
    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| *r.id() == id)
    }

    fn record_mut(&mut self, id: RecordId) -> Option<&mut InventoryRecord> {
        self.records.iter_mut().find(|r| *r.id() == id)
    }

    /// Records sharing `catalog_number`, in storage order.
    pub fn records_for<'a>(
        &'a self,
        catalog_number: &'a str,
    ) -> impl Iterator<Item = &'a InventoryRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.catalog_number == catalog_number)
    }

    pub fn update_log(&self) -> &AuditLog<LedgerEntry> {
        &self.update_log
    }

    pub fn location_log(&self) -> &AuditLog<LocationChange> {
        &self.location_log
    }

    pub fn order_log(&self) -> &AuditLog<OrderRequest> {
        &self.order_log
    }

    /// Sum of quantities across active records of `catalog_number`.
    pub fn total_quantity(&self, catalog_number: &str) -> u64 {
        self.records_for(catalog_number).map(|r| r.quantity).sum()
    }

    /// Reorder threshold of a catalog number.
    ///
    /// Records of one catalog number normally agree; if they don't, the
    /// highest threshold wins.
    pub fn minimum_stock_level(&self, catalog_number: &str) -> u64 {
        self.records_for(catalog_number)
            .map(|r| r.minimum_stock_level)
            .max()
            .unwrap_or(0)
    }

    /// Drop depleted and blank records from the active set.
    ///
    /// Returns how many rows were dropped. Idempotent.
    pub fn normalize(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !r.is_depleted() && !r.is_blank());
        let dropped = before - self.records.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = self.records.len(), "normalized inventory");
        }
        dropped
    }

    /// Add a new batch. Always creates a new row, even when an identical
    /// (catalog, lot, expiration) batch exists.
    pub fn add(&mut self, cmd: AddStock) -> DomainResult<InventoryRecord> {
        let record_id = cmd.record_id;
        self.execute(&InventoryCommand::AddStock(cmd))?;
        self.record(record_id)
            .cloned()
            .ok_or_else(|| DomainError::invariant("added record is missing"))
    }

    /// Remove up to `requested_quantity` units from the selected batch.
    ///
    /// Best effort: when the batch holds less than requested, everything
    /// available is removed and the shortfall is reported in the outcome.
    pub fn remove(&mut self, cmd: RemoveStock) -> DomainResult<RemovalOutcome> {
        let requested = cmd.requested_quantity;
        let events = self.execute(&InventoryCommand::RemoveStock(cmd))?;
        let removed: u64 = events
            .iter()
            .map(|e| match e {
                InventoryEvent::StockRemoved(e) => e.removed,
                _ => 0,
            })
            .sum();
        let outcome = RemovalOutcome { requested, removed };
        if outcome.is_partial() {
            tracing::warn!(
                requested,
                removed,
                shortfall = outcome.shortfall(),
                "removal only partially satisfied"
            );
        }
        Ok(outcome)
    }

    /// Change the storage location of one batch. Returns `false` when the
    /// location was already the requested one (nothing logged).
    pub fn relocate(&mut self, cmd: RelocateBatch) -> DomainResult<bool> {
        let events = self.execute(&InventoryCommand::RelocateBatch(cmd))?;
        Ok(!events.is_empty())
    }

    /// Log a reorder request for a catalog number.
    pub fn request_reorder(&mut self, cmd: RequestReorder) -> DomainResult<OrderRequest> {
        self.execute(&InventoryCommand::RequestReorder(cmd))?;
        self.order_log
            .last()
            .cloned()
            .ok_or_else(|| DomainError::invariant("order request was not logged"))
    }

    /// Restore audit rows logged by earlier sessions.
    ///
    /// Must run before any command is applied, so restored rows keep their
    /// place ahead of this session's rows.
    pub fn restore_history(&mut self, history: LedgerHistory) -> DomainResult<()> {
        if !self.update_log.is_empty() || !self.location_log.is_empty() || !self.order_log.is_empty() {
            return Err(DomainError::invariant(
                "history can only be restored into a ledger with empty logs",
            ));
        }
        let restored = history.len();
        for entry in history.updates {
            self.update_log.append(entry);
        }
        for change in history.locations {
            self.location_log.append(change);
        }
        for request in history.orders {
            self.order_log.append(request);
        }
        tracing::debug!(restored, "restored audit history");
        Ok(())
    }
}

impl AggregateRoot for InventoryLedger {
    type Id = LedgerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Result of a removal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOutcome {
    pub requested: u64,
    pub removed: u64,
}

impl RemovalOutcome {
    pub fn shortfall(&self) -> u64 {
        self.requested.saturating_sub(self.removed)
    }

    /// The batch held less than requested.
    pub fn is_partial(&self) -> bool {
        self.removed < self.requested
    }
}

/// Command: AddStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStock {
    pub record_id: RecordId,
    pub catalog_number: String,
    pub item_name: String,
    pub quantity: u64,
    pub lot_id: String,
    pub expiration: Option<NaiveDateTime>,
    pub location: String,
    pub shelf: String,
    pub order_unit: String,
    pub minimum_stock_level: u64,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStock {
    pub catalog_number: String,
    pub lot_id: String,
    pub expiration: Option<NaiveDateTime>,
    pub requested_quantity: u64,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RelocateBatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocateBatch {
    pub record_id: RecordId,
    pub location: String,
    pub shelf: String,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RequestReorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestReorder {
    pub catalog_number: String,
    /// Defaults to the name on an active record of the catalog number.
    pub item_name: Option<String>,
    pub quantity: u64,
    /// Defaults to the order unit on an active record of the catalog number.
    pub order_unit: Option<String>,
    pub initials: String,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    AddStock(AddStock),
    RemoveStock(RemoveStock),
    RelocateBatch(RelocateBatch),
    RequestReorder(RequestReorder),
}

/// Event: StockAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdded {
    pub record: InventoryRecord,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
}

/// Units taken from one record during a removal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeduction {
    pub record_id: RecordId,
    pub quantity: u64,
}

/// Event: StockRemoved. Only emitted when at least one unit was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRemoved {
    pub catalog_number: String,
    pub item_name: String,
    pub batch: BatchKey,
    pub requested: u64,
    pub removed: u64,
    pub deductions: Vec<BatchDeduction>,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BatchRelocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRelocated {
    pub change: LocationChange,
}

/// Event: ReorderRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequested {
    pub request: OrderRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    StockAdded(StockAdded),
    StockRemoved(StockRemoved),
    BatchRelocated(BatchRelocated),
    ReorderRequested(ReorderRequested),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockAdded(_) => "inventory.stock.added",
            InventoryEvent::StockRemoved(_) => "inventory.stock.removed",
            InventoryEvent::BatchRelocated(_) => "inventory.batch.relocated",
            InventoryEvent::ReorderRequested(_) => "inventory.reorder.requested",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::StockAdded(e) => e.occurred_at,
            InventoryEvent::StockRemoved(e) => e.occurred_at,
            InventoryEvent::BatchRelocated(e) => e.change.timestamp,
            InventoryEvent::ReorderRequested(e) => e.request.timestamp,
        }
    }
}

impl Aggregate for InventoryLedger {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::StockAdded(e) => {
                self.records.push(e.record.clone());
                self.update_log.append(LedgerEntry {
                    timestamp: e.occurred_at,
                    catalog_number: e.record.catalog_number.clone(),
                    item_name: e.record.item_name.clone(),
                    action: LedgerAction::Add,
                    quantity: e.record.quantity,
                    initials: e.initials.clone(),
                    lot_id: e.record.lot_id.clone(),
                    expiration: e.record.expiration,
                });
            }
            InventoryEvent::StockRemoved(e) => {
                for deduction in &e.deductions {
                    if let Some(record) = self.record_mut(deduction.record_id) {
                        record.quantity = record.quantity.saturating_sub(deduction.quantity);
                    }
                }
                self.update_log.append(LedgerEntry {
                    timestamp: e.occurred_at,
                    catalog_number: e.catalog_number.clone(),
                    item_name: e.item_name.clone(),
                    action: LedgerAction::Remove,
                    quantity: e.removed,
                    initials: e.initials.clone(),
                    lot_id: e.batch.lot_id.clone(),
                    expiration: Some(e.batch.expiration),
                });
            }
            InventoryEvent::BatchRelocated(e) => {
                if let Some(record) = self.record_mut(e.change.record_id) {
                    record.location = e.change.to_location.clone();
                    record.shelf = e.change.to_shelf.clone();
                }
                self.location_log.append(e.change.clone());
            }
            InventoryEvent::ReorderRequested(e) => {
                self.order_log.append(e.request.clone());
            }
        }

        tracing::debug!(event_type = event.event_type(), version = self.version + 1, "applied inventory event");
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::AddStock(cmd) => self.handle_add(cmd),
            InventoryCommand::RemoveStock(cmd) => self.handle_remove(cmd),
            InventoryCommand::RelocateBatch(cmd) => self.handle_relocate(cmd),
            InventoryCommand::RequestReorder(cmd) => self.handle_reorder(cmd),
        }
    }
}

/// Initials are stored trimmed and upper-cased; blank initials are rejected.
fn normalize_initials(initials: &str) -> DomainResult<String> {
    let initials = initials.trim();
    if initials.is_empty() {
        return Err(DomainError::validation("initials are required"));
    }
    Ok(initials.to_uppercase())
}

impl InventoryLedger {
    fn handle_add(&self, cmd: &AddStock) -> Result<Vec<InventoryEvent>, DomainError> {
        let catalog_number = cmd.catalog_number.trim();
        if catalog_number.is_empty() {
            return Err(DomainError::validation("catalog number cannot be empty"));
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity to add must be positive"));
        }
        let initials = normalize_initials(&cmd.initials)?;
        if self.record(cmd.record_id).is_some() {
            return Err(DomainError::conflict(format!(
                "record {} already exists",
                cmd.record_id
            )));
        }

        Ok(vec![InventoryEvent::StockAdded(StockAdded {
            record: InventoryRecord {
                id: cmd.record_id,
                catalog_number: catalog_number.to_string(),
                item_name: cmd.item_name.trim().to_string(),
                quantity: cmd.quantity,
                lot_id: cmd.lot_id.trim().to_string(),
                expiration: cmd.expiration,
                location: cmd.location.trim().to_string(),
                shelf: cmd.shelf.trim().to_string(),
                order_unit: cmd.order_unit.trim().to_string(),
                minimum_stock_level: cmd.minimum_stock_level,
            },
            initials,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveStock) -> Result<Vec<InventoryEvent>, DomainError> {
        let catalog_number = cmd.catalog_number.trim();
        if catalog_number.is_empty() {
            return Err(DomainError::invalid_selection("catalog number is required"));
        }
        let batch = BatchKey::resolve(&cmd.lot_id, cmd.expiration)?;
        if cmd.requested_quantity == 0 {
            return Err(DomainError::validation("quantity to remove must be positive"));
        }
        let initials = normalize_initials(&cmd.initials)?;

        let deductions = self.plan_removal(catalog_number, &batch, cmd.requested_quantity);
        let removed: u64 = deductions.iter().map(|d| d.quantity).sum();
        if removed == 0 {
            tracing::info!(catalog_number, %batch, "nothing to remove from batch");
            return Ok(vec![]);
        }

        let item_name = self
            .records_for(catalog_number)
            .find(|r| r.matches(&batch))
            .map(|r| r.item_name.clone())
            .unwrap_or_default();

        Ok(vec![InventoryEvent::StockRemoved(StockRemoved {
            catalog_number: catalog_number.to_string(),
            item_name,
            batch,
            requested: cmd.requested_quantity,
            removed,
            deductions,
            initials,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Walk matching records in storage order, draining each before moving to
    /// the next and stopping as soon as the request is satisfied.
    fn plan_removal(&self, catalog_number: &str, batch: &BatchKey, requested: u64) -> Vec<BatchDeduction> {
        let mut remaining = requested;
        let mut deductions = Vec::new();

        for record in self.records_for(catalog_number).filter(|r| r.matches(batch)) {
            if remaining == 0 {
                break;
            }
            let available = record.quantity;
            if available == 0 {
                continue;
            }
            let take = remaining.min(available);
            deductions.push(BatchDeduction {
                record_id: record.id,
                quantity: take,
            });
            remaining -= take;
        }

        deductions
    }

    fn handle_relocate(&self, cmd: &RelocateBatch) -> Result<Vec<InventoryEvent>, DomainError> {
        let record = self.record(cmd.record_id).ok_or_else(DomainError::not_found)?;
        let initials = normalize_initials(&cmd.initials)?;
        let to_location = cmd.location.trim();
        let to_shelf = cmd.shelf.trim();

        if record.location == to_location && record.shelf == to_shelf {
            return Ok(vec![]);
        }

        Ok(vec![InventoryEvent::BatchRelocated(BatchRelocated {
            change: LocationChange {
                timestamp: cmd.occurred_at,
                record_id: record.id,
                catalog_number: record.catalog_number.clone(),
                item_name: record.item_name.clone(),
                lot_id: record.lot_id.clone(),
                from_location: record.location.clone(),
                from_shelf: record.shelf.clone(),
                to_location: to_location.to_string(),
                to_shelf: to_shelf.to_string(),
                initials,
            },
        })])
    }

    fn handle_reorder(&self, cmd: &RequestReorder) -> Result<Vec<InventoryEvent>, DomainError> {
        let catalog_number = cmd.catalog_number.trim();
        if catalog_number.is_empty() {
            return Err(DomainError::validation("catalog number cannot be empty"));
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("order quantity must be positive"));
        }
        let initials = normalize_initials(&cmd.initials)?;

        let known = self.records_for(catalog_number).next();
        let item_name = match (cmd.item_name.as_deref().map(str::trim), known) {
            (Some(name), _) if !name.is_empty() => name.to_string(),
            (_, Some(record)) => record.item_name.clone(),
            (_, None) => return Err(DomainError::not_found()),
        };
        let order_unit = match (cmd.order_unit.as_deref().map(str::trim), known) {
            (Some(unit), _) if !unit.is_empty() => unit.to_string(),
            (_, Some(record)) => record.order_unit.clone(),
            (_, None) => String::new(),
        };

        Ok(vec![InventoryEvent::ReorderRequested(ReorderRequested {
            request: OrderRequest {
                timestamp: cmd.occurred_at,
                catalog_number: catalog_number.to_string(),
                item_name,
                quantity: cmd.quantity,
                order_unit,
                initials,
                note: cmd.note.trim().to_string(),
            },
        })])
    }
}
