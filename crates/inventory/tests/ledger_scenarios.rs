use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

use labstock_core::{DomainError, LedgerId, RecordId};
use labstock_inventory::{
    AddStock, AttentionCategory, ClassificationPolicy, ExportTables, InventoryLedger, LedgerAction,
    RemovalOutcome, RemoveStock, SeedRow,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn remove(lot: &str, expiration: NaiveDateTime, requested: u64) -> RemoveStock {
    RemoveStock {
        catalog_number: "ABC100".to_string(),
        lot_id: lot.to_string(),
        expiration: Some(expiration),
        requested_quantity: requested,
        initials: "kp".to_string(),
        occurred_at: Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap(),
    }
}

fn seeded() -> InventoryLedger {
    let row = |lot: &str, exp: &str, qty: &str| SeedRow {
        item: "Agarose".to_string(),
        catalog_number: "ABC100".to_string(),
        quantity: qty.to_string(),
        lot_id: lot.to_string(),
        expiration: exp.to_string(),
        minimum_stock_level: "2".to_string(),
        ..SeedRow::default()
    };
    InventoryLedger::from_seed(
        LedgerId::new(),
        vec![row("L1", "2025-01-01", "5"), row("L2", "2025-06-01", "3")],
    )
}

#[test]
fn two_batch_walkthrough() {
    let mut ledger = seeded();

    let first = ledger.remove(remove("L1", day(2025, 1, 1), 5)).unwrap();
    assert_eq!(first, RemovalOutcome { requested: 5, removed: 5 });
    assert_eq!(ledger.records()[0].quantity, 0);
    assert_eq!(ledger.records()[1].quantity, 3);

    let second = ledger.remove(remove("L2", day(2025, 6, 1), 10)).unwrap();
    assert_eq!(second.removed, 3);
    assert!(second.is_partial());

    let entries: Vec<_> = ledger.update_log().iter().collect();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.action == LedgerAction::Remove));
    assert_eq!(entries[0].quantity, 5);
    assert_eq!(entries[1].quantity, 3);
    assert_eq!(entries[1].initials, "KP");

    ledger.normalize();
    assert!(ledger.records().is_empty());
    assert_eq!(ledger.total_quantity("ABC100"), 0);
}

#[test]
fn removal_after_depletion_logs_nothing() {
    let mut ledger = seeded();
    ledger.remove(remove("L1", day(2025, 1, 1), 5)).unwrap();

    let again = ledger.remove(remove("L1", day(2025, 1, 1), 1)).unwrap();
    assert_eq!(again.removed, 0);
    assert_eq!(ledger.update_log().len(), 1);
}

#[test]
fn invalid_selection_leaves_everything_untouched() {
    let mut ledger = seeded();
    let before = ledger.clone();

    let mut cmd = remove("L1", day(2025, 1, 1), 1);
    cmd.expiration = None;
    assert!(matches!(ledger.remove(cmd).unwrap_err(), DomainError::InvalidSelection(_)));
    assert_eq!(ledger, before);
}

#[test]
fn add_then_classify_and_export() {
    let mut ledger = seeded();
    ledger
        .add(AddStock {
            record_id: RecordId::new(),
            catalog_number: "TIP-10".to_string(),
            item_name: "Filter tips 10uL".to_string(),
            quantity: 1,
            lot_id: "T1".to_string(),
            expiration: Some(day(2025, 2, 15)),
            location: "Room 204".to_string(),
            shelf: "C".to_string(),
            order_unit: "rack".to_string(),
            minimum_stock_level: 1,
            initials: "kp".to_string(),
            occurred_at: Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap(),
        })
        .unwrap();

    let report = ledger.attention_report(&ClassificationPolicy::default(), day(2025, 1, 2));
    let tips = report
        .items
        .iter()
        .find(|i| i.record.catalog_number == "TIP-10")
        .unwrap();
    assert_eq!(
        tips.categories,
        vec![AttentionCategory::LowStock, AttentionCategory::ExpiringSoon]
    );
    // L1 expired yesterday; L2 expires in June, outside the two-month window.
    assert_eq!(report.expired_count, 1);

    let export = ExportTables::from_ledger(&ledger);
    assert_eq!(export.table("Inventory").unwrap().rows.len(), 3);
    assert_eq!(export.table("Update_Log").unwrap().rows.len(), 1);
}
