//! Restock/expiry alert text. Delivery (email etc.) is up to the caller.

use serde::{Deserialize, Serialize};

use crate::classify::{AttentionCategory, AttentionReport};
use crate::record::format_expiration;

/// How many item labels the subject lists before summarizing.
const SUBJECT_ITEM_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStyle {
    pub subject_prefix: String,
}

impl Default for AlertStyle {
    fn default() -> Self {
        Self {
            subject_prefix: "[Lab Inventory]".to_string(),
        }
    }
}

/// Composed alert, ready to hand to a mailer or print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    /// `None` when nothing needs attention.
    pub fn compose(report: &AttentionReport, style: &AlertStyle) -> Option<Self> {
        if report.is_empty() {
            return None;
        }

        let mut labels: Vec<String> = Vec::new();
        for item in &report.items {
            let label = format!("{} (Cat#: {})", item.record.item_name, item.record.catalog_number);
            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        let prefix = style.subject_prefix.trim();
        let subject = if labels.len() <= SUBJECT_ITEM_LIMIT {
            format!("{prefix} Needs attention: {}", labels.join(", "))
        } else {
            format!(
                "{prefix} {} items need attention: {}, +{} more",
                labels.len(),
                labels[..SUBJECT_ITEM_LIMIT].join(", "),
                labels.len() - SUBJECT_ITEM_LIMIT
            )
        };

        let mut lines = vec![
            subject.clone(),
            String::new(),
            format!(
                "Summary: {} {}, {} {}, {} {}",
                AttentionCategory::LowStock,
                report.low_stock_count,
                AttentionCategory::Expired,
                report.expired_count,
                AttentionCategory::ExpiringSoon,
                report.expiring_soon_count
            ),
            String::new(),
            "Details:".to_string(),
        ];
        for item in &report.items {
            let r = &item.record;
            let lot = if r.lot_id.is_empty() { "-" } else { r.lot_id.as_str() };
            lines.push(format!(
                "- {} (Cat#: {}) | Lot: {} | Qty: {} | Total: {} | Min: {} | Exp: {} | {}",
                r.item_name,
                r.catalog_number,
                lot,
                r.quantity,
                item.total_quantity,
                r.minimum_stock_level,
                format_expiration(r.expiration),
                item.status()
            ));
        }

        Some(Self {
            subject,
            body: lines.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AttentionItem;
    use crate::record::InventoryRecord;
    use labstock_core::RecordId;

    fn item(catalog: &str, category: AttentionCategory) -> AttentionItem {
        AttentionItem {
            record: InventoryRecord {
                id: RecordId::new(),
                catalog_number: catalog.to_string(),
                item_name: format!("Item {catalog}"),
                quantity: 1,
                lot_id: String::new(),
                expiration: None,
                location: String::new(),
                shelf: String::new(),
                order_unit: String::new(),
                minimum_stock_level: 2,
            },
            total_quantity: 1,
            categories: vec![category],
        }
    }

    fn report(items: Vec<AttentionItem>) -> AttentionReport {
        AttentionReport {
            low_stock_count: items.len(),
            items,
            expired_count: 0,
            expiring_soon_count: 0,
        }
    }

    #[test]
    fn empty_report_composes_nothing() {
        assert!(AlertMessage::compose(&AttentionReport::default(), &AlertStyle::default()).is_none());
    }

    #[test]
    fn short_subject_lists_every_item() {
        let msg = AlertMessage::compose(
            &report(vec![item("A1", AttentionCategory::LowStock)]),
            &AlertStyle::default(),
        )
        .unwrap();
        assert_eq!(msg.subject, "[Lab Inventory] Needs attention: Item A1 (Cat#: A1)");
        assert!(msg.body.contains("Summary: low stock 1, expired 0, expiring soon 0"));
        assert!(msg.body.contains("- Item A1 (Cat#: A1) | Lot: - | Qty: 1 | Total: 1 | Min: 2 | Exp: - | low stock"));
    }

    #[test]
    fn long_subject_is_summarized() {
        let items = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|c| item(c, AttentionCategory::LowStock))
            .collect();
        let style = AlertStyle {
            subject_prefix: "[Core Lab]".to_string(),
        };
        let msg = AlertMessage::compose(&report(items), &style).unwrap();
        assert_eq!(
            msg.subject,
            "[Core Lab] 5 items need attention: Item A (Cat#: A), Item B (Cat#: B), Item C (Cat#: C), +2 more"
        );
        assert_eq!(msg.body.lines().filter(|l| l.starts_with("- ")).count(), 5);
    }
}
