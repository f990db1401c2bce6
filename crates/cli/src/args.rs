use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use labstock_core::RecordId;
use labstock_inventory::{AlertStyle, ClassificationPolicy, parse_expiration};

/// Lab supply inventory tracker.
#[derive(Debug, Clone, Parser)]
#[command(name = "labstock", version, about)]
pub struct Cli {
    /// Seed inventory table (CSV with a header row). A missing file means an empty inventory.
    #[arg(long, env = "LABSTOCK_SEED", global = true)]
    pub seed: Option<PathBuf>,

    /// Directory holding Inventory.csv, Alerts.csv and the audit logs
    /// (Update_Log.csv, Location_Audit_Log.csv, Order_Log.csv). Earlier log
    /// rows found here are kept in every later export.
    #[arg(long, env = "LABSTOCK_EXPORT_DIR", global = true)]
    pub export_dir: Option<PathBuf>,

    /// Calendar months ahead that count as "expiring soon".
    #[arg(long, env = "LABSTOCK_EXPIRY_WINDOW_MONTHS", default_value_t = 2, global = true)]
    pub expiry_window_months: u32,

    /// Subject prefix for alert messages.
    #[arg(long, env = "LABSTOCK_ALERT_PREFIX", default_value = "[Lab Inventory]", global = true)]
    pub alert_prefix: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn policy(&self) -> ClassificationPolicy {
        ClassificationPolicy::default().with_expiring_window_months(self.expiry_window_months)
    }

    pub fn alert_style(&self) -> AlertStyle {
        AlertStyle {
            subject_prefix: self.alert_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List batches, optionally filtered by item name or catalog number.
    List {
        query: Option<String>,
    },

    /// Show catalog totals and the items needing attention, with an alert preview.
    Report {
        /// Also write the needs-attention set as a CSV table.
        #[arg(long)]
        alerts_csv: Option<PathBuf>,
    },

    /// Add a new batch.
    Add {
        #[arg(long = "catalog")]
        catalog_number: String,
        #[arg(long = "item")]
        item_name: String,
        #[arg(long)]
        quantity: u64,
        #[arg(long = "lot", default_value = "")]
        lot_id: String,
        #[arg(long, value_parser = expiration_arg)]
        expiration: Option<NaiveDateTime>,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        shelf: String,
        #[arg(long, default_value = "")]
        order_unit: String,
        #[arg(long = "min-stock", default_value_t = 0)]
        minimum_stock_level: u64,
        #[arg(long)]
        initials: String,
    },

    /// Remove units from one (lot, expiration) batch.
    Remove {
        #[arg(long = "catalog")]
        catalog_number: String,
        #[arg(long = "lot", default_value = "")]
        lot_id: String,
        #[arg(long, value_parser = expiration_arg)]
        expiration: Option<NaiveDateTime>,
        #[arg(long)]
        quantity: u64,
        #[arg(long)]
        initials: String,
    },

    /// Move a batch to another location/shelf.
    Relocate {
        #[arg(long = "record")]
        record_id: RecordId,
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "")]
        shelf: String,
        #[arg(long)]
        initials: String,
    },

    /// Log a reorder request.
    Reorder {
        #[arg(long = "catalog")]
        catalog_number: String,
        #[arg(long)]
        quantity: u64,
        #[arg(long)]
        initials: String,
        #[arg(long = "item")]
        item_name: Option<String>,
        #[arg(long)]
        order_unit: Option<String>,
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Export the current state (CSV directory, and optionally one JSON file).
    Export {
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

impl Command {
    /// Commands that change the ledger.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Remove { .. } | Command::Relocate { .. } | Command::Reorder { .. }
        )
    }
}

fn expiration_arg(raw: &str) -> Result<NaiveDateTime, String> {
    parse_expiration(raw).ok_or_else(|| format!("unrecognized date '{raw}' (expected YYYY-MM-DD)"))
}
