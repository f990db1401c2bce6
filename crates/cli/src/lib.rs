//! `labstock` command line: load a seed, apply one action, report, export.

pub mod args;
pub mod session;

pub use args::{Cli, Command};
pub use session::Session;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDateTime, Utc};

use labstock_infra::{
    CsvDirectorySink, CsvSeedSource, ExportSink, InMemorySeedSource, JsonFileSink, load_ledger,
    write_table_csv,
};
use labstock_inventory::{ALERTS_TABLE, ExportTables};

/// Run one CLI invocation and return what should be printed.
pub fn run(cli: Cli) -> anyhow::Result<String> {
    run_at(cli, Utc::now(), Local::now().naive_local())
}

/// [`run`] with explicit clocks: `occurred_at` stamps audit rows and `today`
/// (lab-local) drives expiry classification.
pub fn run_at(cli: Cli, occurred_at: DateTime<Utc>, today: NaiveDateTime) -> anyhow::Result<String> {
    let mut ledger = match &cli.seed {
        Some(path) => load_ledger(&CsvSeedSource::new(path))
            .with_context(|| format!("loading seed {}", path.display()))?,
        None => load_ledger(&InMemorySeedSource::missing())?,
    };
    if let Some(dir) = &cli.export_dir {
        let history = CsvDirectorySink::new(dir)
            .read_history()
            .with_context(|| format!("reading audit history from {}", dir.display()))?;
        ledger.restore_history(history)?;
    }

    let mut session = Session::new(ledger, cli.policy(), cli.alert_style());
    let mutated = cli.command.is_mutation();
    let output = session.execute(&cli.command, occurred_at, today)?;

    if mutated {
        session.ledger_mut().normalize();
    }

    let export = || {
        let report = session.ledger().attention_report(&cli.policy(), today);
        ExportTables::from_ledger(session.ledger()).with_alerts(&report)
    };

    let mut lines = vec![output];
    match &cli.command {
        args::Command::Export { json: Some(path) } => {
            let written = JsonFileSink::new(path).write(&export())?;
            lines.extend(written.iter().map(|p| format!("wrote {}", p.display())));
        }
        args::Command::Report { alerts_csv: Some(path) } => {
            let tables = export();
            if let Some(alerts) = tables.table(ALERTS_TABLE) {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_table_csv(alerts, file)?;
                lines.push(format!("wrote {}", path.display()));
            }
        }
        _ => {}
    }
    if mutated || matches!(cli.command, args::Command::Export { .. }) {
        if let Some(dir) = &cli.export_dir {
            let written = CsvDirectorySink::new(dir)
                .write(&export())
                .with_context(|| format!("exporting to {}", dir.display()))?;
            lines.extend(written.iter().map(|p| format!("wrote {}", p.display())));
        } else if mutated {
            tracing::warn!("no export directory configured; changes are not saved");
        }
    }

    Ok(lines
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}
