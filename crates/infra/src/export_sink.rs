use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use labstock_core::DomainError;
use labstock_inventory::{ExportTables, LOG_TABLES, LedgerHistory, Table};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to encode export as json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode table {table}: {source}")]
    Decode {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("exported history is malformed: {0}")]
    History(#[from] DomainError),
}

/// Destination for an export snapshot. Returns the files written.
pub trait ExportSink {
    fn write(&self, export: &ExportTables) -> Result<Vec<PathBuf>, ExportError>;
}

/// Write one table as CSV (header row always present).
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read one CSV table (header row first) under `name`.
pub fn read_table_csv<R: Read>(name: &str, reader: R) -> Result<Table, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(Table {
        name: name.to_string(),
        headers,
        rows,
    })
}

/// One `<table name>.csv` per table in a directory (created if needed).
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    /// Audit rows written by earlier exports to this directory.
    ///
    /// Log files that don't exist yet are empty history.
    pub fn read_history(&self) -> Result<LedgerHistory, ExportError> {
        let mut tables = Vec::with_capacity(LOG_TABLES.len());
        for name in LOG_TABLES {
            let path = self.table_path(name);
            let file = match std::fs::File::open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(ExportError::Read { path, source }),
            };
            let table = read_table_csv(name, file).map_err(|source| ExportError::Decode {
                table: name.to_string(),
                source,
            })?;
            tables.push(table);
        }
        let history = LedgerHistory::from_tables(&tables)?;
        tracing::info!(dir = %self.dir.display(), rows = history.len(), "read audit history");
        Ok(history)
    }
}

impl ExportSink for CsvDirectorySink {
    fn write(&self, export: &ExportTables) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(export.tables.len());
        for table in &export.tables {
            let path = self.table_path(&table.name);
            let file = std::fs::File::create(&path).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            write_table_csv(table, file).map_err(|source| ExportError::Csv {
                table: table.name.clone(),
                source,
            })?;
            written.push(path);
        }

        tracing::info!(dir = %self.dir.display(), tables = written.len(), "exported inventory");
        Ok(written)
    }
}

/// The whole export as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExportSink for JsonFileSink {
    fn write(&self, export: &ExportTables) -> Result<Vec<PathBuf>, ExportError> {
        let json = serde_json::to_vec_pretty(export)?;
        std::fs::write(&self.path, json).map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "exported inventory");
        Ok(vec![self.path.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_source::CsvSeedSource;
    use chrono::{NaiveDate, Utc};
    use labstock_core::{LedgerId, RecordId};
    use labstock_inventory::{AddStock, InventoryLedger};

    fn ledger() -> InventoryLedger {
        let mut ledger = InventoryLedger::new(LedgerId::new());
        ledger
            .add(AddStock {
                record_id: RecordId::new(),
                catalog_number: "ABC100".to_string(),
                item_name: "Agarose, low melt".to_string(),
                quantity: 2,
                lot_id: "L1".to_string(),
                expiration: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0),
                location: "Bench".to_string(),
                shelf: "1".to_string(),
                order_unit: "bottle".to_string(),
                minimum_stock_level: 1,
                initials: "MR".to_string(),
                occurred_at: Utc::now(),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn inventory_table_reseeds_losslessly() {
        let ledger = ledger();
        let export = ExportTables::from_ledger(&ledger);
        let mut buf = Vec::new();
        write_table_csv(export.table("Inventory").unwrap(), &mut buf).unwrap();

        let rows = CsvSeedSource::read_rows(buf.as_slice()).unwrap();
        let reseeded = InventoryLedger::from_seed(LedgerId::new(), rows);
        let (a, b) = (&ledger.records()[0], &reseeded.records()[0]);
        assert_eq!(a.id, b.id);
        assert_eq!(a.item_name, b.item_name);
        assert_eq!(a.quantity, b.quantity);
        assert_eq!(a.expiration, b.expiration);
        assert_eq!(a.minimum_stock_level, b.minimum_stock_level);
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let export = ExportTables::from_ledger(&InventoryLedger::new(LedgerId::new()));
        let mut buf = Vec::new();
        write_table_csv(export.table("Order_Log").unwrap(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("timestamp,catalog_number"));
    }

    #[test]
    fn json_export_serializes_every_table() {
        let export = ExportTables::from_ledger(&ledger());
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["tables"].as_array().unwrap().len(), 4);
        assert_eq!(value["tables"][1]["name"], "Update_Log");
    }

    #[test]
    fn csv_directory_sink_writes_one_file_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let sink = CsvDirectorySink::new(&target);

        let written = sink.write(&ExportTables::from_ledger(&ledger())).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["Inventory.csv", "Update_Log.csv", "Location_Audit_Log.csv", "Order_Log.csv"]
        );
        assert!(written.iter().all(|p| p.starts_with(&target) && p.exists()));

        let update_log = std::fs::read_to_string(target.join("Update_Log.csv")).unwrap();
        assert_eq!(update_log.lines().count(), 2);
        assert!(update_log.lines().nth(1).unwrap().contains(",Add,2,MR,L1,2025-01-01"));
    }

    #[test]
    fn csv_directory_sink_overwrites_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvDirectorySink::new(dir.path());
        sink.write(&ExportTables::from_ledger(&ledger())).unwrap();
        sink.write(&ExportTables::from_ledger(&InventoryLedger::new(LedgerId::new())))
            .unwrap();

        let inventory = std::fs::read_to_string(dir.path().join("Inventory.csv")).unwrap();
        assert_eq!(inventory.lines().count(), 1);
    }

    #[test]
    fn history_round_trips_through_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvDirectorySink::new(dir.path());
        assert!(sink.read_history().unwrap().is_empty());

        let ledger = ledger();
        sink.write(&ExportTables::from_ledger(&ledger)).unwrap();
        let history = sink.read_history().unwrap();

        assert_eq!(history.updates.len(), 1);
        assert_eq!(&history.updates[0], ledger.update_log().last().unwrap());
        assert!(history.locations.is_empty() && history.orders.is_empty());
    }

    #[test]
    fn malformed_history_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Update_Log.csv"),
            "timestamp,catalog_number,item,action,quantity\nyesterday,ABC100,Agarose,Add,1\n",
        )
        .unwrap();
        let err = CsvDirectorySink::new(dir.path()).read_history().unwrap_err();
        assert!(matches!(err, ExportError::History(_)));
    }

    #[test]
    fn json_file_sink_writes_a_single_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let export = ExportTables::from_ledger(&ledger());
        let written = JsonFileSink::new(&path).write(&export).unwrap();

        assert_eq!(written, vec![path.clone()]);
        let decoded: ExportTables = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(decoded, export);
    }
}
