use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use labstock_core::LedgerId;
use labstock_inventory::{InventoryLedger, SeedRow};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seed row {row}: {source}")]
    Csv {
        row: u64,
        #[source]
        source: csv::Error,
    },
}

/// Outcome of loading a seed table.
///
/// A missing seed is an expected condition (fresh lab, empty inventory), not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedLoad {
    Loaded(Vec<SeedRow>),
    Missing,
}

impl SeedLoad {
    pub fn into_rows(self) -> Vec<SeedRow> {
        match self {
            SeedLoad::Loaded(rows) => rows,
            SeedLoad::Missing => Vec::new(),
        }
    }
}

/// Source of seed rows for a ledger.
pub trait SeedSource {
    fn load(&self) -> Result<SeedLoad, SeedError>;
}

/// Build a normalized ledger from a seed source.
pub fn load_ledger(source: &dyn SeedSource) -> Result<InventoryLedger, SeedError> {
    let load = source.load()?;
    if load == SeedLoad::Missing {
        tracing::warn!("no seed found; starting with an empty inventory");
    }
    let mut ledger = InventoryLedger::from_seed(LedgerId::new(), load.into_rows());
    let dropped = ledger.normalize();
    tracing::info!(records = ledger.records().len(), dropped, "inventory loaded");
    Ok(ledger)
}

/// Seed rows held in memory (tests, embedding applications).
#[derive(Debug, Clone, Default)]
pub struct InMemorySeedSource {
    rows: Option<Vec<SeedRow>>,
}

impl InMemorySeedSource {
    pub fn new(rows: Vec<SeedRow>) -> Self {
        Self { rows: Some(rows) }
    }

    pub fn missing() -> Self {
        Self { rows: None }
    }
}

impl SeedSource for InMemorySeedSource {
    fn load(&self) -> Result<SeedLoad, SeedError> {
        Ok(match &self.rows {
            Some(rows) => SeedLoad::Loaded(rows.clone()),
            None => SeedLoad::Missing,
        })
    }
}

/// CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSeedSource {
    path: PathBuf,
}

impl CsvSeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse seed rows from any reader.
    pub fn read_rows<R: Read>(reader: R) -> Result<Vec<SeedRow>, SeedError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, result) in csv_reader.deserialize::<SeedRow>().enumerate() {
            let row = result.map_err(|source| SeedError::Csv {
                row: idx as u64 + 1,
                source,
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

impl SeedSource for CsvSeedSource {
    fn load(&self) -> Result<SeedLoad, SeedError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SeedLoad::Missing),
            Err(source) => {
                return Err(SeedError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let rows = Self::read_rows(file)?;
        tracing::info!(path = %self.path.display(), rows = rows.len(), "read seed file");
        Ok(SeedLoad::Loaded(rows))
    }
}
