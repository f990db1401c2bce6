//! Infrastructure adapters: where seed rows come from and where exports go.
//!
//! The inventory crate never touches files; everything here is a thin
//! adapter around `csv`/`serde_json` behind a small trait.

pub mod export_sink;
pub mod seed_source;

pub use export_sink::{
    CsvDirectorySink, ExportError, ExportSink, JsonFileSink, read_table_csv, write_table_csv,
};
pub use seed_source::{CsvSeedSource, InMemorySeedSource, SeedError, SeedLoad, SeedSource, load_ledger};
