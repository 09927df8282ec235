//! Data module - table schema, CSV loading and cleaning

pub mod cleaner;
pub mod loader;
pub mod schema;

pub use cleaner::{CleanSummary, DataCleaner, PHONE_SENTINEL};
pub use loader::{load_table, read_csv, write_csv, LoaderError, MissingTable, Tables};
pub use schema::{ColumnKind, SchemaError, Table};
