//! CSV Data Loader Module
//! Handles CSV loading and writing using Polars, and holds the tables a report run reads.

use crate::data::cleaner::DataCleaner;
use crate::data::schema::{SchemaError, Table};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Field values read as null in every column.
pub const NULL_TOKENS: [&str; 5] = ["NULL", "null", "NaN", "nan", "None"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A report asked for a table that did not load.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("required table {0} is not loaded")]
pub struct MissingTable(pub Table);

/// Read a CSV file into a DataFrame. Every column is read as text;
/// [`Table::conform`] does the typed conversion.
pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(0))
        .with_null_values(Some(null_values))
        .finish()?
        .collect()?;

    Ok(df)
}

/// Read a CSV file and conform it to the table's schema.
pub fn load_table(table: Table, path: &Path) -> Result<DataFrame, LoaderError> {
    let df = read_csv(path)?;
    Ok(table.conform(df)?)
}

/// Write a DataFrame as CSV with a header row. Null values are written as empty fields.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), LoaderError> {
    let mut file = File::create(path).map_err(|source| LoaderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// The loaded tables of one report run. Tables that failed to load are absent.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    frames: BTreeMap<Table, DataFrame>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every cleaned table found in `dir`.
    ///
    /// A missing or invalid table is logged and left out; reports that need it fail on their own.
    /// `total_price` is derived again from quantity, list price and discount.
    pub fn load_cleaned(dir: &Path) -> Self {
        let mut tables = Self::new();
        for table in Table::ALL {
            let path = table.cleaned_path(dir);
            let loaded = load_table(table, &path).and_then(|df| match table {
                Table::OrderItems => Ok(DataCleaner::with_total_price(df)?),
                _ => Ok(df),
            });
            match loaded {
                Ok(df) => {
                    info!("Loaded {} ({} rows)", path.display(), df.height());
                    tables.insert(table, df);
                }
                Err(e) => warn!("Skipping {}: {}", table, e),
            }
        }
        tables
    }

    pub fn insert(&mut self, table: Table, df: DataFrame) {
        self.frames.insert(table, df);
    }

    pub fn get(&self, table: Table) -> Option<&DataFrame> {
        self.frames.get(&table)
    }

    /// Get a table a report cannot run without.
    pub fn require(&self, table: Table) -> Result<&DataFrame, MissingTable> {
        self.get(table).ok_or(MissingTable(table))
    }

    /// Number of tables loaded.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
