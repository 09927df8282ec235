//! Data Cleaner Module
//! Applies the per-table fixes to the raw extracts and writes the cleaned copies.

use crate::data::loader::{load_table, write_csv, LoaderError};
use crate::data::schema::Table;
use polars::prelude::*;
use std::path::Path;
use tracing::{error, info, warn};

/// Written in place of a missing customer phone number.
pub const PHONE_SENTINEL: &str = "N/A";

/// Outcome of one cleaning pass.
#[derive(Debug, Default, Clone)]
pub struct CleanSummary {
    pub cleaned: Vec<Table>,
    pub missing: Vec<Table>,
    pub failed: Vec<(Table, String)>,
    pub phones_filled: usize,
}

/// Handles the per-table cleaning and derivation steps.
pub struct DataCleaner;

impl DataCleaner {
    /// `quantity × list_price × (1 − discount)`. Discounts above 1 are not clamped.
    pub fn total_price_expr() -> Expr {
        (col("quantity").cast(DataType::Float64)
            * col("list_price")
            * (lit(1.0) - col("discount")))
        .alias("total_price")
    }

    /// Add (or replace) the derived `total_price` column.
    pub fn with_total_price(df: DataFrame) -> PolarsResult<DataFrame> {
        df.lazy().with_column(Self::total_price_expr()).collect()
    }

    /// Replace missing phone numbers with [`PHONE_SENTINEL`], returning how many were replaced.
    pub fn fill_missing_phones(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
        let missing = df.column("phone")?.null_count();
        let filled = df
            .lazy()
            .with_column(
                col("phone")
                    .cast(DataType::String)
                    .fill_null(lit(PHONE_SENTINEL)),
            )
            .collect()?;
        Ok((filled, missing))
    }

    /// Apply the fixes for one conformed table.
    ///
    /// Returns the cleaned frame and, for customers, the number of phones filled.
    /// Order dates are already parsed when the table is conformed.
    pub fn clean_table(table: Table, df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
        match table {
            Table::Customers => {
                let (df, filled) = Self::fill_missing_phones(df)?;
                info!("[Cleaned {}] Filled {} null values in 'phone' column.", table, filled);
                Ok((df, filled))
            }
            Table::Orders => {
                let unshipped = df.column("shipped_date")?.null_count();
                info!(
                    "[Cleaned {}] Parsed order_date, required_date, shipped_date as dates ({} without shipped_date).",
                    table, unshipped
                );
                Ok((df, 0))
            }
            Table::OrderItems => {
                let df = Self::with_total_price(df)?;
                info!("[Transformed {}] Created 'total_price' column.", table);
                Ok((df, 0))
            }
            _ => Ok((df, 0)),
        }
    }

    /// Clean every raw table found in `input_dir` and write the results to `output_dir`.
    ///
    /// Absent or invalid tables are skipped. Only a write failure stops the pass.
    pub fn run(input_dir: &Path, output_dir: &Path) -> Result<CleanSummary, LoaderError> {
        let mut summary = CleanSummary::default();

        for table in Table::ALL {
            let raw_path = table.raw_path(input_dir);
            if !raw_path.exists() {
                warn!("{} not found in {}", table, input_dir.display());
                summary.missing.push(table);
                continue;
            }

            let cleaned = load_table(table, &raw_path)
                .and_then(|df| Ok(Self::clean_table(table, df)?));
            let (mut df, filled) = match cleaned {
                Ok(result) => result,
                Err(e) => {
                    error!("Failed to clean {}: {}", table, e);
                    summary.failed.push((table, e.to_string()));
                    continue;
                }
            };

            let out_path = table.cleaned_path(output_dir);
            write_csv(&mut df, &out_path)?;
            info!("Saved {} ({} rows)", out_path.display(), df.height());

            summary.phones_filled += filled;
            summary.cleaned.push(table);
        }

        info!(
            "Cleaning complete: {} cleaned, {} missing, {} failed",
            summary.cleaned.len(),
            summary.missing.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn total_price_matches_formula() {
        let df = df!(
            "order_id" => [1i64, 1, 2],
            "item_id" => [1i64, 2, 1],
            "product_id" => [10i64, 11, 12],
            "quantity" => [3i64, 2, 1],
            "list_price" => [100.0f64, 49.99, 10.0],
            "discount" => [0.10f64, 0.0, 1.5],
        )
        .unwrap();

        let df = DataCleaner::with_total_price(df).unwrap();
        let prices: Vec<f64> = df
            .column("total_price")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();

        assert_eq!(prices[0], 270.0);
        assert_eq!(prices[1], 2.0 * 49.99 * (1.0 - 0.0));
        // discount above 1 passes through as a negative price
        assert_eq!(prices[2], -5.0);
    }

    #[test]
    fn total_price_replaces_input_column() {
        let df = df!(
            "quantity" => [2i64],
            "list_price" => [10.0f64],
            "discount" => [0.5f64],
            "total_price" => [999.0f64],
        )
        .unwrap();
        let df = DataCleaner::with_total_price(df).unwrap();
        let price = df.column("total_price").unwrap().f64().unwrap().get(0);
        assert_eq!(price, Some(10.0));
    }

    #[test]
    fn missing_phones_become_sentinel() {
        let df = df!(
            "customer_id" => [1i64, 2, 3],
            "phone" => [None, Some("(831) 555-5554"), None],
        )
        .unwrap();

        let (df, filled) = DataCleaner::fill_missing_phones(df).unwrap();
        assert_eq!(filled, 2);

        let phone = df.column("phone").unwrap();
        assert_eq!(phone.null_count(), 0);
        let values: Vec<&str> = phone.str().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec!["N/A", "(831) 555-5554", "N/A"]);
    }

    #[test]
    fn run_cleans_present_tables_and_skips_missing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("customers.csv"),
            "customer_id,first_name,last_name,phone,email,street,city,state,zip_code\n\
             1,Debra,Burks,NULL,debra@example.com,9273 Thorne Ave,Orchard Park,NY,14127\n\
             2,Kasha,Todd,,kasha@example.com,910 Vine St,Campbell,CA,95008\n\
             3,Tameka,Fisher,(831) 555-5554,tameka@example.com,769 Ave,Redondo Beach,CA,90278\n",
        )
        .unwrap();
        fs::write(
            input.path().join("order_items.csv"),
            "order_id,item_id,product_id,quantity,list_price,discount\n1,1,20,3,100.00,0.10\n",
        )
        .unwrap();

        let summary = DataCleaner::run(input.path(), output.path()).unwrap();
        assert_eq!(summary.cleaned, vec![Table::Customers, Table::OrderItems]);
        assert_eq!(summary.missing.len(), 7);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.phones_filled, 2);

        let customers = fs::read_to_string(output.path().join("cleaned_customers.csv")).unwrap();
        assert_eq!(customers.matches("N/A").count(), 2);

        let items = load_table(
            Table::OrderItems,
            &Table::OrderItems.cleaned_path(output.path()),
        )
        .unwrap();
        let price = items.column("total_price").unwrap().f64().unwrap().get(0);
        assert_eq!(price, Some(270.0));
    }

    #[test]
    fn run_with_no_inputs_reports_zero_successes() {
        let input = tempfile::tempdir().unwrap();
        let summary = DataCleaner::run(input.path(), input.path()).unwrap();
        assert!(summary.cleaned.is_empty());
        assert_eq!(summary.missing.len(), 9);
    }
}
