//! Reports module - join/aggregate computations over the cleaned tables
//!
//! Every report is a pure function of [`Tables`]; the engine writes each
//! result as `analysis_<name>.csv` and keeps going when one report fails.

pub mod customers;
pub mod orders;
pub mod sales;
pub mod stock;
pub mod trends;

use crate::charts::ChartRenderer;
use crate::config::PipelineConfig;
use crate::data::{write_csv, LoaderError, MissingTable, Tables};
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Prefix of every report file.
pub const ANALYSIS_PREFIX: &str = "analysis_";

pub const TOP_BRANDS: &str = "top_brands";
pub const STAFF_PERFORMANCE: &str = "staff_performance";
pub const ORDER_STATUS_SUMMARY: &str = "order_status_summary";
pub const UNFULFILLED_ORDERS: &str = "unfulfilled_orders";
pub const DELAYED_SHIPMENTS: &str = "delayed_shipments";
pub const CATEGORY_PROFITABILITY: &str = "category_profitability";
pub const OUT_OF_STOCK: &str = "out_of_stock_products";
pub const LOW_STOCK: &str = "low_stock_products";
pub const MONTHLY_SALES: &str = "monthly_sales_trend";
pub const WEEKLY_SALES: &str = "weekly_sales_trend";
pub const CUSTOMERS_BY_STATE: &str = "customer_concentration_state";
pub const CUSTOMERS_BY_CITY: &str = "customer_concentration_city";
pub const TOP_CUSTOMERS: &str = "top_customers";

/// Rows shown on the console for the long listings.
pub const PREVIEW_ROWS: usize = 20;
/// Rows shown for the city concentration listing.
pub const TOP_CITY_ROWS: usize = 10;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    MissingTable(#[from] MissingTable),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One report table ready to be persisted.
#[derive(Debug, Clone)]
pub struct Report {
    pub name: &'static str,
    pub frame: DataFrame,
}

impl Report {
    pub fn new(name: &'static str, frame: DataFrame) -> Self {
        Self { name, frame }
    }

    pub fn file_name(&self) -> String {
        format!("{}{}.csv", ANALYSIS_PREFIX, self.name)
    }
}

/// What one engine run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
    pub charts: Vec<PathBuf>,
}

/// Runs every report against one set of loaded tables.
pub struct ReportEngine<'a> {
    tables: &'a Tables,
    config: &'a PipelineConfig,
}

impl<'a> ReportEngine<'a> {
    pub fn new(tables: &'a Tables, config: &'a PipelineConfig) -> Self {
        Self { tables, config }
    }

    /// Compute, print and persist all reports, then render the charts.
    ///
    /// A failing report is logged and recorded; only a failed write stops the run.
    pub fn run(&self) -> Result<RunSummary, LoaderError> {
        let mut summary = RunSummary::default();
        let mut produced: Vec<Report> = Vec::new();

        let steps: [(&str, fn(&Self) -> Result<Vec<Report>, ReportError>); 9] = [
            ("Top-Selling Brands by Region and Store", Self::top_brands),
            ("Staff Performance", Self::staff_performance),
            ("Order Status", Self::order_status),
            ("Delayed Shipments", Self::delayed_shipments),
            ("Category Profitability", Self::category_profitability),
            ("Stock Levels", Self::stock_levels),
            ("Sales Trends", Self::sales_trends),
            ("Customer Concentration", Self::customer_concentration),
            ("Top Customers", Self::top_customers),
        ];

        for (label, step) in steps {
            match step(self) {
                Ok(reports) => {
                    for mut report in reports {
                        let path = self.config.output_dir().join(report.file_name());
                        write_csv(&mut report.frame, &path)?;
                        info!("Saved {} ({} rows)", path.display(), report.frame.height());
                        summary.written.push(path);
                        produced.push(report);
                    }
                }
                Err(e) => {
                    error!("{} report failed: {}", label, e);
                    summary.failed.push((label.to_string(), e.to_string()));
                }
            }
        }

        if self.config.render_charts {
            summary.charts = self.render_charts(&produced);
        }

        info!(
            "Analysis complete: {} report files, {} failed reports, {} charts",
            summary.written.len(),
            summary.failed.len(),
            summary.charts.len()
        );
        Ok(summary)
    }

    fn top_brands(&self) -> Result<Vec<Report>, ReportError> {
        let frame = sales::top_brands(self.tables)?;
        print_section("Top-Selling Brands by Region and Store", &frame);
        Ok(vec![Report::new(TOP_BRANDS, frame)])
    }

    fn staff_performance(&self) -> Result<Vec<Report>, ReportError> {
        let frame = sales::staff_performance(self.tables)?;
        print_section("Staff Performance by Total Sales", &frame);
        Ok(vec![Report::new(STAFF_PERFORMANCE, frame)])
    }

    fn order_status(&self) -> Result<Vec<Report>, ReportError> {
        let summary = orders::status_summary(self.tables)?;
        print_section("Order Status Summary", &summary);
        let unfulfilled = orders::unfulfilled_orders(self.tables)?;
        println!("Found {} unfulfilled orders", unfulfilled.height());
        Ok(vec![
            Report::new(ORDER_STATUS_SUMMARY, summary),
            Report::new(UNFULFILLED_ORDERS, unfulfilled),
        ])
    }

    fn delayed_shipments(&self) -> Result<Vec<Report>, ReportError> {
        let delayed = orders::delayed_shipments(self.tables)?;
        println!("\n--- Result: Delayed Shipments ---");
        println!("Total Shipped Orders: {}", delayed.shipped_count);
        match delayed.delay_percentage() {
            Some(pct) => println!("Delayed Shipments: {} ({:.2}%)", delayed.delayed_count(), pct),
            None => println!("Delayed Shipments: {} (n/a)", delayed.delayed_count()),
        }
        Ok(vec![Report::new(DELAYED_SHIPMENTS, delayed.frame)])
    }

    fn category_profitability(&self) -> Result<Vec<Report>, ReportError> {
        let frame = sales::category_profitability(self.tables)?;
        print_section("Most Profitable Product Categories", &frame);
        Ok(vec![Report::new(CATEGORY_PROFITABILITY, frame)])
    }

    fn stock_levels(&self) -> Result<Vec<Report>, ReportError> {
        let threshold = self.config.low_stock_threshold;
        let levels = stock::stock_levels(self.tables, threshold)?;

        println!("\n--- Result: Out-of-Stock Products ---");
        println!("Found {} product(s) that are out of stock.", levels.out_of_stock.height());
        println!("{}", stock::display_columns(&levels.out_of_stock)?);

        println!("\n--- Result: Low-Stock Products (Less than {} units) ---", threshold);
        println!("Found {} product(s) with low stock.", levels.low_stock.height());
        println!(
            "{}",
            stock::display_columns(&levels.low_stock)?.head(Some(PREVIEW_ROWS))
        );

        Ok(vec![
            Report::new(OUT_OF_STOCK, levels.out_of_stock),
            Report::new(LOW_STOCK, levels.low_stock),
        ])
    }

    fn sales_trends(&self) -> Result<Vec<Report>, ReportError> {
        let trends = trends::sales_trends(self.tables)?;
        print_section("Monthly Sales Trend (first 5 rows)", &trends.monthly.head(Some(5)));
        print_section("Weekly Sales Trend (first 5 rows)", &trends.weekly.head(Some(5)));
        Ok(vec![
            Report::new(MONTHLY_SALES, trends.monthly),
            Report::new(WEEKLY_SALES, trends.weekly),
        ])
    }

    fn customer_concentration(&self) -> Result<Vec<Report>, ReportError> {
        let by_state = customers::by_state(self.tables)?;
        print_section("Customer Concentration by State", &by_state);
        let by_city = customers::by_city(self.tables)?;
        print_section(
            "Customer Concentration by City (Top 10)",
            &by_city.head(Some(TOP_CITY_ROWS)),
        );
        Ok(vec![
            Report::new(CUSTOMERS_BY_STATE, by_state),
            Report::new(CUSTOMERS_BY_CITY, by_city),
        ])
    }

    fn top_customers(&self) -> Result<Vec<Report>, ReportError> {
        let frame = customers::top_customers(self.tables)?;
        print_section(
            "Top 20 Customers by Sales",
            &customers::display_columns(&frame)?.head(Some(PREVIEW_ROWS)),
        );
        Ok(vec![Report::new(TOP_CUSTOMERS, frame)])
    }

    /// Render the charts whose source reports were produced.
    fn render_charts(&self, produced: &[Report]) -> Vec<PathBuf> {
        let find = |name: &str| produced.iter().find(|r| r.name == name).map(|r| &r.frame);
        let renderer = ChartRenderer::new(
            self.config.output_dir(),
            self.config.chart_width,
            self.config.chart_height,
        );

        let mut written = Vec::new();
        let attempts = [
            (MONTHLY_SALES, find(MONTHLY_SALES).map(|f| renderer.monthly_sales(f))),
            (WEEKLY_SALES, find(WEEKLY_SALES).map(|f| renderer.weekly_sales(f))),
            (
                CUSTOMERS_BY_STATE,
                find(CUSTOMERS_BY_STATE).map(|f| renderer.customers_by_state(f)),
            ),
        ];
        for (source, attempt) in attempts {
            match attempt {
                Some(Ok(path)) => {
                    info!("Saved {}", path.display());
                    written.push(path);
                }
                Some(Err(e)) => warn!("Chart for {} not rendered: {}", source, e),
                None => warn!("Chart for {} skipped: report unavailable", source),
            }
        }
        written
    }
}

fn print_section(title: &str, frame: &DataFrame) {
    println!("\n--- Result: {} ---", title);
    println!("{}", frame);
}

/// Sort key that fixes line-item order before aggregation, so float sums are reproducible.
pub(crate) fn line_item_order() -> ([Expr; 2], SortMultipleOptions) {
    (
        [col("order_id"), col("item_id")],
        SortMultipleOptions::default().with_maintain_order(true),
    )
}

/// Descending sort on one column, stable for ties, nulls last.
pub(crate) fn descending(column: &str) -> ([Expr; 1], SortMultipleOptions) {
    (
        [col(column)],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A small store chain: 2 stores, 3 products, 4 orders, 5 line items.
    //!
    //! Line-item totals are 270, 500, 400, 100 and 250 (1520 overall).

    use crate::data::{DataCleaner, Table, Tables};
    use polars::prelude::*;

    pub fn tables() -> Tables {
        let mut tables = Tables::new();
        let mut add = |table: Table, df: DataFrame| {
            let df = table.conform(df).unwrap();
            let df = match table {
                Table::OrderItems => DataCleaner::with_total_price(df).unwrap(),
                _ => df,
            };
            tables.insert(table, df);
        };

        add(
            Table::Stores,
            df!(
                "store_id" => [1i64, 2],
                "store_name" => ["Santa Cruz Bikes", "Baldwin Bikes"],
                "city" => ["Santa Cruz", "Baldwin"],
                "state" => ["CA", "NY"],
            )
            .unwrap(),
        );
        add(
            Table::Brands,
            df!("brand_id" => [1i64, 2], "brand_name" => ["Electra", "Trek"]).unwrap(),
        );
        add(
            Table::Categories,
            df!("category_id" => [1i64, 2], "category_name" => ["Cruisers", "Mountain Bikes"])
                .unwrap(),
        );
        add(
            Table::Products,
            df!(
                "product_id" => [10i64, 11, 12],
                "product_name" => ["Electra Townie 7D", "Trek Marlin 5", "Trek Fuel EX 8"],
                "brand_id" => [1i64, 2, 2],
                "category_id" => [1i64, 2, 2],
                "list_price" => [549.99f64, 489.99, 3199.99],
            )
            .unwrap(),
        );
        add(
            Table::Staffs,
            df!(
                "staff_id" => [1i64, 2],
                "first_name" => ["Fabiola", "Mireya"],
                "last_name" => ["Jackson", "Copeland"],
                "store_id" => [1i64, 2],
            )
            .unwrap(),
        );
        add(
            Table::Customers,
            df!(
                "customer_id" => [100i64, 101, 102],
                "first_name" => ["Debra", "Kasha", "Tameka"],
                "last_name" => ["Burks", "Todd", "Fisher"],
                "phone" => ["N/A", "(831) 555-5554", "N/A"],
                "city" => ["Orchard Park", "Campbell", "Orchard Park"],
                "state" => ["NY", "CA", "NY"],
            )
            .unwrap(),
        );
        add(
            Table::Orders,
            df!(
                "order_id" => [1i64, 2, 3, 4],
                "customer_id" => [100i64, 101, 100, 102],
                "order_status" => [4i64, 4, 1, 3],
                "order_date" => ["2024-01-02", "2024-01-05", "2024-02-10", "2024-03-01"],
                "required_date" => ["2024-01-05", "2024-01-10", "2024-02-12", "2024-03-04"],
                "shipped_date" => [Some("2024-01-04"), Some("2024-01-15"), None, Some("2024-03-05")],
                "store_id" => [1i64, 2, 1, 2],
                "staff_id" => [1i64, 2, 1, 2],
            )
            .unwrap(),
        );
        add(
            Table::OrderItems,
            df!(
                "order_id" => [1i64, 1, 2, 3, 4],
                "item_id" => [1i64, 2, 1, 1, 1],
                "product_id" => [10i64, 11, 12, 10, 11],
                "quantity" => [3i64, 1, 2, 1, 1],
                "list_price" => [100.0f64, 500.0, 250.0, 100.0, 500.0],
                "discount" => [0.10f64, 0.0, 0.20, 0.0, 0.50],
            )
            .unwrap(),
        );
        add(
            Table::Stocks,
            df!(
                "store_id" => [1i64, 1, 2, 2],
                "product_id" => [10i64, 11, 10, 12],
                "quantity" => [0i64, 3, 7, 1],
            )
            .unwrap(),
        );

        tables
    }

    pub fn without(table: Table) -> Tables {
        let full = tables();
        let mut partial = Tables::new();
        for t in Table::ALL {
            if t != table {
                if let Some(df) = full.get(t) {
                    partial.insert(t, df.clone());
                }
            }
        }
        partial
    }

    pub fn f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    pub fn i64_column(df: &DataFrame, name: &str) -> Vec<i64> {
        df.column(name)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    pub fn str_column(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Table;

    fn quiet_config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            input_dir: dir.to_path_buf(),
            render_charts: false,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn engine_writes_all_report_files() {
        let dir = tempfile::tempdir().unwrap();
        let tables = fixtures::tables();
        let config = quiet_config(dir.path());

        let summary = ReportEngine::new(&tables, &config).run().unwrap();
        assert!(summary.failed.is_empty());
        assert_eq!(summary.written.len(), 13);
        for name in [TOP_BRANDS, DELAYED_SHIPMENTS, WEEKLY_SALES, TOP_CUSTOMERS] {
            let path = dir.path().join(format!("analysis_{}.csv", name));
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn engine_isolates_report_with_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let tables = fixtures::without(Table::Brands);
        let config = quiet_config(dir.path());

        let summary = ReportEngine::new(&tables, &config).run().unwrap();
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].1.contains("brands.csv"));
        assert_eq!(summary.written.len(), 12);
        assert!(!dir.path().join("analysis_top_brands.csv").exists());
    }

    #[test]
    fn empty_result_is_written_as_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = fixtures::tables();
        let stocks = tables.get(Table::Stocks).unwrap().clone();
        let restocked = stocks
            .lazy()
            .with_column(lit(50i64).alias("quantity"))
            .collect()
            .unwrap();
        tables.insert(Table::Stocks, restocked);
        let config = quiet_config(dir.path());

        ReportEngine::new(&tables, &config).run().unwrap();
        let text =
            std::fs::read_to_string(dir.path().join("analysis_out_of_stock_products.csv")).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("store_id,product_id,quantity"));
    }
}
