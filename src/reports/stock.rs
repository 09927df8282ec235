//! Stock level reports across stores.

use crate::data::{Table, Tables};
use crate::reports::ReportError;
use polars::prelude::*;

/// Quantities strictly below this (and above zero) are low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone)]
pub struct StockLevels {
    /// Rows with quantity 0.
    pub out_of_stock: DataFrame,
    /// Rows with 0 < quantity < threshold, lowest first.
    pub low_stock: DataFrame,
}

/// Join stock with products and stores, then split out empty and low shelves.
pub fn stock_levels(tables: &Tables, threshold: i64) -> Result<StockLevels, ReportError> {
    let products = tables.require(Table::Products)?.clone().lazy();
    let stores = tables.require(Table::Stores)?.clone().lazy();

    let levels = tables
        .require(Table::Stocks)?
        .clone()
        .lazy()
        .inner_join(products, col("product_id"), col("product_id"))
        .inner_join(stores, col("store_id"), col("store_id"))
        .sort_by_exprs(
            [col("store_id"), col("product_id")],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    let out_of_stock = levels
        .clone()
        .lazy()
        .filter(col("quantity").eq(lit(0i64)))
        .collect()?;

    let low_stock = levels
        .lazy()
        .filter(
            col("quantity")
                .gt(lit(0i64))
                .and(col("quantity").lt(lit(threshold))),
        )
        .sort_by_exprs(
            [col("quantity")],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    Ok(StockLevels {
        out_of_stock,
        low_stock,
    })
}

/// The columns shown on the console for a stock listing.
pub fn display_columns(frame: &DataFrame) -> PolarsResult<DataFrame> {
    frame.select(["store_name", "product_name", "quantity"])
}
