//! Customer concentration by geography and customer value.

use crate::data::{Table, Tables};
use crate::reports::{descending, line_item_order, ReportError};
use polars::prelude::*;

/// Number of customers per value of `key`, most common first. Nulls are not counted.
pub fn concentration(customers: &DataFrame, key: &str) -> PolarsResult<DataFrame> {
    let (by, options) = descending("customer_count");
    customers
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg([len().cast(DataType::Int64).alias("customer_count")])
        .sort_by_exprs(by, options)
        .collect()
}

pub fn by_state(tables: &Tables) -> Result<DataFrame, ReportError> {
    Ok(concentration(tables.require(Table::Customers)?, "state")?)
}

pub fn by_city(tables: &Tables) -> Result<DataFrame, ReportError> {
    Ok(concentration(tables.require(Table::Customers)?, "city")?)
}

/// Sales and distinct orders per customer, joined back to the customer record, best first.
/// Equal totals are ordered by customer id.
pub fn top_customers(tables: &Tables) -> Result<DataFrame, ReportError> {
    let orders = tables
        .require(Table::Orders)?
        .clone()
        .lazy()
        .select([col("order_id"), col("customer_id")]);
    let customers = tables.require(Table::Customers)?.clone().lazy();

    let (item_order, item_options) = line_item_order();
    let frame = tables
        .require(Table::OrderItems)?
        .clone()
        .lazy()
        .select([col("order_id"), col("item_id"), col("total_price")])
        .inner_join(orders, col("order_id"), col("order_id"))
        .sort_by_exprs(item_order, item_options)
        .group_by_stable([col("customer_id")])
        .agg([
            col("total_price").sum().alias("total_sales"),
            col("order_id")
                .n_unique()
                .cast(DataType::Int64)
                .alias("total_orders"),
        ])
        .inner_join(customers, col("customer_id"), col("customer_id"))
        .sort_by_exprs(
            [col("total_sales"), col("customer_id")],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(frame)
}

/// The columns shown on the console for the top-customer listing.
pub fn display_columns(frame: &DataFrame) -> PolarsResult<DataFrame> {
    frame.select([
        "first_name",
        "last_name",
        "city",
        "state",
        "total_sales",
        "total_orders",
    ])
}
