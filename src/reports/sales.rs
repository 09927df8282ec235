//! Sales reports: brands per store, staff performance, category profitability.

use crate::data::{Table, Tables};
use crate::reports::{descending, line_item_order, ReportError};
use polars::prelude::*;

/// Line items with their price.
fn line_items(tables: &Tables) -> Result<LazyFrame, ReportError> {
    Ok(tables
        .require(Table::OrderItems)?
        .clone()
        .lazy()
        .select([
            col("order_id"),
            col("item_id"),
            col("product_id"),
            col("total_price"),
        ]))
}

/// Sales per (state, store, brand): state and store ascending, amount descending.
pub fn top_brands(tables: &Tables) -> Result<DataFrame, ReportError> {
    let products = tables
        .require(Table::Products)?
        .clone()
        .lazy()
        .select([col("product_id"), col("brand_id")]);
    let brands = tables
        .require(Table::Brands)?
        .clone()
        .lazy()
        .select([col("brand_id"), col("brand_name")]);
    let orders = tables
        .require(Table::Orders)?
        .clone()
        .lazy()
        .select([col("order_id"), col("store_id")]);
    let stores = tables
        .require(Table::Stores)?
        .clone()
        .lazy()
        .select([col("store_id"), col("store_name"), col("state")]);

    let (item_order, item_options) = line_item_order();
    let frame = line_items(tables)?
        .inner_join(products, col("product_id"), col("product_id"))
        .inner_join(brands, col("brand_id"), col("brand_id"))
        .inner_join(orders, col("order_id"), col("order_id"))
        .inner_join(stores, col("store_id"), col("store_id"))
        .sort_by_exprs(item_order.clone(), item_options.clone())
        .group_by_stable([col("state"), col("store_name"), col("brand_name")])
        .agg([col("total_price").sum()])
        .sort_by_exprs(
            [col("state"), col("store_name"), col("total_price")],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, false, true])
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(frame)
}

/// Total sales and distinct orders per staff member, best first.
pub fn staff_performance(tables: &Tables) -> Result<DataFrame, ReportError> {
    let orders = tables
        .require(Table::Orders)?
        .clone()
        .lazy()
        .select([col("order_id"), col("staff_id")]);
    let staffs = tables
        .require(Table::Staffs)?
        .clone()
        .lazy()
        .select([col("staff_id"), col("first_name"), col("last_name")]);

    let (by, options) = descending("total_sales");
    let (item_order, item_options) = line_item_order();
    let frame = line_items(tables)?
        .inner_join(orders, col("order_id"), col("order_id"))
        .inner_join(staffs, col("staff_id"), col("staff_id"))
        .sort_by_exprs(item_order.clone(), item_options.clone())
        .group_by_stable([col("staff_id"), col("first_name"), col("last_name")])
        .agg([
            col("total_price").sum().alias("total_sales"),
            col("order_id")
                .n_unique()
                .cast(DataType::Int64)
                .alias("total_orders"),
        ])
        .sort_by_exprs(by, options)
        .collect()?;

    Ok(frame)
}

/// Total sales per product category, most profitable first.
pub fn category_profitability(tables: &Tables) -> Result<DataFrame, ReportError> {
    let products = tables
        .require(Table::Products)?
        .clone()
        .lazy()
        .select([col("product_id"), col("category_id")]);
    let categories = tables
        .require(Table::Categories)?
        .clone()
        .lazy()
        .select([col("category_id"), col("category_name")]);

    let (by, options) = descending("total_sales");
    let (item_order, item_options) = line_item_order();
    let frame = line_items(tables)?
        .inner_join(products, col("product_id"), col("product_id"))
        .inner_join(categories, col("category_id"), col("category_id"))
        .sort_by_exprs(item_order.clone(), item_options.clone())
        .group_by_stable([col("category_name")])
        .agg([col("total_price").sum().alias("total_sales")])
        .sort_by_exprs(by, options)
        .collect()?;

    Ok(frame)
}
