//! Order fulfillment reports: status summary, unfulfilled orders, delayed shipments.

use crate::data::{Table, Tables};
use crate::reports::{descending, ReportError};
use polars::prelude::*;

/// Name given to status codes outside the known four.
pub const UNKNOWN_STATUS: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn code(self) -> i64 {
        match self {
            OrderStatus::Pending => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Delivered => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn is_fulfilled(self) -> bool {
        self == OrderStatus::Delivered
    }
}

/// Map `order_status` to its name; unmapped or null codes become [`UNKNOWN_STATUS`].
pub fn status_name_expr() -> Expr {
    OrderStatus::ALL
        .iter()
        .rev()
        .fold(lit(UNKNOWN_STATUS), |otherwise, status| {
            when(col("order_status").eq(lit(status.code())))
                .then(lit(status.name()))
                .otherwise(otherwise)
        })
        .alias("order_status_name")
}

/// Orders with an added `order_status_name` column.
fn orders_with_status(tables: &Tables) -> Result<LazyFrame, ReportError> {
    Ok(tables
        .require(Table::Orders)?
        .clone()
        .lazy()
        .with_column(status_name_expr()))
}

/// Number of orders per status name, most frequent first (ties by name).
pub fn status_summary(tables: &Tables) -> Result<DataFrame, ReportError> {
    let frame = orders_with_status(tables)?
        .group_by_stable([col("order_status_name")])
        .agg([len().cast(DataType::Int64).alias("order_count")])
        .select([
            col("order_status_name").alias("order_status"),
            col("order_count"),
        ])
        .sort_by_exprs(
            [col("order_count"), col("order_status")],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(frame)
}

/// Orders not yet delivered, oldest first.
pub fn unfulfilled_orders(tables: &Tables) -> Result<DataFrame, ReportError> {
    let open = OrderStatus::ALL
        .iter()
        .filter(|s| !s.is_fulfilled())
        .map(|s| col("order_status").eq(lit(s.code())))
        .reduce(|a, b| a.or(b))
        .unwrap_or(lit(false));

    let frame = orders_with_status(tables)?
        .filter(open)
        .sort_by_exprs(
            [col("order_date")],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(frame)
}

/// Shipments that left after their required date.
#[derive(Debug, Clone)]
pub struct DelayedShipments {
    /// Delayed orders, most delayed first.
    pub frame: DataFrame,
    /// Orders with a shipped date.
    pub shipped_count: usize,
}

impl DelayedShipments {
    pub fn delayed_count(&self) -> usize {
        self.frame.height()
    }

    /// Share of shipped orders that were delayed, in percent. `None` when nothing shipped.
    pub fn delay_percentage(&self) -> Option<f64> {
        if self.shipped_count == 0 {
            return None;
        }
        Some(self.delayed_count() as f64 / self.shipped_count as f64 * 100.0)
    }
}

pub fn delayed_shipments(tables: &Tables) -> Result<DelayedShipments, ReportError> {
    let shipped = orders_with_status(tables)?
        .filter(col("shipped_date").is_not_null())
        .with_column(col("shipped_date").gt(col("required_date")).alias("delayed"))
        .collect()?;
    let shipped_count = shipped.height();

    let (by, options) = descending("days_delayed");
    let frame = shipped
        .lazy()
        .filter(col("delayed"))
        .with_column(
            (col("shipped_date").cast(DataType::Int32) - col("required_date").cast(DataType::Int32))
                .cast(DataType::Int64)
                .alias("days_delayed"),
        )
        .sort_by_exprs(by, options)
        .collect()?;

    Ok(DelayedShipments {
        frame,
        shipped_count,
    })
}
