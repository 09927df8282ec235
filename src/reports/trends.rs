//! Sales trends bucketed by calendar month and by week.
//!
//! Month buckets are labelled with the last day of the month. Week buckets
//! run Monday through Sunday and are labelled with the Sunday. Buckets with no
//! sales between the first and the last sale are kept with zero totals.

use crate::data::{Table, Tables};
use crate::reports::{line_item_order, ReportError};
use chrono::{Datelike, Days, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;

/// `num_days_from_ce` of 1970-01-01, the epoch of polars dates.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Month,
    Week,
}

impl Bucket {
    /// Label of the bucket containing `date`.
    pub fn label(self, date: NaiveDate) -> NaiveDate {
        match self {
            Bucket::Month => month_end(date),
            Bucket::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(to_sunday as u64))
                    .unwrap_or(date)
            }
        }
    }

    /// Label of the bucket after the one labelled `label`.
    fn next(self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Bucket::Month => label.succ_opt().map(month_end),
            Bucket::Week => label.checked_add_days(Days::new(7)),
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

pub(crate) fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

#[derive(Debug, Clone)]
pub struct SalesTrends {
    pub monthly: DataFrame,
    pub weekly: DataFrame,
}

/// Every line item's order date and price. Items without a date are dropped.
pub fn sales_points(tables: &Tables) -> Result<Vec<(NaiveDate, Option<f64>)>, ReportError> {
    let orders = tables
        .require(Table::Orders)?
        .clone()
        .lazy()
        .select([col("order_id"), col("order_date")]);

    let (by, options) = line_item_order();
    let joined = tables
        .require(Table::OrderItems)?
        .clone()
        .lazy()
        .select([col("order_id"), col("item_id"), col("total_price")])
        .inner_join(orders, col("order_id"), col("order_id"))
        .sort_by_exprs(by, options)
        .select([col("order_date"), col("total_price")])
        .collect()?;

    let days = joined.column("order_date")?.cast(&DataType::Int32)?;
    let prices = joined.column("total_price")?.cast(&DataType::Float64)?;

    let points = days
        .i32()?
        .into_iter()
        .zip(prices.f64()?.into_iter())
        .filter_map(|(day, price)| Some((from_epoch_days(day?)?, price)))
        .collect();

    Ok(points)
}

/// Sum and count prices per bucket, zero-filling the gaps.
///
/// Output columns: `order_date` (bucket label), `total_sales`, `order_count`.
pub fn resample(points: &[(NaiveDate, Option<f64>)], bucket: Bucket) -> PolarsResult<DataFrame> {
    let mut totals: BTreeMap<NaiveDate, (f64, i64)> = BTreeMap::new();
    for &(date, price) in points {
        let entry = totals.entry(bucket.label(date)).or_insert((0.0, 0));
        if let Some(price) = price {
            entry.0 += price;
            entry.1 += 1;
        }
    }

    let mut labels: Vec<i32> = Vec::new();
    let mut sales: Vec<f64> = Vec::new();
    let mut counts: Vec<i64> = Vec::new();

    if let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) {
        let mut cursor = Some(first);
        while let Some(label) = cursor.filter(|l| *l <= last) {
            let (total, count) = totals.get(&label).copied().unwrap_or((0.0, 0));
            labels.push(to_epoch_days(label));
            sales.push(total);
            counts.push(count);
            cursor = bucket.next(label);
        }
    }

    let order_date = Column::new("order_date".into(), labels).cast(&DataType::Date)?;
    DataFrame::new(vec![
        order_date,
        Column::new("total_sales".into(), sales),
        Column::new("order_count".into(), counts),
    ])
}

pub fn sales_trends(tables: &Tables) -> Result<SalesTrends, ReportError> {
    let points = sales_points(tables)?;
    Ok(SalesTrends {
        monthly: resample(&points, Bucket::Month)?,
        weekly: resample(&points, Bucket::Week)?,
    })
}
