//! Table Schema Module
//! Names the nine retail tables, their files and the columns every report relies on.

use polars::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of the files written by the cleaning stage.
pub const CLEANED_PREFIX: &str = "cleaned_";

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: Table, column: &'static str },
    #[error("{table}: column '{column}' has no values convertible to {expected}")]
    MistypedColumn {
        table: Table,
        column: &'static str,
        expected: ColumnKind,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Logical type of a required column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Date,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Int => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
        };
        f.write_str(name)
    }
}

impl ColumnKind {
    fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }

    /// Expression converting `name` to this kind. Conversion is never strict:
    /// values that do not fit become null.
    fn coerce(self, name: &str, dtype: &DataType) -> Expr {
        match self {
            ColumnKind::Int => {
                // fractional values become NaN, which the integer cast nulls
                let value = col(name).cast(DataType::Float64);
                when(value.clone().eq(value.clone().floor()))
                    .then(value)
                    .otherwise(lit(f64::NAN))
                    .cast(DataType::Int64)
                    .alias(name)
            }
            ColumnKind::Float => col(name).cast(DataType::Float64),
            ColumnKind::Text => col(name).cast(DataType::String),
            ColumnKind::Date => match dtype {
                DataType::Date => col(name),
                DataType::Datetime(_, _) => col(name).cast(DataType::Date),
                _ => parse_date(col(name).cast(DataType::String)).alias(name),
            },
        }
    }
}

/// Parse text as a calendar date, trying each of [`DATE_FORMATS`].
pub fn parse_date(text: Expr) -> Expr {
    let parse = |format: &str| {
        text.clone().str().to_date(StrptimeOptions {
            format: Some(format.into()),
            strict: false,
            ..Default::default()
        })
    };
    DATE_FORMATS[1..]
        .iter()
        .fold(parse(DATE_FORMATS[0]), |parsed, format| {
            parsed.fill_null(parse(format))
        })
}

/// The nine source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Stocks,
    Stores,
    Brands,
    Categories,
    Customers,
    OrderItems,
    Orders,
    Products,
    Staffs,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Stocks,
        Table::Stores,
        Table::Brands,
        Table::Categories,
        Table::Customers,
        Table::OrderItems,
        Table::Orders,
        Table::Products,
        Table::Staffs,
    ];

    /// File name of the raw extract.
    pub fn file_name(self) -> &'static str {
        match self {
            Table::Stocks => "stocks.csv",
            Table::Stores => "stores.csv",
            Table::Brands => "brands.csv",
            Table::Categories => "categories.csv",
            Table::Customers => "customers.csv",
            Table::OrderItems => "order_items.csv",
            Table::Orders => "orders.csv",
            Table::Products => "products.csv",
            Table::Staffs => "staffs.csv",
        }
    }

    pub fn raw_path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn cleaned_path(self, dir: &Path) -> PathBuf {
        dir.join(format!("{}{}", CLEANED_PREFIX, self.file_name()))
    }

    /// Columns the pipeline reads, with their logical types.
    pub fn columns(self) -> &'static [(&'static str, ColumnKind)] {
        use ColumnKind::*;
        match self {
            Table::Stocks => &[("store_id", Int), ("product_id", Int), ("quantity", Int)],
            Table::Stores => &[
                ("store_id", Int),
                ("store_name", Text),
                ("city", Text),
                ("state", Text),
            ],
            Table::Brands => &[("brand_id", Int), ("brand_name", Text)],
            Table::Categories => &[("category_id", Int), ("category_name", Text)],
            Table::Customers => &[
                ("customer_id", Int),
                ("first_name", Text),
                ("last_name", Text),
                ("phone", Text),
                ("city", Text),
                ("state", Text),
            ],
            Table::OrderItems => &[
                ("order_id", Int),
                ("item_id", Int),
                ("product_id", Int),
                ("quantity", Int),
                ("list_price", Float),
                ("discount", Float),
            ],
            Table::Orders => &[
                ("order_id", Int),
                ("customer_id", Int),
                ("order_status", Int),
                ("order_date", Date),
                ("required_date", Date),
                ("shipped_date", Date),
                ("store_id", Int),
                ("staff_id", Int),
            ],
            Table::Products => &[
                ("product_id", Int),
                ("product_name", Text),
                ("brand_id", Int),
                ("category_id", Int),
            ],
            Table::Staffs => &[("staff_id", Int), ("first_name", Text), ("last_name", Text)],
        }
    }

    /// Check that every required column exists and convert it to its logical type.
    ///
    /// Columns outside the schema are carried through untouched.
    pub fn conform(self, df: DataFrame) -> Result<DataFrame, SchemaError> {
        let mut exprs = Vec::with_capacity(self.columns().len());
        for &(name, kind) in self.columns() {
            let column = df
                .column(name)
                .map_err(|_| SchemaError::MissingColumn {
                    table: self,
                    column: name,
                })?;
            exprs.push(kind.coerce(name, column.dtype()));
        }

        let conformed = df.clone().lazy().with_columns(exprs).collect()?;

        for &(name, kind) in self.columns() {
            if !kind.is_numeric() {
                continue;
            }
            let before = df.column(name)?;
            let after = conformed.column(name)?;
            let had_values = before.null_count() < before.len();
            if had_values && after.null_count() == after.len() {
                return Err(SchemaError::MistypedColumn {
                    table: self,
                    column: name,
                    expected: kind,
                });
            }
        }

        Ok(conformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conform_parses_dates_and_nulls_garbage() {
        let df = df!(
            "order_id" => [1i64, 2, 3],
            "customer_id" => [10i64, 11, 12],
            "order_status" => [4i64, 1, 3],
            "order_date" => ["2024-01-02", "01/05/2024", "not a date"],
            "required_date" => ["2024-01-10", "2024-01-10", "2024-01-10"],
            "shipped_date" => [Some("2024-01-15"), None, Some("NULL")],
            "store_id" => [1i64, 1, 2],
            "staff_id" => [2i64, 2, 3],
        )
        .unwrap();

        let conformed = Table::Orders.conform(df).unwrap();
        assert_eq!(conformed.height(), 3);

        let order_date = conformed.column("order_date").unwrap();
        assert_eq!(order_date.dtype(), &DataType::Date);
        assert_eq!(order_date.null_count(), 1);

        let shipped = conformed.column("shipped_date").unwrap();
        assert_eq!(shipped.dtype(), &DataType::Date);
        assert_eq!(shipped.null_count(), 2);

        // 2024-01-02 and 2024-01-05 as days since the epoch
        let days = order_date.cast(&DataType::Int32).unwrap();
        let days: Vec<Option<i32>> = days.i32().unwrap().into_iter().collect();
        assert_eq!(days, vec![Some(19724), Some(19727), None]);
    }

    #[test]
    fn conform_reports_missing_column_by_name() {
        let df = df!("brand_id" => [1i64, 2]).unwrap();
        let err = Table::Brands.conform(df).unwrap_err();
        match err {
            SchemaError::MissingColumn { table, column } => {
                assert_eq!(table, Table::Brands);
                assert_eq!(column, "brand_name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn conform_rejects_numeric_column_without_numbers() {
        let df = df!(
            "store_id" => [1i64, 2],
            "product_id" => [10i64, 11],
            "quantity" => ["plenty", "few"],
        )
        .unwrap();
        let err = Table::Stocks.conform(df).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MistypedColumn {
                column: "quantity",
                ..
            }
        ));
    }

    #[test]
    fn conform_nulls_single_malformed_quantity() {
        let df = df!(
            "store_id" => [1i64, 2],
            "product_id" => [10i64, 11],
            "quantity" => ["4", "lots"],
        )
        .unwrap();
        let conformed = Table::Stocks.conform(df).unwrap();
        let quantity: Vec<Option<i64>> = conformed
            .column("quantity")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(quantity, vec![Some(4), None]);
    }

    #[test]
    fn conform_nulls_fractional_integers() {
        let df = df!(
            "store_id" => [1i64, 2, 3],
            "product_id" => [10i64, 11, 12],
            "quantity" => ["2.5", "3", "4.0"],
        )
        .unwrap();
        let conformed = Table::Stocks.conform(df).unwrap();
        let quantity: Vec<Option<i64>> = conformed
            .column("quantity")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(quantity, vec![None, Some(3), Some(4)]);
    }

    #[test]
    fn conform_keeps_extra_columns() {
        let df = df!(
            "brand_id" => [1i64],
            "brand_name" => ["Electra"],
            "founded" => [1993i64],
        )
        .unwrap();
        let conformed = Table::Brands.conform(df).unwrap();
        assert!(conformed.column("founded").is_ok());
    }

    #[test]
    fn file_names_follow_cleaned_prefix() {
        let dir = Path::new("/data");
        assert_eq!(
            Table::OrderItems.cleaned_path(dir),
            PathBuf::from("/data/cleaned_order_items.csv")
        );
        assert_eq!(Table::Staffs.raw_path(dir), PathBuf::from("/data/staffs.csv"));
    }
}
