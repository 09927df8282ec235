//! Static Chart Renderer
//! Draws the sales trend line charts and the customer concentration bar chart as PNG files.
//!
//! Charts only read already computed report tables:
//! 1. Monthly sales: line with markers, one point per month
//! 2. Weekly sales: plain line, one point per week
//! 3. Customers per state: bars for the ten largest states

use crate::reports::trends::from_epoch_days;
use plotters::prelude::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MONTHLY_CHART: &str = "plot_monthly_sales_trend.png";
pub const WEEKLY_CHART: &str = "plot_weekly_sales_trend.png";
pub const STATE_CHART: &str = "plot_customer_concentration_state.png";

/// States shown in the concentration chart.
pub const STATE_CHART_BARS: usize = 10;

// Colors
const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);
const BAR_BLUE: RGBColor = RGBColor(91, 155, 213);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no data points to plot")]
    Empty,
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("drawing failed: {0}")]
    Drawing(String),
}

fn drawing<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Drawing(e.to_string())
}

/// (label, total_sales) pairs from a trend report, in bucket order.
pub fn trend_points(frame: &DataFrame, label_format: &str) -> Result<Vec<(String, f64)>, ChartError> {
    let days = frame.column("order_date")?.cast(&DataType::Int32)?;
    let sales = frame.column("total_sales")?.cast(&DataType::Float64)?;

    let points = days
        .i32()?
        .into_iter()
        .zip(sales.f64()?.into_iter())
        .filter_map(|(day, total)| {
            let date = from_epoch_days(day?)?;
            Some((date.format(label_format).to_string(), total.unwrap_or(0.0)))
        })
        .collect();
    Ok(points)
}

/// (key, customer_count) pairs from a concentration report, first `limit` rows.
pub fn count_points(
    frame: &DataFrame,
    key: &str,
    limit: usize,
) -> Result<Vec<(String, u32)>, ChartError> {
    let top = frame.head(Some(limit));
    let keys = top.column(key)?.cast(&DataType::String)?;
    let counts = top.column("customer_count")?.cast(&DataType::Int64)?;

    let points = keys
        .str()?
        .into_iter()
        .zip(counts.i64()?.into_iter())
        .filter_map(|(k, c)| Some((k?.to_string(), c?.max(0) as u32)))
        .collect();
    Ok(points)
}

/// Renders report charts into one output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(output_dir: &Path, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            width,
            height,
        }
    }

    pub fn monthly_sales(&self, monthly: &DataFrame) -> Result<PathBuf, ChartError> {
        let points = trend_points(monthly, "%Y-%m")?;
        let path = self.output_dir.join(MONTHLY_CHART);
        self.draw_line_chart(&path, "Monthly Sales Over Time", "Month", &points, true)?;
        Ok(path)
    }

    pub fn weekly_sales(&self, weekly: &DataFrame) -> Result<PathBuf, ChartError> {
        let points = trend_points(weekly, "%Y-%m-%d")?;
        let path = self.output_dir.join(WEEKLY_CHART);
        self.draw_line_chart(&path, "Weekly Sales Over Time", "Week", &points, false)?;
        Ok(path)
    }

    pub fn customers_by_state(&self, by_state: &DataFrame) -> Result<PathBuf, ChartError> {
        let bars = count_points(by_state, "state", STATE_CHART_BARS)?;
        let path = self.output_dir.join(STATE_CHART);
        self.draw_bar_chart(
            &path,
            "Customer Concentration by State (Top 10)",
            "State",
            "Number of Customers",
            &bars,
        )?;
        Ok(path)
    }

    /// Y range covering all values with 10% headroom, always including zero.
    fn y_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let pad = ((max - min) * 0.1).max(1.0);
        (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
    }

    fn draw_line_chart(
        &self,
        path: &Path,
        title: &str,
        x_desc: &str,
        points: &[(String, f64)],
        markers: bool,
    ) -> Result<(), ChartError> {
        if points.is_empty() {
            return Err(ChartError::Empty);
        }

        let (y_min, y_max) = Self::y_range(points.iter().map(|(_, v)| *v));
        let x_max = (points.len() as i32 - 1).max(1);

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(0i32..x_max, y_min..y_max)
            .map_err(drawing)?;

        let label_at = |x: &i32| {
            usize::try_from(*x)
                .ok()
                .and_then(|i| points.get(i))
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        };

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Total Sales ($)")
            .x_labels(points.len().min(12))
            .x_label_formatter(&label_at)
            .draw()
            .map_err(drawing)?;

        let series = points.iter().enumerate().map(|(i, (_, v))| (i as i32, *v));
        chart
            .draw_series(LineSeries::new(series.clone(), LINE_BLUE.stroke_width(2)))
            .map_err(drawing)?;
        if markers {
            chart
                .draw_series(series.map(|p| Circle::new(p, 4, LINE_BLUE.filled())))
                .map_err(drawing)?;
        }

        root.present().map_err(drawing)?;
        Ok(())
    }

    fn draw_bar_chart(
        &self,
        path: &Path,
        title: &str,
        x_desc: &str,
        y_desc: &str,
        bars: &[(String, u32)],
    ) -> Result<(), ChartError> {
        if bars.is_empty() {
            return Err(ChartError::Empty);
        }

        let y_top = bars.iter().map(|(_, c)| *c).max().unwrap_or(0);
        let y_top = y_top + y_top / 10 + 1;

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..bars.len() as u32).into_segmented(), 0u32..y_top)
            .map_err(drawing)?;

        let label_at = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => bars
                .get(*i as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(bars.len())
            .x_label_formatter(&label_at)
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_BLUE.filled())
                    .margin(10)
                    .data(bars.iter().enumerate().map(|(i, (_, c))| (i as u32, *c))),
            )
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        Ok(())
    }
}
