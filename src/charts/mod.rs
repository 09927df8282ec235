//! Charts module - static PNG rendering of report tables

mod renderer;

pub use renderer::{
    count_points, trend_points, ChartError, ChartRenderer, MONTHLY_CHART, STATE_CHART,
    WEEKLY_CHART,
};
