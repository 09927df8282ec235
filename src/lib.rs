//! Retail Insights - CSV cleaning and business reports for a retail store chain.
//!
//! The `clean` stage turns the nine raw extracts into `cleaned_*.csv`; the
//! `analyze` stage joins those into `analysis_*.csv` reports and PNG charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod reports;

pub use config::PipelineConfig;
pub use pipeline::PipelineError;
