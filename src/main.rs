//! Retail Insights - cleans the store chain's CSV extracts and writes business reports.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retail_insights::pipeline;
use retail_insights::PipelineConfig;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Clean the raw extracts into cleaned_*.csv.
    Clean,
    /// Compute the reports from cleaned_*.csv.
    Analyze,
    /// Clean, then analyze.
    Run,
}

#[derive(Parser, Debug)]
#[clap(name = "retail-insights", version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Command,

    /// Path to a TOML configuration file. CLI arguments override its values.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing the raw CSV extracts.
    #[clap(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Directory for cleaned tables, reports and charts. Defaults to the input directory.
    #[clap(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Stock below this many units (and above zero) is reported as low.
    #[clap(long, global = true)]
    low_stock_threshold: Option<i64>,

    /// Skip chart rendering.
    #[clap(long, global = true)]
    no_charts: bool,
}

impl CliArgs {
    fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                PipelineConfig::load(path)?
            }
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(threshold) = self.low_stock_threshold {
            config.low_stock_threshold = threshold;
        }
        if self.no_charts {
            config.render_charts = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let config = cli_args.resolve_config()?;
    info!("  input_dir: {:?}", config.input_dir);
    info!("  output_dir: {:?}", config.output_dir());

    match cli_args.command {
        Command::Clean => {
            let summary = pipeline::clean(&config)?;
            if summary.cleaned.is_empty() {
                warn!("No raw tables were cleaned");
            }
        }
        Command::Analyze => {
            let summary = pipeline::analyze(&config)?;
            for (report, reason) in &summary.failed {
                warn!("Skipped {}: {}", report, reason);
            }
        }
        Command::Run => {
            let (cleaned, analyzed) = pipeline::run(&config)?;
            info!(
                "Done: {} tables cleaned, {} reports written, {} charts",
                cleaned.cleaned.len(),
                analyzed.written.len(),
                analyzed.charts.len()
            );
        }
    }

    Ok(())
}
