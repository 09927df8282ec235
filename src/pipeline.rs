//! The two pipeline stages and the directory checks that guard them.

use crate::config::PipelineConfig;
use crate::data::{CleanSummary, DataCleaner, LoaderError, Tables};
use crate::reports::{ReportEngine, RunSummary};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input directory does not exist: {0}")]
    InputDirMissing(PathBuf),
    #[error("Output directory {path} is not usable: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Check the input directory and create the output directory.
pub fn prepare_dirs(config: &PipelineConfig) -> Result<(), PipelineError> {
    if !config.input_dir.is_dir() {
        return Err(PipelineError::InputDirMissing(config.input_dir.clone()));
    }
    let output = config.output_dir();
    std::fs::create_dir_all(output).map_err(|source| PipelineError::OutputDir {
        path: output.to_path_buf(),
        source,
    })
}

/// Stage 1: raw extracts → `cleaned_*.csv`.
pub fn clean(config: &PipelineConfig) -> Result<CleanSummary, PipelineError> {
    prepare_dirs(config)?;
    info!("--- Cleaning raw tables in {} ---", config.input_dir.display());
    Ok(DataCleaner::run(&config.input_dir, config.output_dir())?)
}

/// Stage 2: `cleaned_*.csv` → `analysis_*.csv` and charts, all in the output directory.
pub fn analyze(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    prepare_dirs(config)?;
    info!("--- Loading cleaned data from {} ---", config.output_dir().display());
    let tables = Tables::load_cleaned(config.output_dir());
    info!("{} of 9 cleaned tables loaded", tables.len());
    Ok(ReportEngine::new(&tables, config).run()?)
}

/// Both stages in order.
pub fn run(config: &PipelineConfig) -> Result<(CleanSummary, RunSummary), PipelineError> {
    let cleaned = clean(config)?;
    let analyzed = analyze(config)?;
    Ok((cleaned, analyzed))
}
