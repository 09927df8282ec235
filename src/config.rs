//! Pipeline configuration: defaults, optional TOML file, command line overrides.

use crate::reports::stock::LOW_STOCK_THRESHOLD;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the nine raw extracts.
    pub input_dir: PathBuf,
    /// Where cleaned tables, reports and charts go. Defaults to `input_dir`.
    pub output_dir: Option<PathBuf>,
    /// Stock strictly below this (and above zero) counts as low.
    pub low_stock_threshold: i64,
    pub render_charts: bool,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            render_charts: true,
            chart_width: 1200,
            chart_height: 600,
        }
    }
}

impl PipelineConfig {
    /// Load settings from a TOML file. Keys left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_write_next_to_inputs() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_dir(), Path::new("."));
        assert_eq!(config.low_stock_threshold, 5);
        assert!(config.render_charts);
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = PipelineConfig::from_toml(
            "input_dir = \"data/raw\"\noutput_dir = \"data/out\"\nlow_stock_threshold = 3\n",
        )
        .unwrap();
        assert_eq!(config.input_dir, PathBuf::from("data/raw"));
        assert_eq!(config.output_dir(), Path::new("data/out"));
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.chart_width, 1200);
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        let err = PipelineConfig::from_toml("low_stock_threshold = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
