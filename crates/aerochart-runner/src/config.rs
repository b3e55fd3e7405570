//! Runner configuration.
//!
//! An optional YAML file names where the chart data lives. Every field has a
//! default so an empty file, or no file at all, is valid:
//!
//! ```yaml
//! data_dir: /srv/charts
//! tiles_dir: /srv/charts/tiles
//! log_level: debug
//! ```
//!
//! Paths left unset are resolved inside `data_dir`.

use std::fs;
use std::path::{Path, PathBuf};

use aerochart_proj::{ChartCatalog, ChartOverrides};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RunnerError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the chart list and override files.
    pub data_dir: PathBuf,
    /// Chart list; defaults to `<data_dir>/chartlimits.csv`.
    pub chart_limits: Option<PathBuf>,
    /// Charted-area limits; defaults to `<data_dir>/chartedlims.csv`.
    pub charted_limits: Option<PathBuf>,
    /// Charted-area outlines; defaults to `<data_dir>/outlines.txt`.
    pub outlines: Option<PathBuf>,
    /// Tile base directory; defaults to `<data_dir>/charts`.
    pub tiles_dir: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            chart_limits: None,
            charted_limits: None,
            outlines: None,
            tiles_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|e| match e {
            RunnerError::Yaml { source, .. } => RunnerError::Yaml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses YAML config text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| RunnerError::Yaml {
            path: PathBuf::new(),
            source,
        })
    }

    pub fn chart_limits_path(&self) -> PathBuf {
        self.resolve(&self.chart_limits, "chartlimits.csv")
    }

    pub fn charted_limits_path(&self) -> PathBuf {
        self.resolve(&self.charted_limits, "chartedlims.csv")
    }

    pub fn outlines_path(&self) -> PathBuf {
        self.resolve(&self.outlines, "outlines.txt")
    }

    pub fn tiles_path(&self) -> PathBuf {
        self.resolve(&self.tiles_dir, "charts")
    }

    fn resolve(&self, explicit: &Option<PathBuf>, default_name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.data_dir.join(default_name))
    }

    /// Reads the charted-limits and outline files; missing files are empty.
    pub fn overrides(&self) -> Result<ChartOverrides> {
        let mut overrides = ChartOverrides::new();
        let limits = overrides.load_limits_file(self.charted_limits_path())?;
        let outlines = overrides.load_outlines_file(self.outlines_path())?;
        debug!(limits, outlines, "loaded chart overrides");
        Ok(overrides)
    }

    /// Loads every chart in the chart list.
    pub fn catalog(&self) -> Result<ChartCatalog> {
        let overrides = self.overrides()?;
        Ok(ChartCatalog::load(self.chart_limits_path(), &overrides)?)
    }
}
