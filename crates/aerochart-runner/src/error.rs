//! Error types for the runner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading configuration or running a command.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid YAML for [`crate::Config`].
    #[error("Invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Chart(#[from] aerochart_proj::ChartError),

    #[error(transparent)]
    Tile(#[from] aerochart_tiles::TileError),

    /// Tiles were still loading when the wait ran out.
    #[error("Timed out after {0:?} waiting for tiles")]
    Timeout(std::time::Duration),
}
