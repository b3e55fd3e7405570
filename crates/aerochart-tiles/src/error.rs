//! Error types for the tile crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, generating or loading tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// I/O error reading or writing a tile file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Chart construction error.
    #[error("Chart error: {0}")]
    Chart(#[from] aerochart_proj::ChartError),

    /// A full-resolution source tile is not on disk. These can only come
    /// from the chart publisher, so retrying will not help.
    #[error("Source tile missing: {}", path.display())]
    MissingSource {
        /// Expected location of the source tile.
        path: PathBuf,
    },

    /// The chart's first tile could not be read to learn the tile size.
    #[error("Cannot determine tile size from {}: {reason}", path.display())]
    TileSizeUnknown {
        /// Probed tile.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Tile address lies outside the chart.
    #[error("Tile S{scale} {row}/{col} is outside the chart")]
    OutsideChart {
        /// Scale factor.
        scale: u32,
        /// Tile row.
        row: u32,
        /// Tile column.
        col: u32,
    },

    /// The loader worker thread could not be started.
    #[error("Failed to start tile loader: {0}")]
    LoaderSpawn(String),
}
