//! # aerochart-tiles
//!
//! Tiled display of scanned aeronautical charts.
//!
//! The chart publisher supplies each chart as a grid of full-resolution PNG
//! tiles with the legends still in them. This crate adds:
//!
//! - addressing of tiles at any integer downsample factor, with or without
//!   legend pixels ([`TileId`], [`TileGrid`]);
//! - synthesis of the variants that are not supplied, written next to the
//!   source tiles and recorded in a per-chart manifest ([`TileGenerator`]);
//! - a background loader with a single worker thread ([`TileLoader`]);
//! - a draw-cycle driven cache that releases tiles no longer drawn
//!   ([`TileCache`]).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use aerochart_proj::{Chart, ChartOverrides};
//! use aerochart_tiles::{ChartViewport, DrawCycle, TileCache, TileGenerator, TileId};
//!
//! let chart = Arc::new(Chart::from_line(
//!     "box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1",
//!     &ChartOverrides::new(),
//! )?);
//! let generator = TileGenerator::new(Arc::clone(&chart), "charts")?;
//! let mut cache = TileCache::with_generator(
//!     generator,
//!     Box::new(|id: TileId| println!("tile {id:?} ready")),
//!     Box::new(|| {}),
//! )?;
//!
//! let mut cycle = DrawCycle::new();
//! let viewport = ChartViewport::whole_chart(&chart);
//! let scale = viewport.tile_scaling_for(800, 600);
//! cache.draw_pass(&viewport, scale, false, &mut cycle);
//! cache.loader().wait_idle(Duration::from_secs(30));
//! # Ok::<(), aerochart_tiles::TileError>(())
//! ```

mod address;
mod cache;
mod error;
mod generator;
mod loader;
pub mod manifest;

pub use address::{scaled_size, ChartViewport, Tile, TileCoverage, TileGrid, TileId, TileStep};
pub use cache::{DrawCycle, TileCache};
pub use error::TileError;
pub use generator::{hatch_expired, write_png_atomic, TileGenerator};
pub use loader::{IdleCallback, LoadOutcome, ReadyCallback, TileLoader, TileSource, TileStatus};

/// Result type for tile operations.
pub type Result<T> = std::result::Result<T, TileError>;
