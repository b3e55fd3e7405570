//! Command implementations, kept free of argument parsing so they can be
//! driven from tests.

use std::sync::Arc;
use std::time::Duration;

use aerochart_proj::{Chart, ChartCatalog, LatLon, Pixel};
use aerochart_tiles::{manifest, ChartViewport, DrawCycle, TileCache, TileGenerator, TileId};
use chrono::NaiveDate;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::RunnerError;
use crate::Result;

/// One row of the chart listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSummary {
    /// Chart name with revision.
    pub full_name: String,
    /// Projection kind, as printed by the listing.
    pub projection: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Last valid date, if the chart expires.
    pub expiration: Option<NaiveDate>,
    /// Whether the chart had expired on the listing date.
    pub expired: bool,
}

/// Summarizes every chart in the catalog as of `today`.
pub fn list(catalog: &ChartCatalog, today: NaiveDate) -> Vec<ChartSummary> {
    catalog
        .iter()
        .map(|chart| {
            let (width, height) = chart.dimensions();
            ChartSummary {
                full_name: chart.full_name().to_string(),
                projection: chart.projection().kind(),
                width,
                height,
                expiration: chart.descriptor().expiration,
                expired: chart.is_expired_on(today),
            }
        })
        .collect()
}

/// Chart pixel of a coordinate and whether it falls on the image.
pub fn project(catalog: &ChartCatalog, chart: &str, lat: f64, lon: f64) -> Result<(Pixel, bool)> {
    Ok(catalog.get(chart)?.project_to_pixel(lat, lon))
}

/// Coordinate of a chart pixel.
pub fn unproject(catalog: &ChartCatalog, chart: &str, x: f64, y: f64) -> Result<LatLon> {
    Ok(catalog.get(chart)?.unproject_from_pixel(Pixel::new(x, y)))
}

/// Whether a coordinate lies in the chart's map area.
pub fn charted(catalog: &ChartCatalog, chart: &str, lat: f64, lon: f64) -> Result<bool> {
    Ok(catalog.get(chart)?.is_charted(lat, lon))
}

/// Outcome of rendering a chart's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Tiles in the grid.
    pub tiles: usize,
    /// Tiles with a bitmap after loading finished.
    pub ready: usize,
}

/// Loads, generating as needed, every tile of a chart at one scale.
pub fn render(
    config: &Config,
    catalog: &ChartCatalog,
    chart: &str,
    scale: u32,
    legends: bool,
    timeout: Duration,
) -> Result<RenderSummary> {
    let chart: Arc<Chart> = Arc::new(catalog.get(chart)?.clone());
    let generator = TileGenerator::new(Arc::clone(&chart), config.tiles_path())?;
    let mut cache = TileCache::with_generator(
        generator,
        Box::new(|id: TileId| trace!(tile = ?id, "tile ready")),
        Box::new(|| debug!("tile loader idle")),
    )?;

    let mut cycle = DrawCycle::new();
    let viewport = ChartViewport::whole_chart(&chart);
    cache.draw_pass(&viewport, scale, legends, &mut cycle);
    if !cache.loader().wait_idle(timeout) {
        return Err(RunnerError::Timeout(timeout));
    }

    let drawn = cache.draw_pass(&viewport, scale, legends, &mut cycle);
    let summary = RenderSummary {
        tiles: drawn.len(),
        ready: drawn.iter().filter(|(_, bitmap)| bitmap.is_some()).count(),
    };
    info!(
        chart = chart.full_name(),
        scale,
        legends,
        tiles = summary.tiles,
        ready = summary.ready,
        "rendered chart"
    );
    cache.close();
    Ok(summary)
}

/// Deletes the generated tiles of a chart. The chart need not still be in
/// the catalog: a superseded revision is matched by its name.
pub fn purge(config: &Config, catalog: &ChartCatalog, chart: &str) -> Result<usize> {
    let stem = match catalog.get(chart) {
        Ok(found) => found.descriptor().name_stem(),
        Err(_) => chart.replace(' ', "_"),
    };
    Ok(manifest::purge(&config.tiles_path(), &stem)?)
}
