//! Per-chart tile cache driven by draw cycles.
//!
//! The view owns a [`DrawCycle`] counter. Each tile handed out during a pass
//! is stamped with the current count; the sweep at the end of the pass
//! releases everything stamped earlier, so a bitmap stays resident exactly
//! as long as it keeps being drawn.

use std::collections::HashMap;
use std::sync::Arc;

use aerochart_metrics::metric_defs;
use aerochart_proj::Chart;
use image::RgbaImage;
use tracing::debug;

use crate::address::{ChartViewport, Tile, TileGrid, TileId, TileStep};
use crate::generator::TileGenerator;
use crate::loader::{IdleCallback, ReadyCallback, TileLoader};
use crate::Result;

/// Monotonic draw-pass counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DrawCycle(u64);

impl DrawCycle {
    pub fn new() -> Self {
        Self(1)
    }

    pub fn current(&self) -> u64 {
        self.0
    }

    /// Moves to the next pass and returns its count.
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

impl Default for DrawCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Tiles of one chart at the scale and legend setting last asked for.
pub struct TileCache {
    chart: Arc<Chart>,
    step: TileStep,
    loader: TileLoader,
    grid: Option<TileGrid>,
    stamps: HashMap<TileId, u64>,
}

impl TileCache {
    pub fn new(chart: Arc<Chart>, step: TileStep, loader: TileLoader) -> Self {
        Self {
            chart,
            step,
            loader,
            grid: None,
            stamps: HashMap::new(),
        }
    }

    /// Builds a cache whose loader reads and generates tiles with
    /// `generator`.
    pub fn with_generator(
        generator: TileGenerator,
        on_ready: ReadyCallback,
        on_idle: IdleCallback,
    ) -> Result<Self> {
        let chart = Arc::clone(generator.chart());
        let step = generator.step();
        let loader = TileLoader::new(generator, on_ready, on_idle)?;
        Ok(Self::new(chart, step, loader))
    }

    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    pub fn loader(&self) -> &TileLoader {
        &self.loader
    }

    /// The tile grid for a scale and legend setting. Switching to a new
    /// combination drops every tile of the old one.
    pub fn grid(&mut self, scale: u32, legends: bool) -> &TileGrid {
        let scale = scale.max(1);
        let stale = self
            .grid
            .as_ref()
            .is_some_and(|g| g.scale() != scale || g.legends() != legends);
        if stale {
            debug!(chart = self.chart.full_name(), scale, legends, "tile combination changed");
            self.drop_all();
        }
        self.grid
            .get_or_insert_with(|| TileGrid::new(&self.chart, self.step, scale, legends))
    }

    /// Tiles of the combination overlapping the viewport.
    pub fn visible_tiles(&mut self, viewport: &ChartViewport, scale: u32, legends: bool) -> Vec<Tile> {
        self.grid(scale, legends).visible(viewport).copied().collect()
    }

    /// The tile's bitmap if it is resident; otherwise queues its load and
    /// returns `None`. Either way the tile is stamped with the current cycle.
    pub fn bitmap_if_ready(&mut self, id: &TileId, cycle: &DrawCycle) -> Option<Arc<RgbaImage>> {
        let tile = self.find(id)?;
        self.stamps.insert(*id, cycle.current());
        self.loader.request(&tile).bitmap()
    }

    fn find(&self, id: &TileId) -> Option<Tile> {
        if let Some(grid) = &self.grid {
            if grid.scale() == id.scale && grid.legends() == id.legends {
                return grid
                    .tiles()
                    .binary_search_by_key(id, |t| t.id)
                    .ok()
                    .map(|i| grid.tiles()[i]);
            }
        }
        Tile::locate(&self.chart, self.step, *id).filter(|t| !t.is_empty())
    }

    /// Releases every tile not stamped during the current cycle. Returns the
    /// number released.
    pub fn sweep(&mut self, cycle: &DrawCycle) -> usize {
        let current = cycle.current();
        let stale: Vec<TileId> = self
            .stamps
            .iter()
            .filter(|(_, stamp)| **stamp < current)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.stamps.remove(id);
            self.loader.release(id);
        }
        if !stale.is_empty() {
            metrics::counter!(
                metric_defs::TILES_EVICTED.name,
                "chart" => self.chart.full_name().to_string()
            )
            .increment(stale.len() as u64);
            debug!(chart = self.chart.full_name(), released = stale.len(), "swept tiles");
        }
        stale.len()
    }

    /// One full draw pass: fetches every visible tile, sweeps what was not
    /// drawn, and advances the cycle. Tiles still loading come back with
    /// `None`.
    pub fn draw_pass(
        &mut self,
        viewport: &ChartViewport,
        scale: u32,
        legends: bool,
        cycle: &mut DrawCycle,
    ) -> Vec<(Tile, Option<Arc<RgbaImage>>)> {
        let tiles = self.visible_tiles(viewport, scale, legends);
        let drawn = tiles
            .into_iter()
            .map(|tile| {
                let bitmap = self.bitmap_if_ready(&tile.id, cycle);
                (tile, bitmap)
            })
            .collect();
        self.sweep(cycle);
        cycle.advance();
        drawn
    }

    /// Ids of tiles whose bitmaps are held.
    pub fn resident(&self) -> Vec<TileId> {
        self.loader.resident_ids()
    }

    /// Releases every tile, as when the chart is closed.
    pub fn close(&mut self) {
        self.drop_all();
    }

    fn drop_all(&mut self) {
        self.loader.release_all();
        self.stamps.clear();
        self.grid = None;
    }
}
