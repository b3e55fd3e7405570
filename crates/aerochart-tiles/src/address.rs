//! Tile addressing.
//!
//! A chart is cut into tiles of a fixed pixel step (the size of the
//! publisher's full-resolution tiles, usually 256x256). At scale factor `s`
//! the chart is shrunk to `ceil(W/s) x ceil(H/s)` pixels and cut with the
//! same step, so each scaled tile covers `s x s` full-resolution tiles.
//!
//! Tiles are stored as
//!
//! ```text
//! <base>/<Chart_Name_Rev>[/S<s>]/<row>/<col>[@].png
//! ```
//!
//! where `@` marks a tile whose legend pixels have been cleared.

use std::path::{Path, PathBuf};

use aerochart_proj::{Chart, LatLon};

use crate::error::TileError;
use crate::Result;

/// Identity of one tile variant of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Integer downsample factor, at least 1.
    pub scale: u32,
    /// Whether legend pixels are kept.
    pub legends: bool,
    /// Row in units of the tile step.
    pub row: u32,
    /// Column in units of the tile step.
    pub col: u32,
}

impl TileId {
    /// Identifies the tile at `row`, `col` of the grid for one scale and
    /// legend choice.
    pub const fn new(scale: u32, legends: bool, row: u32, col: u32) -> Self {
        Self {
            scale,
            legends,
            row,
            col,
        }
    }
}

/// Pixel size of a full-resolution source tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStep {
    /// Source tile width in full-resolution pixels.
    pub width: u32,
    /// Source tile height in full-resolution pixels.
    pub height: u32,
}

impl TileStep {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reads the size of the chart's top-left source tile from its PNG
    /// header.
    pub fn probe(base: &Path, chart: &Chart) -> Result<Self> {
        let path = base
            .join(chart.descriptor().file_stem())
            .join("0")
            .join("0.png");
        let (width, height) =
            image::image_dimensions(&path).map_err(|e| TileError::TileSizeUnknown {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if width == 0 || height == 0 {
            return Err(TileError::TileSizeUnknown {
                path,
                reason: "empty image".to_string(),
            });
        }
        Ok(Self { width, height })
    }
}

/// How much of a tile is map rather than legend, judged from its corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCoverage {
    /// All four corners charted.
    ChartedOnly,
    /// No corner charted.
    LegendOnly,
    /// Some corners charted.
    Mixed,
}

/// A tile with its placement in the scaled chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    /// Left edge in scaled pixels.
    pub left: u32,
    /// Top edge in scaled pixels.
    pub top: u32,
    /// Width in scaled pixels; smaller than the step only along the right edge.
    pub width: u32,
    /// Height in scaled pixels; smaller than the step only along the bottom edge.
    pub height: u32,
    pub coverage: TileCoverage,
}

impl Tile {
    /// Places the tile `id` on `chart`, or `None` when it lies beyond the
    /// chart's scaled extent.
    pub fn locate(chart: &Chart, step: TileStep, id: TileId) -> Option<Tile> {
        if id.scale == 0 {
            return None;
        }
        let (scaled_w, scaled_h) = scaled_size(chart, id.scale);
        let left = id.col.checked_mul(step.width)?;
        let top = id.row.checked_mul(step.height)?;
        if left >= scaled_w || top >= scaled_h {
            return None;
        }
        let width = step.width.min(scaled_w - left);
        let height = step.height.min(scaled_h - top);

        let s = id.scale as f64;
        let (x0, y0) = (left as f64 * s, top as f64 * s);
        let (x1, y1) = ((left + width) as f64 * s, (top + height) as f64 * s);
        let charted = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
            .iter()
            .filter(|(x, y)| chart.pixel_is_charted(*x, *y))
            .count();
        let coverage = match charted {
            4 => TileCoverage::ChartedOnly,
            0 => TileCoverage::LegendOnly,
            _ => TileCoverage::Mixed,
        };

        Some(Tile {
            id,
            left,
            top,
            width,
            height,
            coverage,
        })
    }

    /// Full-resolution pixel rectangle `(left, top, right, bottom)` covered
    /// by the tile.
    pub fn footprint(&self) -> (f64, f64, f64, f64) {
        let s = self.id.scale as f64;
        (
            self.left as f64 * s,
            self.top as f64 * s,
            (self.left + self.width) as f64 * s,
            (self.top + self.height) as f64 * s,
        )
    }

    /// Whether the stored image has its legend pixels cleared.
    ///
    /// Charted-only tiles have no legend pixels, so they share the file of
    /// the legend-keeping variant.
    pub fn is_clipped(&self) -> bool {
        !self.id.legends && self.coverage != TileCoverage::ChartedOnly
    }

    /// Whether the tile has nothing to show.
    pub fn is_empty(&self) -> bool {
        !self.id.legends && self.coverage == TileCoverage::LegendOnly
    }

    /// Path relative to the tile base directory, `/`-separated.
    pub fn relative_path(&self, chart_stem: &str) -> String {
        let mut path = String::from(chart_stem);
        if self.id.scale != 1 {
            path.push_str(&format!("/S{}", self.id.scale));
        }
        path.push_str(&format!("/{}/{}", self.id.row, self.id.col));
        if self.is_clipped() {
            path.push('@');
        }
        path.push_str(".png");
        path
    }

    /// Absolute storage path of the tile image.
    pub fn path(&self, base: &Path, chart_stem: &str) -> PathBuf {
        self.relative_path(chart_stem)
            .split('/')
            .fold(base.to_path_buf(), |path, part| path.join(part))
    }
}

/// Size of the chart after downsampling by `scale`.
pub fn scaled_size(chart: &Chart, scale: u32) -> (u32, u32) {
    let (w, h) = chart.dimensions();
    let s = scale.max(1);
    (w.div_ceil(s), h.div_ceil(s))
}

/// Every tile of one (scale, legends) combination.
#[derive(Debug, Clone)]
pub struct TileGrid {
    scale: u32,
    legends: bool,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Lays out the chart's tiles. Legend-only tiles are left out when
    /// legends are excluded.
    pub fn new(chart: &Chart, step: TileStep, scale: u32, legends: bool) -> Self {
        let scale = scale.max(1);
        let (scaled_w, scaled_h) = scaled_size(chart, scale);
        let rows = scaled_h.div_ceil(step.height);
        let cols = scaled_w.div_ceil(step.width);

        let mut tiles = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(tile) = Tile::locate(chart, step, TileId::new(scale, legends, row, col)) {
                    if !tile.is_empty() {
                        tiles.push(tile);
                    }
                }
            }
        }
        Self {
            scale,
            legends,
            tiles,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn legends(&self) -> bool {
        self.legends
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles overlapping the viewport.
    pub fn visible<'a>(&'a self, viewport: &'a ChartViewport) -> impl Iterator<Item = &'a Tile> + 'a {
        self.tiles.iter().filter(move |t| viewport.intersects(t))
    }
}

/// The part of a chart on screen, in full-resolution chart pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartViewport {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ChartViewport {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// The whole chart.
    pub fn whole_chart(chart: &Chart) -> Self {
        let (w, h) = chart.dimensions();
        Self::new(0.0, 0.0, w as f64, h as f64)
    }

    /// Bounding box of the chart pixels under the given screen corners.
    pub fn from_corners(chart: &Chart, corners: &[LatLon]) -> Self {
        let mut vp = Self {
            left: f64::INFINITY,
            top: f64::INFINITY,
            right: f64::NEG_INFINITY,
            bottom: f64::NEG_INFINITY,
        };
        for ll in corners {
            let (p, _) = chart.project_to_pixel(ll.lat, ll.lon);
            vp.left = vp.left.min(p.x);
            vp.right = vp.right.max(p.x);
            vp.top = vp.top.min(p.y);
            vp.bottom = vp.bottom.max(p.y);
        }
        vp
    }

    /// Whether the tile's footprint overlaps the viewport.
    pub fn intersects(&self, tile: &Tile) -> bool {
        let (left, top, right, bottom) = tile.footprint();
        left < self.right && right > self.left && top < self.bottom && bottom > self.top
    }

    /// Scale factor that keeps roughly one tile pixel per canvas pixel:
    /// the viewport diagonal over the canvas diagonal, rounded up.
    pub fn tile_scaling_for(&self, canvas_width: u32, canvas_height: u32) -> u32 {
        let chart_diag = (self.right - self.left).hypot(self.bottom - self.top);
        let canvas_diag = (canvas_width as f64).hypot(canvas_height as f64);
        if !chart_diag.is_finite() || canvas_diag <= 0.0 {
            return 1;
        }
        (chart_diag / canvas_diag).ceil().max(1.0) as u32
    }
}
