//! On-demand tile synthesis.
//!
//! Only full-resolution tiles with legends come from the chart publisher.
//! Every other variant is built from them the first time it is needed and
//! written next to them:
//!
//! - scale 1 without legends: the source tile with every non-charted pixel
//!   made transparent;
//! - scale `s > 1`: the `s x s` full-resolution tiles it covers, each shrunk
//!   by `s` and pasted into place.
//!
//! Files are written to a temporary name and renamed into place, and each
//! one is recorded in the chart's manifest.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use aerochart_metrics::{metric_defs, TileLabels};
use aerochart_proj::Chart;
use image::codecs::png::PngEncoder;
use image::{imageops, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::address::{Tile, TileId, TileStep};
use crate::error::TileError;
use crate::loader::{LoadOutcome, TileSource};
use crate::manifest;
use crate::Result;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const EXPIRED_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Reads and synthesizes the tiles of one chart.
#[derive(Debug)]
pub struct TileGenerator {
    chart: Arc<Chart>,
    base: PathBuf,
    step: TileStep,
    chart_stem: String,
    name_stem: String,
    expired: bool,
}

impl TileGenerator {
    /// Creates a generator for the chart's tiles under `base`, probing the
    /// tile size from the chart's first source tile.
    pub fn new(chart: Arc<Chart>, base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let step = TileStep::probe(&base, &chart)?;
        debug!(chart = chart.full_name(), width = step.width, height = step.height, "tile step");
        Ok(Self::with_step(chart, base, step))
    }

    /// Creates a generator with a known tile size.
    pub fn with_step(chart: Arc<Chart>, base: impl Into<PathBuf>, step: TileStep) -> Self {
        let chart_stem = chart.descriptor().file_stem();
        let name_stem = chart.descriptor().name_stem();
        let expired = chart.is_expired();
        Self {
            chart,
            base: base.into(),
            step,
            chart_stem,
            name_stem,
            expired,
        }
    }

    /// Overrides whether loaded tiles get the expired-chart hatching.
    pub fn with_expired(mut self, expired: bool) -> Self {
        self.expired = expired;
        self
    }

    /// The chart whose tiles this generator serves.
    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    /// Source tile size.
    pub fn step(&self) -> TileStep {
        self.step
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Storage path of a tile.
    pub fn tile_path(&self, tile: &Tile) -> PathBuf {
        tile.path(&self.base, &self.chart_stem)
    }

    /// Places a tile id on this generator's chart.
    pub fn locate(&self, id: TileId) -> Result<Tile> {
        Tile::locate(&self.chart, self.step, id).ok_or(TileError::OutsideChart {
            scale: id.scale,
            row: id.row,
            col: id.col,
        })
    }

    /// Reads a tile from disk, generating and persisting it first if it is
    /// a variant that can be derived from source tiles.
    pub fn read_tile(&self, tile: &Tile) -> Result<RgbaImage> {
        let path = self.tile_path(tile);
        if path.exists() {
            return Ok(image::open(&path)?.into_rgba8());
        }

        // full-resolution tiles with legend pixels come only from the publisher
        if tile.id.scale == 1 && !tile.is_clipped() {
            return Err(TileError::MissingSource { path });
        }

        debug!(path = %path.display(), "creating tile");
        let image = if tile.id.scale == 1 {
            self.clip_legends(tile)?
        } else {
            self.downsample(tile)?
        };
        self.persist(tile, &path, &image);
        Ok(image)
    }

    /// Scale-1 tile with every legend pixel transparent.
    fn clip_legends(&self, tile: &Tile) -> Result<RgbaImage> {
        let source = Tile {
            id: TileId {
                legends: true,
                ..tile.id
            },
            ..*tile
        };
        let mut image = self.read_tile(&source)?;
        if image.dimensions() != (tile.width, tile.height) {
            let (w, h) = image.dimensions();
            image = imageops::crop_imm(&image, 0, 0, w.min(tile.width), h.min(tile.height)).to_image();
        }
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let cx = (tile.left + x) as f64;
            let cy = (tile.top + y) as f64;
            if !self.chart.pixel_is_charted(cx, cy) {
                *pixel = TRANSPARENT;
            }
        }
        Ok(image)
    }

    /// Scaled tile assembled from the full-resolution tiles it covers.
    fn downsample(&self, tile: &Tile) -> Result<RgbaImage> {
        let scale = tile.id.scale;
        let mut canvas = RgbaImage::from_pixel(tile.width, tile.height, TRANSPARENT);

        for ystep in 0..scale {
            for xstep in 0..scale {
                let sub_id = TileId::new(
                    1,
                    tile.id.legends,
                    tile.id.row * scale + ystep,
                    tile.id.col * scale + xstep,
                );
                // beyond the chart edge, or nothing to show
                let Some(sub) = Tile::locate(&self.chart, self.step, sub_id) else {
                    continue;
                };
                if sub.is_empty() {
                    continue;
                }

                let full = self.read_tile(&sub)?;
                let (w, h) = full.dimensions();
                let shrunk = imageops::thumbnail(&full, w.div_ceil(scale), h.div_ceil(scale));

                let x = (xstep as f64 * self.step.width as f64 / scale as f64).round() as i64;
                let y = (ystep as f64 * self.step.height as f64 / scale as f64).round() as i64;
                imageops::replace(&mut canvas, &shrunk, x, y);
            }
        }
        Ok(canvas)
    }

    /// Writes a generated tile and records it in the manifest. Failures are
    /// logged; the in-memory image is still used.
    fn persist(&self, tile: &Tile, path: &Path, image: &RgbaImage) {
        if let Err(e) = write_png_atomic(path, image) {
            warn!(path = %path.display(), error = %e, "failed to write generated tile");
            return;
        }
        let labels = TileLabels::new(self.chart.full_name(), tile.id.scale, tile.id.legends);
        metrics::counter!(metric_defs::TILES_GENERATED.name, &labels.to_labels()).increment(1);

        let relative = tile.relative_path(&self.chart_stem);
        if let Err(e) = manifest::append(&self.base, &self.name_stem, &relative) {
            warn!(tile = %relative, error = %e, "failed to record generated tile");
        }
    }

    /// Removes every tile this chart's generators have written.
    pub fn purge(&self) -> Result<usize> {
        manifest::purge(&self.base, &self.name_stem)
    }
}

impl TileSource for TileGenerator {
    fn load(&self, tile: &Tile) -> LoadOutcome {
        if tile.is_empty() {
            return LoadOutcome::Absent;
        }

        let started = Instant::now();
        let labels = TileLabels::new(self.chart.full_name(), tile.id.scale, tile.id.legends);
        let result = self.read_tile(tile);
        metrics::histogram!(metric_defs::TILE_LOAD_TIME.name, &labels.to_labels())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(mut image) => {
                if self.expired {
                    hatch_expired(&mut image);
                }
                LoadOutcome::Loaded(Arc::new(image))
            }
            Err(TileError::MissingSource { path }) => {
                warn!(path = %path.display(), "source tile missing");
                metrics::counter!(
                    metric_defs::TILE_FAILURES.name,
                    &labels.with(&[("reason", "missing".to_string())])
                )
                .increment(1);
                LoadOutcome::Failed { permanent: true }
            }
            Err(e) => {
                warn!(tile = ?tile.id, error = %e, "failed to load tile");
                metrics::counter!(
                    metric_defs::TILE_FAILURES.name,
                    &labels.with(&[("reason", "load".to_string())])
                )
                .increment(1);
                LoadOutcome::Failed { permanent: false }
            }
        }
    }
}

/// Encodes a PNG to `<path>.tmp` and renames it over `path`.
pub fn write_png_atomic(path: &Path, image: &RgbaImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("png.tmp");
    {
        let mut writer = BufWriter::new(fs::File::create(&temp_path)?);
        image.write_with_encoder(PngEncoder::new(&mut writer))?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Crosses out an expired chart's tile with red diagonal lines.
pub fn hatch_expired(image: &mut RgbaImage) {
    let (w, h) = image.dimensions();
    let (w, h) = (w as i64, h as i64);
    let spacing = (w / 4).max(1) as usize;
    let mut plot = |x: i64, y: i64| {
        for dx in 0..2 {
            let px = x + dx;
            if px >= 0 && px < w && y >= 0 && y < h {
                image.put_pixel(px as u32, y as u32, EXPIRED_RED);
            }
        }
    };
    for i in (-h..w).step_by(spacing) {
        for t in 0..h {
            plot(i + t, t);
            plot(i + h - t, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hatch_marks_corners_and_spares_between_lines() {
        let mut image = RgbaImage::from_pixel(200, 200, Rgba([10, 20, 30, 255]));
        hatch_expired(&mut image);
        assert_eq!(*image.get_pixel(0, 0), EXPIRED_RED);
        assert_eq!(*image.get_pixel(100, 100), EXPIRED_RED);
        assert_eq!(*image.get_pixel(25, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("3@.png");
        let image = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 4]));
        write_png_atomic(&path, &image).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("png.tmp").exists());
        let back = image::open(&path).unwrap().into_rgba8();
        assert_eq!(back, image);
    }
}
