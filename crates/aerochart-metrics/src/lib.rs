//! Metric declarations for the chart tile engine.
//!
//! Every metric the tile crates record is declared here as a [`Metric`]
//! constant so names stay in one place and carry their description, unit
//! and label keys. Recording goes through the `metrics` facade, so nothing
//! is collected unless the application installs a recorder.
//!
//! ```rust
//! use aerochart_metrics::{metric_defs, TileLabels};
//!
//! let labels = TileLabels::new("New York SEC 92", 2, false);
//! metrics::counter!(metric_defs::TILES_GENERATED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric's value behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Only ever increases.
    Counter,
    /// Goes up and down.
    Gauge,
    /// Distribution of observations.
    Histogram,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric name with its metadata, built with const constructors.
///
/// ```rust
/// use aerochart_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const DECODES: Metric = Metric::counter("aerochart.example.decodes")
///     .with_description("PNG decodes")
///     .with_unit(Unit::Count)
///     .with_labels(&["chart"]);
///
/// assert_eq!(DECODES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name.
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys recorded with the metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn with_kind(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// Tile engine metrics.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels carried by per-tile metrics.
    pub const TILE_LABELS: &[&str] = &["chart", "scale", "legends"];

    /// Tiles written to disk by the generator.
    pub const TILES_GENERATED: Metric = Metric::counter("aerochart.tiles.generated")
        .with_description("Tiles synthesized and written to disk")
        .with_unit(Unit::Count)
        .with_labels(TILE_LABELS);

    /// Tiles that failed to generate or decode.
    ///
    /// Labels: chart, scale, legends, reason
    pub const TILE_FAILURES: Metric = Metric::counter("aerochart.tiles.failures")
        .with_description("Tile loads that failed")
        .with_unit(Unit::Count)
        .with_labels(&["chart", "scale", "legends", "reason"]);

    /// Bitmaps made resident by the loader. The loader serves any chart, so
    /// this carries no labels.
    pub const TILES_LOADED: Metric = Metric::counter("aerochart.tiles.loaded")
        .with_description("Tile bitmaps made resident")
        .with_unit(Unit::Count);

    /// Bitmaps released by the draw-cycle sweep.
    pub const TILES_EVICTED: Metric = Metric::counter("aerochart.tiles.evicted")
        .with_description("Tile bitmaps released after going undrawn")
        .with_unit(Unit::Count)
        .with_labels(&["chart"]);

    /// Requests waiting for the loader thread.
    pub const LOADER_QUEUE_DEPTH: Metric = Metric::gauge("aerochart.loader.queue_depth")
        .with_description("Tile requests waiting for the loader")
        .with_unit(Unit::Count);

    /// Time spent loading or generating one tile.
    pub const TILE_LOAD_TIME: Metric = Metric::histogram("aerochart.tiles.load_time_ms")
        .with_description("Time to load or generate one tile")
        .with_unit(Unit::Milliseconds)
        .with_labels(TILE_LABELS);

    /// Every metric above.
    pub const ALL: &[&Metric] = &[
        &TILES_GENERATED,
        &TILE_FAILURES,
        &TILES_LOADED,
        &TILES_EVICTED,
        &LOADER_QUEUE_DEPTH,
        &TILE_LOAD_TIME,
    ];
}

/// Label values identifying a tile variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLabels {
    /// Chart full name.
    pub chart: String,
    /// Downsample factor.
    pub scale: u32,
    /// Whether legend pixels are kept.
    pub legends: bool,
}

impl TileLabels {
    pub fn new(chart: impl Into<String>, scale: u32, legends: bool) -> Self {
        Self {
            chart: chart.into(),
            scale,
            legends,
        }
    }

    /// Label pairs in [`metric_defs::TILE_LABELS`] order.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("chart", self.chart.clone()),
            ("scale", self.scale.to_string()),
            ("legends", self.legends.to_string()),
        ]
    }

    /// Label pairs with extra pairs appended.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes every metric in [`metric_defs::ALL`] to the installed recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
