//! # aerochart-proj
//!
//! Georeferencing for scanned aeronautical charts.
//!
//! Each chart is described by one line of `chartlimits.csv` naming its
//! projection, calibration, pixel size, validity dates and name. This crate
//! parses those lines, maps between latitude/longitude and chart pixels, and
//! decides which parts of a chart are map and which are legend.
//!
//! ## Projections
//!
//! - **Lambert conformal conic** (sectionals, TACs, WACs): ellipsoidal
//!   forward and inverse equations, calibrated by a world file.
//! - **Polar stereographic** (`psp:` prefix): calibrated from the four
//!   corner pixels of the chart.
//! - **Box** (`box:` prefix): linear in latitude and longitude.
//!
//! ## Charted area
//!
//! A chart's map area is a pixel rectangle or polygon combined with a
//! lat/lon envelope. Defaults cover the whole image; `chartedlims.csv` and
//! `outlines.txt` narrow them.
//!
//! ## Example
//!
//! ```
//! use aerochart_proj::{Chart, ChartOverrides, Pixel};
//!
//! let chart = Chart::from_line(
//!     "box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1",
//!     &ChartOverrides::new(),
//! )?;
//!
//! let (pixel, on_chart) = chart.project_to_pixel(44.5, -71.0);
//! assert!(on_chart);
//! assert!((pixel.x - 1000.0).abs() < 1e-9);
//!
//! let ll = chart.unproject_from_pixel(Pixel::new(0.0, 0.0));
//! assert!((ll.lat - 45.0).abs() < 1e-9);
//! assert!(chart.is_charted(44.5, -71.0));
//! # Ok::<(), aerochart_proj::ChartError>(())
//! ```

mod bounds;
mod catalog;
mod chart;
mod descriptor;
mod error;
pub mod geo;
mod overrides;
pub mod projection;

pub use bounds::{winding_number, ChartedAreaBounds, PixelArea, PixelRect};
pub use catalog::ChartCatalog;
pub use chart::Chart;
pub use descriptor::ChartDescriptor;
pub use error::ChartError;
pub use geo::{normal_lon, LatLon, LatLonEnvelope, Pixel};
pub use overrides::{ChartOverrides, ChartedLimits, GeoEdge, LimitField, Outline, PixelEdge};
pub use projection::{Projection, ProjectionParams};

/// Result type for chart operations.
pub type Result<T> = std::result::Result<T, ChartError>;
