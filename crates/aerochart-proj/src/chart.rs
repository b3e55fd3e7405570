//! A chart ready for use: descriptor, projection and charted-area bounds.

use chrono::{Local, NaiveDate};

use crate::bounds::ChartedAreaBounds;
use crate::descriptor::ChartDescriptor;
use crate::geo::{LatLon, LatLonEnvelope, Pixel};
use crate::overrides::ChartOverrides;
use crate::projection::Projection;
use crate::Result;

/// A georeferenced chart.
#[derive(Debug, Clone)]
pub struct Chart {
    descriptor: ChartDescriptor,
    projection: Projection,
    bounds: ChartedAreaBounds,
}

impl Chart {
    /// Builds a chart from a descriptor and the override data for all charts.
    ///
    /// Fails when the projection cannot be derived or the chart's override
    /// record cannot be parsed. Outline problems only fall back to the
    /// rectangular bounds.
    pub fn new(descriptor: ChartDescriptor, overrides: &ChartOverrides) -> Result<Self> {
        let projection = descriptor.projection()?;
        let limits = overrides.limits_for(&descriptor.name)?;
        let bounds = ChartedAreaBounds::build(
            &projection,
            &descriptor.name,
            limits.as_ref(),
            overrides.outline_for(&descriptor.name),
        );
        Ok(Self {
            descriptor,
            projection,
            bounds,
        })
    }

    /// Parses a descriptor line and builds the chart.
    pub fn from_line(line: &str, overrides: &ChartOverrides) -> Result<Self> {
        Self::new(ChartDescriptor::parse(line)?, overrides)
    }

    /// The descriptor this chart was built from.
    pub fn descriptor(&self) -> &ChartDescriptor {
        &self.descriptor
    }

    /// Projection between coordinates and this chart's pixels.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Where the map part of the chart ends, after overrides.
    pub fn bounds(&self) -> &ChartedAreaBounds {
        &self.bounds
    }

    /// Chart size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.descriptor.width, self.descriptor.height)
    }

    /// Full name with revision.
    pub fn full_name(&self) -> &str {
        &self.descriptor.full_name
    }

    /// Maps a coordinate to chart pixels; the flag tells whether the pixel
    /// is within the chart image.
    pub fn project_to_pixel(&self, lat: f64, lon: f64) -> (Pixel, bool) {
        self.projection.project(lat, lon)
    }

    /// Maps a chart pixel to a coordinate.
    pub fn unproject_from_pixel(&self, pixel: Pixel) -> LatLon {
        self.projection.unproject(pixel)
    }

    /// Whether the coordinate falls on the map part of the chart.
    pub fn is_charted(&self, lat: f64, lon: f64) -> bool {
        if !self.bounds.contains_lat_lon(lat, lon) {
            return false;
        }
        let (pixel, in_bounds) = self.projection.project(lat, lon);
        in_bounds && self.bounds.contains_pixel(pixel.x, pixel.y)
    }

    /// Whether the pixel lies on the map part of the chart.
    pub fn pixel_is_charted(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains_pixel(x, y) {
            return false;
        }
        let ll = self.projection.unproject(Pixel::new(x, y));
        self.bounds.contains_lat_lon(ll.lat, ll.lon)
    }

    /// Whether any of the charted area may show inside a viewport envelope.
    pub fn contributes_to(&self, viewport: &LatLonEnvelope) -> bool {
        self.bounds.envelope.overlaps(viewport)
    }

    /// Whether the chart has expired as of the local date.
    pub fn is_expired(&self) -> bool {
        self.is_expired_on(Local::now().date_naive())
    }

    /// Whether the chart has expired as of `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.descriptor.is_expired_on(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const BOX_LINE: &str = "box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1";

    #[test]
    fn test_box_scenario() {
        let chart = Chart::from_line(BOX_LINE, &ChartOverrides::new()).unwrap();
        let (p, _) = chart.project_to_pixel(45.0, -72.0);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
        let (p, in_bounds) = chart.project_to_pixel(44.0, -70.0);
        assert_abs_diff_eq!(p.x, 2000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 1500.0, epsilon = 1e-9);
        assert!(!in_bounds);
        let ll = chart.unproject_from_pixel(Pixel::new(1000.0, 750.0));
        assert_abs_diff_eq!(ll.lat, 44.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ll.lon, -71.0, epsilon = 1e-9);
    }

    #[test]
    fn test_charted_needs_both_tests() {
        let mut overrides = ChartOverrides::new();
        overrides
            .load_limits("#1000R,-71.5W,Test Box\n".as_bytes())
            .unwrap();
        let chart = Chart::from_line(BOX_LINE, &overrides).unwrap();

        // inside both
        assert!(chart.is_charted(44.5, -71.2));
        // west of the lat/lon limit
        assert!(!chart.is_charted(44.5, -71.8));
        // right of the pixel limit
        assert!(!chart.is_charted(44.5, -70.5));

        assert!(chart.pixel_is_charted(600.0, 700.0));
        assert!(!chart.pixel_is_charted(200.0, 700.0));
        assert!(!chart.pixel_is_charted(1500.0, 700.0));
    }

    #[test]
    fn test_outside_chart_is_not_charted() {
        let chart = Chart::from_line(BOX_LINE, &ChartOverrides::new()).unwrap();
        assert!(!chart.is_charted(46.0, -71.0));
        assert!(!chart.is_charted(44.5, 10.0));
    }

    #[test]
    fn test_bad_override_fails_chart() {
        let mut overrides = ChartOverrides::new();
        overrides.load_limits("#10X,Test Box\n".as_bytes()).unwrap();
        assert!(Chart::from_line(BOX_LINE, &overrides).is_err());
    }

    #[test]
    fn test_contributes_to_viewport() {
        let chart = Chart::from_line(BOX_LINE, &ChartOverrides::new()).unwrap();
        assert!(chart.contributes_to(&LatLonEnvelope::new(44.8, 46.0, -71.0, -69.0)));
        assert!(!chart.contributes_to(&LatLonEnvelope::new(30.0, 31.0, -71.0, -69.0)));
        assert!(!chart.contributes_to(&LatLonEnvelope::new(44.0, 45.0, -60.0, -50.0)));
    }

    #[test]
    fn test_indefinite_chart_never_expires() {
        let chart = Chart::from_line(BOX_LINE, &ChartOverrides::new()).unwrap();
        assert!(!chart.is_expired());
    }
}
