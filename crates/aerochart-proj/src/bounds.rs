//! Charted-area bounds: which pixels of a chart are map and which are legend.
//!
//! A point is charted when it passes both a pixel test (rectangle or polygon
//! outline) and a lat/lon envelope test.

use tracing::warn;

use crate::geo::{eastmost, normal_lon, westmost, LatLonEnvelope, Pixel};
use crate::overrides::{ChartedLimits, GeoEdge, LimitField, Outline, PixelEdge};
use crate::projection::Projection;

/// An inclusive axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl PixelRect {
    /// Whether the pixel lies within the rectangle, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// The pixel part of a chart's charted area.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelArea {
    /// Rectangular charted area.
    Rect(PixelRect),
    /// Closed polygon; the last vertex connects back to the first.
    Polygon(Vec<Pixel>),
}

impl PixelArea {
    /// Whether the pixel lies in the charted area.
    ///
    /// Points exactly on a polygon edge or vertex count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            PixelArea::Rect(rect) => rect.contains(x, y),
            PixelArea::Polygon(vertices) => {
                on_boundary(x, y, vertices) || winding_number(x, y, vertices) != 0
            }
        }
    }
}

/// Signed area test: positive when `(x, y)` is left of the line `p0 -> p1`.
fn is_left(p0: &Pixel, p1: &Pixel, x: f64, y: f64) -> f64 {
    (p1.x - p0.x) * (y - p0.y) - (x - p0.x) * (p1.y - p0.y)
}

fn edges(vertices: &[Pixel]) -> impl Iterator<Item = (&Pixel, &Pixel)> {
    vertices.iter().zip(vertices.iter().cycle().skip(1))
}

/// Winding number of the closed polygon around `(x, y)`; zero only when the
/// point is outside. Either vertex orientation is accepted.
pub fn winding_number(x: f64, y: f64, vertices: &[Pixel]) -> i32 {
    let mut wn = 0;
    for (r, s) in edges(vertices) {
        if r.y <= y {
            if s.y > y && is_left(r, s, x, y) > 0.0 {
                wn += 1;
            }
        } else if s.y <= y && is_left(r, s, x, y) < 0.0 {
            wn -= 1;
        }
    }
    wn
}

fn on_boundary(x: f64, y: f64, vertices: &[Pixel]) -> bool {
    edges(vertices).any(|(r, s)| {
        let length = r.distance(s);
        let within_x = x >= r.x.min(s.x) && x <= r.x.max(s.x);
        let within_y = y >= r.y.min(s.y) && y <= r.y.max(s.y);
        within_x && within_y && is_left(r, s, x, y).abs() <= 1e-9 * length.max(1.0)
    })
}

/// Where a chart's map ends and its legend begins.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartedAreaBounds {
    /// Pixel test.
    pub area: PixelArea,
    /// Lat/lon test.
    pub envelope: LatLonEnvelope,
    /// Ordering hint for automatic chart selection, if given.
    pub auto_order: Option<i32>,
}

impl ChartedAreaBounds {
    /// Bounds covering the whole chart, with the envelope taken from the
    /// four unprojected corners.
    pub fn whole_chart(projection: &Projection) -> Self {
        let (width, height) = projection.dimensions();
        let (w, h) = (width as f64, height as f64);
        let nw = projection.unproject(Pixel::new(0.0, 0.0));
        let ne = projection.unproject(Pixel::new(w, 0.0));
        let sw = projection.unproject(Pixel::new(0.0, h));
        let se = projection.unproject(Pixel::new(w, h));

        let west = westmost(nw.lon, sw.lon);
        let mut east = eastmost(ne.lon, se.lon);
        // side edges on the same meridian: either no width or a full turn
        let middle = projection.unproject(Pixel::new(w / 2.0, h / 2.0));
        if east == west && normal_lon(middle.lon) != west {
            east = west + 360.0;
        }

        Self {
            area: PixelArea::Rect(PixelRect {
                left: 0.0,
                right: w,
                top: 0.0,
                bottom: h,
            }),
            envelope: LatLonEnvelope::new(
                sw.lat.min(se.lat),
                nw.lat.max(ne.lat),
                west,
                east,
            ),
            auto_order: None,
        }
    }

    /// Computes a chart's bounds from its projection and optional override
    /// and outline data.
    ///
    /// Override fields replace individual edges. An outline replaces the
    /// pixel test; an outline that cannot be parsed is logged and ignored.
    pub fn build(
        projection: &Projection,
        chart: &str,
        limits: Option<&ChartedLimits>,
        outline: Option<&str>,
    ) -> Self {
        let mut bounds = Self::whole_chart(projection);
        if let Some(limits) = limits {
            bounds.apply_limits(limits);
        }
        if let Some(raw) = outline {
            match Outline::parse(chart, raw) {
                Ok(outline) => bounds.apply_outline(outline),
                Err(e) => warn!(chart, error = %e, "ignoring chart outline"),
            }
        }
        bounds
    }

    fn apply_limits(&mut self, limits: &ChartedLimits) {
        let PixelArea::Rect(mut rect) = self.area.clone() else {
            return;
        };
        let env = &self.envelope;
        let (mut south, mut north, mut west, mut east) = (env.south, env.north, env.west, env.east);

        // earlier fields take precedence, so apply them last
        for field in limits.fields.iter().rev() {
            match *field {
                LimitField::AutoOrder(order) => self.auto_order = Some(order),
                LimitField::Pixel(edge, value) => {
                    let value = value as f64;
                    match edge {
                        PixelEdge::Left => rect.left = value,
                        PixelEdge::Right => rect.right = value,
                        PixelEdge::Top => rect.top = value,
                        PixelEdge::Bottom => rect.bottom = value,
                    }
                }
                LimitField::LatLon(edge, value) => match edge {
                    GeoEdge::North => north = value,
                    GeoEdge::South => south = value,
                    GeoEdge::West => west = value,
                    GeoEdge::East => east = value,
                },
            }
        }

        self.area = PixelArea::Rect(rect);
        self.envelope = LatLonEnvelope::new(south, north, west, east);
    }

    fn apply_outline(&mut self, outline: Outline) {
        self.area = match outline {
            Outline::Rect(a, b) => PixelArea::Rect(PixelRect {
                left: a.x.min(b.x).round(),
                right: a.x.max(b.x).round(),
                top: a.y.min(b.y).round(),
                bottom: a.y.max(b.y).round(),
            }),
            Outline::Polygon(vertices) => PixelArea::Polygon(vertices),
        };
    }

    /// Pixel part of the charted test.
    pub fn contains_pixel(&self, x: f64, y: f64) -> bool {
        self.area.contains(x, y)
    }

    /// Lat/lon part of the charted test.
    pub fn contains_lat_lon(&self, lat: f64, lon: f64) -> bool {
        self.envelope.contains(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionParams;
    use approx::assert_abs_diff_eq;

    fn l_shape() -> Vec<Pixel> {
        vec![
            Pixel::new(0.0, 0.0),
            Pixel::new(100.0, 0.0),
            Pixel::new(100.0, 40.0),
            Pixel::new(40.0, 40.0),
            Pixel::new(40.0, 100.0),
            Pixel::new(0.0, 100.0),
        ]
    }

    fn box_projection() -> Projection {
        let (params, _) = ProjectionParams::parse("box:45,-72,44,-70,2000,1500,0,0,Test Box 1").unwrap();
        params.build(2000, 1500, "Test Box 1").unwrap()
    }

    #[test]
    fn test_winding_number_inside_and_outside() {
        let area = PixelArea::Polygon(l_shape());
        assert!(area.contains(20.0, 20.0));
        assert!(area.contains(80.0, 20.0));
        assert!(area.contains(20.0, 80.0));
        assert!(!area.contains(80.0, 80.0));
        assert!(!area.contains(-1.0, 50.0));
        assert!(!area.contains(50.0, 101.0));
    }

    #[test]
    fn test_winding_number_on_boundary_is_inside() {
        let area = PixelArea::Polygon(l_shape());
        assert!(area.contains(100.0, 20.0));
        assert!(area.contains(70.0, 40.0));
        assert!(area.contains(40.0, 70.0));
        assert!(area.contains(0.0, 0.0));
        assert!(area.contains(40.0, 40.0));
        assert!(area.contains(0.0, 100.0));
    }

    #[test]
    fn test_winding_orientation_does_not_matter() {
        let mut reversed = l_shape();
        reversed.reverse();
        let cw = winding_number(20.0, 20.0, &l_shape());
        let ccw = winding_number(20.0, 20.0, &reversed);
        assert_eq!(cw, -ccw);
        assert_ne!(cw, 0);
        assert!(PixelArea::Polygon(reversed).contains(20.0, 80.0));
    }

    #[test]
    fn test_whole_chart_defaults() {
        let bounds = ChartedAreaBounds::whole_chart(&box_projection());
        assert_eq!(
            bounds.area,
            PixelArea::Rect(PixelRect {
                left: 0.0,
                right: 2000.0,
                top: 0.0,
                bottom: 1500.0
            })
        );
        assert_abs_diff_eq!(bounds.envelope.north, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.envelope.south, 44.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.envelope.west, -72.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.envelope.east, -70.0, epsilon = 1e-9);
        assert!(bounds.contains_pixel(2000.0, 1500.0));
        assert!(!bounds.contains_pixel(2000.5, 10.0));
    }

    #[test]
    fn test_limits_override_edges() {
        let limits = ChartedLimits::parse_record(&[
            "#120L".to_string(),
            "#1900R".to_string(),
            "44^30N".to_string(),
            "-71.5W".to_string(),
            "@3".to_string(),
            "Test Box".to_string(),
        ])
        .unwrap();
        let bounds = ChartedAreaBounds::build(&box_projection(), "Test Box", Some(&limits), None);
        assert_eq!(
            bounds.area,
            PixelArea::Rect(PixelRect {
                left: 120.0,
                right: 1900.0,
                top: 0.0,
                bottom: 1500.0
            })
        );
        assert_abs_diff_eq!(bounds.envelope.north, 44.5, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.envelope.west, -71.5, epsilon = 1e-9);
        assert_eq!(bounds.auto_order, Some(3));
        assert!(!bounds.contains_lat_lon(44.6, -71.0));
        assert!(!bounds.contains_lat_lon(44.2, -71.8));
        assert!(bounds.contains_lat_lon(44.2, -71.0));
    }

    #[test]
    fn test_earliest_limit_wins() {
        let limits = ChartedLimits::parse_record(&[
            "#10L".to_string(),
            "#20L".to_string(),
            "Test Box".to_string(),
        ])
        .unwrap();
        let bounds = ChartedAreaBounds::build(&box_projection(), "Test Box", Some(&limits), None);
        match bounds.area {
            PixelArea::Rect(rect) => assert_eq!(rect.left, 10.0),
            other => panic!("unexpected area {other:?}"),
        }
    }

    #[test]
    fn test_outline_replaces_pixel_test() {
        let bounds = ChartedAreaBounds::build(
            &box_projection(),
            "Test Box",
            None,
            Some("0,0/1000,0/1000,600/400,600/400,1500/0,1500"),
        );
        assert!(matches!(bounds.area, PixelArea::Polygon(ref v) if v.len() == 6));
        assert!(bounds.contains_pixel(100.0, 1400.0));
        assert!(!bounds.contains_pixel(1500.0, 1400.0));
    }

    #[test]
    fn test_two_point_outline_is_rectangle() {
        let bounds = ChartedAreaBounds::build(
            &box_projection(),
            "Test Box",
            None,
            Some("1900.4,1400.6/100.2,50.5"),
        );
        assert_eq!(
            bounds.area,
            PixelArea::Rect(PixelRect {
                left: 100.0,
                right: 1900.0,
                top: 51.0,
                bottom: 1401.0
            })
        );
    }

    #[test]
    fn test_bad_outline_falls_back_to_rectangle() {
        let bounds = ChartedAreaBounds::build(&box_projection(), "Test Box", None, Some("10,20"));
        assert!(matches!(bounds.area, PixelArea::Rect(_)));
        let bounds =
            ChartedAreaBounds::build(&box_projection(), "Test Box", None, Some("10,20/x,5/3,4"));
        assert!(matches!(bounds.area, PixelArea::Rect(_)));
    }
}
