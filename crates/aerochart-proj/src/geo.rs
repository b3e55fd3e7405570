//! Geographic primitives: coordinates, pixels, longitude arithmetic and
//! lat/lon envelopes that may straddle the antimeridian.

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl LatLon {
    /// Creates a coordinate.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A position in full-resolution chart pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    /// Column, increasing to the right.
    pub x: f64,
    /// Row, increasing downward.
    pub y: f64,
}

impl Pixel {
    /// Creates a pixel position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another pixel.
    pub fn distance(&self, other: &Pixel) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Normalizes a longitude into `[-180, 180)`.
pub fn normal_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Returns whichever of two longitudes lies further west, normalized.
///
/// The pair is taken to span less than 180 degrees, so `westmost(170, -170)`
/// is `170`.
pub fn westmost(lon1: f64, lon2: f64) -> f64 {
    let east_of_1 = (lon2 - lon1).rem_euclid(360.0);
    normal_lon(if east_of_1 < 180.0 { lon1 } else { lon2 })
}

/// Returns whichever of two longitudes lies further east, normalized.
pub fn eastmost(lon1: f64, lon2: f64) -> f64 {
    let east_of_1 = (lon2 - lon1).rem_euclid(360.0);
    normal_lon(if east_of_1 < 180.0 { lon2 } else { lon1 })
}

/// Normalized west and east edges of a longitude range running eastward
/// from `west` to `east`.
///
/// `east` ends up at or after `west`, possibly beyond 180. Edges that only
/// coincide after normalization, such as -180 and 180, span a full turn.
pub(crate) fn lon_extent(west: f64, east: f64) -> (f64, f64) {
    let (raw_west, raw_east) = (west, east);
    let west = normal_lon(west);
    let mut east = normal_lon(east);
    if east < west || (east == west && raw_east != raw_west) {
        east += 360.0;
    }
    (west, east)
}

/// Intersection of the line through `a0`,`a1` with the line through
/// `b0`,`b1`. Returns `None` when the lines are parallel.
pub fn line_intersect(a0: Pixel, a1: Pixel, b0: Pixel, b1: Pixel) -> Option<Pixel> {
    let (adx, ady) = (a1.x - a0.x, a1.y - a0.y);
    let (bdx, bdy) = (b1.x - b0.x, b1.y - b0.y);
    let denom = adx * bdy - ady * bdx;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((b0.x - a0.x) * bdy - (b0.y - a0.y) * bdx) / denom;
    Some(Pixel::new(a0.x + t * adx, a0.y + t * ady))
}

/// An inclusive latitude/longitude rectangle.
///
/// `west` is normalized to `[-180, 180)` and `east >= west`; an envelope
/// crossing the antimeridian carries `east > 180`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonEnvelope {
    /// Southern edge in degrees.
    pub south: f64,
    /// Northern edge in degrees.
    pub north: f64,
    /// Western edge in degrees, normalized.
    pub west: f64,
    /// Eastern edge in degrees, at or after `west`.
    pub east: f64,
}

impl LatLonEnvelope {
    /// Builds an envelope from arbitrary edge values.
    ///
    /// Both longitudes are normalized and `east` is moved a turn eastward
    /// when it would otherwise lie before `west`. Edges given as -180 and
    /// 180 make a whole-world envelope.
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        let (west, east) = lon_extent(west, east);
        Self {
            south: south.min(north),
            north: south.max(north),
            west,
            east,
        }
    }

    /// Longitudinal width in degrees.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Whether the coordinate lies within the envelope, edges included.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        let mut lon = normal_lon(lon);
        if lon < self.west {
            lon += 360.0;
        }
        lon <= self.east
    }

    /// Whether two envelopes share any area, edges included.
    pub fn overlaps(&self, other: &LatLonEnvelope) -> bool {
        if self.north < other.south || other.north < self.south {
            return false;
        }
        [-360.0, 0.0, 360.0].iter().any(|shift| {
            let (w, e) = (other.west + shift, other.east + shift);
            self.west <= e && w <= self.east
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_lon_range() {
        for raw in [-720.0, -540.5, -180.0, -0.0, 0.0, 179.999, 180.0, 359.0, 725.0] {
            let lon = normal_lon(raw);
            assert!((-180.0..180.0).contains(&lon), "{} -> {}", raw, lon);
        }
        assert_relative_eq!(normal_lon(180.0), -180.0);
        assert_relative_eq!(normal_lon(190.0), -170.0);
        assert_relative_eq!(normal_lon(-190.0), 170.0);
    }

    #[test]
    fn test_westmost_eastmost() {
        assert_relative_eq!(westmost(-72.0, -70.0), -72.0);
        assert_relative_eq!(westmost(-70.0, -72.0), -72.0);
        assert_relative_eq!(westmost(170.0, -170.0), 170.0);
        assert_relative_eq!(eastmost(170.0, -170.0), -170.0);
        assert_relative_eq!(eastmost(-170.0, 170.0), -170.0);
    }

    #[test]
    fn test_antimeridian_strip_is_twenty_degrees() {
        let env = LatLonEnvelope::new(50.0, 60.0, 170.0, -170.0);
        assert_relative_eq!(env.west, 170.0);
        assert_relative_eq!(env.east, 190.0);
        assert_relative_eq!(env.lon_span(), 20.0);

        assert!(env.contains(55.0, 175.0));
        assert!(env.contains(55.0, -175.0));
        assert!(env.contains(55.0, 180.0));
        assert!(env.contains(55.0, -170.0));
        assert!(!env.contains(55.0, -169.0));
        assert!(!env.contains(55.0, 0.0));
        assert!(!env.contains(61.0, 175.0));
    }

    #[test]
    fn test_world_envelope_spans_full_turn() {
        let env = LatLonEnvelope::new(-90.0, 90.0, -180.0, 180.0);
        assert_relative_eq!(env.west, -180.0);
        assert_relative_eq!(env.east, 180.0);
        assert_relative_eq!(env.lon_span(), 360.0);
        assert!(env.contains(0.0, 0.0));
        assert!(env.contains(10.0, 179.9));
        assert!(env.contains(0.0, -180.0));
        assert!(env.contains(-45.0, 180.0));

        let degenerate = LatLonEnvelope::new(0.0, 1.0, 10.0, 10.0);
        assert_relative_eq!(degenerate.lon_span(), 0.0);
        assert!(!degenerate.contains(0.5, 11.0));
    }

    #[test]
    fn test_envelope_edges_inclusive() {
        let env = LatLonEnvelope::new(44.0, 45.0, -72.0, -70.0);
        assert!(env.contains(44.0, -72.0));
        assert!(env.contains(45.0, -70.0));
        assert!(!env.contains(45.0001, -71.0));
    }

    #[test]
    fn test_envelope_overlap_across_antimeridian() {
        let strip = LatLonEnvelope::new(50.0, 60.0, 170.0, -170.0);
        let west_side = LatLonEnvelope::new(52.0, 58.0, -175.0, -160.0);
        let far = LatLonEnvelope::new(52.0, 58.0, 0.0, 10.0);
        let south = LatLonEnvelope::new(10.0, 20.0, 175.0, 176.0);
        assert!(strip.overlaps(&west_side));
        assert!(west_side.overlaps(&strip));
        assert!(!strip.overlaps(&far));
        assert!(!strip.overlaps(&south));
    }

    #[test]
    fn test_line_intersect() {
        let p = line_intersect(
            Pixel::new(0.0, 0.0),
            Pixel::new(1.0, 1.0),
            Pixel::new(0.0, 2.0),
            Pixel::new(2.0, 0.0),
        )
        .expect("lines cross");
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);

        assert!(line_intersect(
            Pixel::new(0.0, 0.0),
            Pixel::new(1.0, 0.0),
            Pixel::new(0.0, 1.0),
            Pixel::new(1.0, 1.0),
        )
        .is_none());
    }
}
