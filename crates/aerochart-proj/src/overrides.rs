//! Hand-maintained charted-area data.
//!
//! `chartedlims.csv` holds one record per chart; the last field is the chart
//! name without revision and the others adjust individual limits:
//!
//! - `@N` sets the automatic-ordering hint.
//! - `#<int><D>` sets a pixel edge, `D` one of `L`/`W`, `R`/`E`, `T`/`N`,
//!   `B`/`S`.
//! - `<deg>[^<min>]<D>` sets a latitude or longitude edge, `D` one of
//!   `N`, `S`, `E`, `W`.
//!
//! `outlines.txt` holds `Name: x,y/x,y/...` lines giving the charted pixel
//! area as a polygon, or as a rectangle when only two corners are given.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ChartError;
use crate::geo::Pixel;
use crate::Result;

/// A pixel edge named by a `#` limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEdge {
    /// Leftmost charted column.
    Left,
    /// Rightmost charted column.
    Right,
    /// Topmost charted row.
    Top,
    /// Bottommost charted row.
    Bottom,
}

/// A geographic edge named by a lat/lon limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoEdge {
    /// Northern latitude.
    North,
    /// Southern latitude.
    South,
    /// Eastern longitude.
    East,
    /// Western longitude.
    West,
}

/// One field of a `chartedlims.csv` record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitField {
    /// `@N`
    AutoOrder(i32),
    /// `#<int><D>`
    Pixel(PixelEdge, i32),
    /// `<deg>[^<min>]<D>`
    LatLon(GeoEdge, f64),
}

impl LimitField {
    /// Parses one field; `None` when it is not understood.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(order) = raw.strip_prefix('@') {
            return order.parse().ok().map(LimitField::AutoOrder);
        }
        let dir = raw.chars().last()?;
        let body = &raw[..raw.len() - dir.len_utf8()];
        if let Some(pixels) = body.strip_prefix('#') {
            let value: i32 = pixels.parse().ok()?;
            let edge = match dir {
                'E' | 'R' => PixelEdge::Right,
                'N' | 'T' => PixelEdge::Top,
                'S' | 'B' => PixelEdge::Bottom,
                'W' | 'L' => PixelEdge::Left,
                _ => return None,
            };
            return Some(LimitField::Pixel(edge, value));
        }
        let value = parse_degrees(body)?;
        let edge = match dir {
            'N' => GeoEdge::North,
            'S' => GeoEdge::South,
            'E' => GeoEdge::East,
            'W' => GeoEdge::West,
            _ => return None,
        };
        Some(LimitField::LatLon(edge, value))
    }
}

/// `deg` or `deg^min`.
///
/// Minutes take the sign of the degrees, so `-73^30` is 73 degrees 30
/// minutes west (-73.5) rather than -73 plus half a degree (-72.5). A
/// negative zero keeps its sign: `-0^30` is -0.5.
fn parse_degrees(raw: &str) -> Option<f64> {
    match raw.split_once('^') {
        None => raw.parse().ok(),
        Some((deg, min)) => {
            let deg: f64 = deg.parse().ok()?;
            let min: f64 = min.parse().ok()?;
            let sign = if deg.is_sign_negative() { -1.0 } else { 1.0 };
            Some(deg + sign * min / 60.0)
        }
    }
}

/// The parsed `chartedlims.csv` record for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartedLimits {
    /// Chart name without revision.
    pub chart: String,
    /// Limit fields in file order.
    pub fields: Vec<LimitField>,
}

impl ChartedLimits {
    /// Parses a record whose last field is the chart name.
    pub fn parse_record(record: &[String]) -> Result<Self> {
        let (chart, raw_fields) = record
            .split_last()
            .ok_or_else(|| ChartError::MalformedDescriptor("empty charted limits record".into()))?;
        let chart = chart.trim().to_string();
        let fields = raw_fields
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                LimitField::parse(raw).ok_or_else(|| ChartError::InvalidOverride {
                    chart: chart.clone(),
                    entry: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { chart, fields })
    }
}

/// A parsed outline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// Two opposite corners of a rectangle.
    Rect(Pixel, Pixel),
    /// Polygon vertices, implicitly closed.
    Polygon(Vec<Pixel>),
}

impl Outline {
    /// Parses the `x,y/x,y/...` part of an outline line.
    pub fn parse(chart: &str, raw: &str) -> Result<Self> {
        let invalid = |reason: String| ChartError::InvalidOutline {
            chart: chart.to_string(),
            reason,
        };
        let points = raw
            .split('/')
            .map(|pair| {
                let (x, y) = pair
                    .split_once(',')
                    .filter(|(_, y)| !y.contains(','))
                    .ok_or_else(|| invalid(format!("bad x,y {pair:?}")))?;
                let x: f64 = x.trim().parse().map_err(|_| invalid(format!("bad x in {pair:?}")))?;
                let y: f64 = y.trim().parse().map_err(|_| invalid(format!("bad y in {pair:?}")))?;
                Ok(Pixel::new(x, y))
            })
            .collect::<Result<Vec<_>>>()?;
        match points.len() {
            0 | 1 => Err(invalid("too few points".to_string())),
            2 => Ok(Outline::Rect(points[0], points[1])),
            _ => Ok(Outline::Polygon(points)),
        }
    }
}

/// Override and outline data for every chart, keyed by name without
/// revision.
#[derive(Debug, Clone, Default)]
pub struct ChartOverrides {
    limits: HashMap<String, Vec<String>>,
    outlines: HashMap<String, String>,
}

impl ChartOverrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `chartedlims.csv`. A missing file leaves the table empty.
    pub fn load_limits_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        match fs::File::open(path) {
            Ok(file) => self.load_limits(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no charted limits file");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads charted-limits records from a reader.
    pub fn load_limits<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .double_quote(false)
            .escape(Some(b'\\'))
            .from_reader(reader);
        let mut count = 0;
        for record in csv.records() {
            let record = record?;
            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            if let Some(name) = fields.last() {
                self.limits.insert(name.trim().to_string(), fields);
                count += 1;
            }
        }
        Ok(count)
    }

    /// Loads `outlines.txt`. A missing file leaves the table empty.
    pub fn load_outlines_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Ok(self.load_outlines(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no outlines file");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads outline lines from text. Lines without a `:` are skipped.
    pub fn load_outlines(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                Some((name, outline)) => {
                    self.outlines
                        .insert(name.trim().to_string(), outline.trim().to_string());
                    count += 1;
                }
                None => warn!(line, "skipping outline line without chart name"),
            }
        }
        count
    }

    /// Parsed limits for a chart, if it has any.
    pub fn limits_for(&self, chart: &str) -> Result<Option<ChartedLimits>> {
        self.limits
            .get(chart)
            .map(|record| ChartedLimits::parse_record(record))
            .transpose()
    }

    /// Raw outline text for a chart, if it has one.
    pub fn outline_for(&self, chart: &str) -> Option<&str> {
        self.outlines.get(chart).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_limit_fields() {
        assert_eq!(LimitField::parse("@12"), Some(LimitField::AutoOrder(12)));
        assert_eq!(LimitField::parse("#250T"), Some(LimitField::Pixel(PixelEdge::Top, 250)));
        assert_eq!(LimitField::parse("#250N"), Some(LimitField::Pixel(PixelEdge::Top, 250)));
        assert_eq!(LimitField::parse("#9E"), Some(LimitField::Pixel(PixelEdge::Right, 9)));
        assert_eq!(LimitField::parse("#9B"), Some(LimitField::Pixel(PixelEdge::Bottom, 9)));
        assert_eq!(LimitField::parse("#9L"), Some(LimitField::Pixel(PixelEdge::Left, 9)));
        assert_eq!(LimitField::parse("40N"), Some(LimitField::LatLon(GeoEdge::North, 40.0)));
        assert_eq!(LimitField::parse("#9Q"), None);
        assert_eq!(LimitField::parse("40R"), None);
        assert_eq!(LimitField::parse("abcN"), None);
        assert_eq!(LimitField::parse(""), None);
    }

    #[test]
    fn test_degrees_and_minutes() {
        match LimitField::parse("-73^30W") {
            Some(LimitField::LatLon(GeoEdge::West, v)) => assert_abs_diff_eq!(v, -73.5),
            other => panic!("unexpected {other:?}"),
        }
        match LimitField::parse("40^15S") {
            Some(LimitField::LatLon(GeoEdge::South, v)) => assert_abs_diff_eq!(v, 40.25),
            other => panic!("unexpected {other:?}"),
        }
        match LimitField::parse("-0^30E") {
            Some(LimitField::LatLon(GeoEdge::East, v)) => assert_abs_diff_eq!(v, -0.5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_field_fails_record() {
        let record = vec!["#12Q".to_string(), "New York SEC".to_string()];
        assert!(matches!(
            ChartedLimits::parse_record(&record),
            Err(ChartError::InvalidOverride { ref chart, .. }) if chart == "New York SEC"
        ));
    }

    #[test]
    fn test_load_tables() {
        let mut overrides = ChartOverrides::new();
        let n = overrides
            .load_limits("#100L,44N,New York SEC\n@2,\"Anchorage, AK TAC\"\n".as_bytes())
            .unwrap();
        assert_eq!(n, 2);
        let limits = overrides.limits_for("New York SEC").unwrap().unwrap();
        assert_eq!(limits.fields.len(), 2);
        let tac = overrides.limits_for("Anchorage, AK TAC").unwrap().unwrap();
        assert_eq!(tac.fields, vec![LimitField::AutoOrder(2)]);
        assert!(overrides.limits_for("Nowhere").unwrap().is_none());

        let n = overrides.load_outlines("New York SEC: 1,2/3,4/5,6\nbogus\n\n");
        assert_eq!(n, 1);
        assert_eq!(overrides.outline_for("New York SEC"), Some("1,2/3,4/5,6"));
    }

    #[test]
    fn test_outline_parse() {
        assert!(matches!(Outline::parse("X", "1,2/3,4"), Ok(Outline::Rect(_, _))));
        assert!(matches!(Outline::parse("X", "1,2/3,4/5,6"), Ok(Outline::Polygon(ref v)) if v.len() == 3));
        assert!(Outline::parse("X", "1,2").is_err());
        assert!(Outline::parse("X", "1,2/3,4,5").is_err());
        assert!(Outline::parse("X", "1,2/3;4").is_err());
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = ChartOverrides::new();
        assert_eq!(overrides.load_limits_file(dir.path().join("chartedlims.csv")).unwrap(), 0);
        assert_eq!(overrides.load_outlines_file(dir.path().join("outlines.txt")).unwrap(), 0);
    }
}
