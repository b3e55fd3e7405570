//! Chart projections.
//!
//! A chart descriptor line starts with projection-specific fields followed by
//! a shared suffix (`width,height,effective,expiration,name`). The leading
//! prefix selects the projection:
//!
//! | prefix | projection |
//! |--------|------------|
//! | none   | Lambert conformal conic, calibrated by a world file |
//! | `psp:` | Polar stereographic, calibrated by the four chart corners |
//! | `box:` | Linear lat/lon box |
//!
//! Parsing is split in two steps. [`ProjectionParams::parse`] consumes the
//! projection fields and hands back the shared suffix; once the chart size is
//! known, [`ProjectionParams::build`] derives the constants each projection
//! needs and yields a [`Projection`].

mod boxproj;
mod lcc;
mod psp;

pub use boxproj::{BoxParams, BoxProjection};
pub use lcc::{ConformalConic, ConformalConicParams, MAX_INVERSE_ITERATIONS};
pub use psp::{PolarStereographic, PolarStereographicParams};

use crate::error::ChartError;
use crate::geo::{LatLon, Pixel};
use crate::Result;

const PSP_PREFIX: &str = "psp:";
const BOX_PREFIX: &str = "box:";

/// Projection parameters as read from a descriptor line.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionParams {
    /// Lambert conformal conic.
    ConformalConic(ConformalConicParams),
    /// Polar stereographic.
    PolarStereographic(PolarStereographicParams),
    /// Linear lat/lon box.
    Box(BoxParams),
}

impl ProjectionParams {
    /// Parses the projection fields of a descriptor line.
    ///
    /// Returns the parameters and the remaining shared suffix, with the
    /// suffix fields in their original order.
    pub fn parse(line: &str) -> Result<(Self, String)> {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(PSP_PREFIX) {
            let (params, suffix) = PolarStereographicParams::parse(rest)?;
            Ok((ProjectionParams::PolarStereographic(params), suffix))
        } else if let Some(rest) = line.strip_prefix(BOX_PREFIX) {
            let (params, suffix) = BoxParams::parse(rest)?;
            Ok((ProjectionParams::Box(params), suffix))
        } else {
            let (params, suffix) = ConformalConicParams::parse(line)?;
            Ok((ProjectionParams::ConformalConic(params), suffix))
        }
    }

    /// Derives the projection for a chart of the given pixel size.
    pub fn build(&self, width: u32, height: u32, chart: &str) -> Result<Projection> {
        let projection = match self {
            ProjectionParams::ConformalConic(p) => {
                Projection::ConformalConic(ConformalConic::new(p, width, height, chart)?)
            }
            ProjectionParams::PolarStereographic(p) => {
                Projection::PolarStereographic(PolarStereographic::new(p, width, height, chart)?)
            }
            ProjectionParams::Box(p) => Projection::Box(BoxProjection::new(p, width, height)),
        };
        Ok(projection)
    }
}

/// A projection bound to a chart's pixel extent.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Lambert conformal conic.
    ConformalConic(ConformalConic),
    /// Polar stereographic.
    PolarStereographic(PolarStereographic),
    /// Linear lat/lon box.
    Box(BoxProjection),
}

impl Projection {
    /// Maps a coordinate to chart pixels.
    ///
    /// The flag reports whether the pixel lies within the chart's nominal
    /// extent (`0 <= x < width` and `0 <= y < height`). The pixel is returned
    /// either way.
    pub fn project(&self, lat: f64, lon: f64) -> (Pixel, bool) {
        let pixel = match self {
            Projection::ConformalConic(p) => p.project(lat, lon),
            Projection::PolarStereographic(p) => p.project(lat, lon),
            Projection::Box(p) => p.project(lat, lon),
        };
        let in_bounds = self.contains_pixel(pixel);
        (pixel, in_bounds)
    }

    /// Maps a chart pixel back to a coordinate with normalized longitude.
    pub fn unproject(&self, pixel: Pixel) -> LatLon {
        match self {
            Projection::ConformalConic(p) => p.unproject(pixel),
            Projection::PolarStereographic(p) => p.unproject(pixel),
            Projection::Box(p) => p.unproject(pixel),
        }
    }

    /// Chart size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Projection::ConformalConic(p) => (p.width, p.height),
            Projection::PolarStereographic(p) => (p.width, p.height),
            Projection::Box(p) => (p.width, p.height),
        }
    }

    /// Short name of the projection kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Projection::ConformalConic(_) => "lambert",
            Projection::PolarStereographic(_) => "polar",
            Projection::Box(_) => "box",
        }
    }

    fn contains_pixel(&self, pixel: Pixel) -> bool {
        let (width, height) = self.dimensions();
        pixel.x >= 0.0 && pixel.x < width as f64 && pixel.y >= 0.0 && pixel.y < height as f64
    }
}

/// Splits off the first `count` comma-separated fields of `line`.
///
/// Returns the fields and whatever follows the last separator.
pub(crate) fn split_leading<'a>(line: &'a str, count: usize) -> Option<(Vec<&'a str>, &'a str)> {
    let mut parts: Vec<&str> = line.splitn(count + 1, ',').collect();
    if parts.len() != count + 1 {
        return None;
    }
    let rest = parts.pop()?;
    Some((parts, rest))
}

/// Parses one numeric descriptor field.
pub(crate) fn parse_field(field: &'static str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| ChartError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

/// Parses a slice of numeric fields against their names.
pub(crate) fn parse_fields<const N: usize>(
    names: [&'static str; N],
    raw: &[&str],
) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for (i, name) in names.iter().enumerate() {
        out[i] = parse_field(name, raw[i])?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_selects_projection() {
        let (params, suffix) =
            ProjectionParams::parse("box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1").unwrap();
        assert!(matches!(params, ProjectionParams::Box(_)));
        assert_eq!(suffix, "2000,1500,20240101,0,Test Box 1");

        let (params, _) = ProjectionParams::parse(
            "psp:88,-36,80,24,4337,87,5737,199,1118,4690,8090,5279,9254,6693,19690603,99999999,ONC A-1 19690603",
        )
        .unwrap();
        assert!(matches!(params, ProjectionParams::PolarStereographic(_)));
    }

    #[test]
    fn test_conformal_conic_suffix_keeps_field_order() {
        let line = "38.5,-73.5,33,45,16645,12349,6378137,6356752.314245,\
                    42.334,0,0,-42.334,-352324.7,261391.3,20190425,20191017,New York SEC 103";
        let (params, suffix) = ProjectionParams::parse(line).unwrap();
        assert!(matches!(params, ProjectionParams::ConformalConic(_)));
        assert_eq!(suffix, "16645,12349,20190425,20191017,New York SEC 103");
    }

    #[test]
    fn test_short_line_is_rejected() {
        assert!(matches!(
            ProjectionParams::parse("box:45,-72,44"),
            Err(ChartError::MalformedDescriptor(_))
        ));
        assert!(matches!(
            ProjectionParams::parse("38.5,-73.5,33"),
            Err(ChartError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn test_bad_number_names_field() {
        let err = ProjectionParams::parse("box:north,-72,44,-70,2000,1500,0,0,X 1").unwrap_err();
        match err {
            ChartError::InvalidField { field, value } => {
                assert_eq!(field, "north latitude");
                assert_eq!(value, "north");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_in_bounds_flag_is_half_open() {
        let (params, _) =
            ProjectionParams::parse("box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1").unwrap();
        let proj = params.build(2000, 1500, "Test Box 1").unwrap();
        assert!(proj.project(45.0, -72.0).1);
        assert!(!proj.project(44.0, -70.0).1);
        assert!(!proj.project(46.0, -71.0).1);
        assert_eq!(proj.kind(), "box");
    }
}
