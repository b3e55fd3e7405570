//! Polar stereographic projection calibrated from chart corners.
//!
//! The left and right chart edges are meridians, so extending them locates
//! the north pole in pixel space. Distance from the pole scales with
//! `tan((90 - lat) / 2)`.

use super::{parse_fields, split_leading};
use crate::error::ChartError;
use crate::geo::{line_intersect, normal_lon, LatLon, Pixel};
use crate::Result;

/// Descriptor fields of a polar stereographic chart:
/// `latN,lonW,latS,lonE,nwX,nwY,neX,neY,swX,swY,seX,seY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarStereographicParams {
    /// Latitude of the top corners.
    pub north: f64,
    /// Meridian of the left edge.
    pub west: f64,
    /// Latitude of the bottom corners.
    pub south: f64,
    /// Meridian of the right edge.
    pub east: f64,
    /// Top-left corner pixel.
    pub nw: Pixel,
    /// Top-right corner pixel.
    pub ne: Pixel,
    /// Bottom-left corner pixel.
    pub sw: Pixel,
    /// Bottom-right corner pixel.
    pub se: Pixel,
}

impl PolarStereographicParams {
    pub(crate) fn parse(line: &str) -> Result<(Self, String)> {
        let (fields, rest) = split_leading(line, 12)
            .ok_or_else(|| ChartError::MalformedDescriptor(format!("psp: {line}")))?;
        let [north, west, south, east, nwx, nwy, nex, ney, swx, swy, sex, sey] = parse_fields(
            [
                "north latitude",
                "west longitude",
                "south latitude",
                "east longitude",
                "nw x",
                "nw y",
                "ne x",
                "ne y",
                "sw x",
                "sw y",
                "se x",
                "se y",
            ],
            &fields,
        )?;
        Ok((
            Self {
                north,
                west,
                south,
                east,
                nw: Pixel::new(nwx, nwy),
                ne: Pixel::new(nex, ney),
                sw: Pixel::new(swx, swy),
                se: Pixel::new(sex, sey),
            },
            rest.to_string(),
        ))
    }
}

/// A calibrated polar stereographic chart.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    pole: Pixel,
    /// Pixel distance from the pole per unit of `tan(colatitude / 2)`.
    earth_pixels: f64,
    /// Screen angle of longitude zero, radians.
    tilt: f64,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl PolarStereographic {
    pub(crate) fn new(
        p: &PolarStereographicParams,
        width: u32,
        height: u32,
        chart: &str,
    ) -> Result<Self> {
        let pole = line_intersect(p.nw, p.sw, p.ne, p.se)
            .ok_or_else(|| ChartError::ParallelEdges(chart.to_string()))?;

        let half_colat = (90.0 - p.south).to_radians() / 2.0;
        let earth_pixels = pole.distance(&p.sw) / half_colat.tan();
        if !earth_pixels.is_finite() || earth_pixels <= 0.0 {
            return Err(ChartError::MalformedDescriptor(format!(
                "{chart}: south latitude {}",
                p.south
            )));
        }
        let tilt = (p.sw.x - pole.x).atan2(p.sw.y - pole.y) - p.west.to_radians();

        Ok(Self {
            pole,
            earth_pixels,
            tilt,
            width,
            height,
        })
    }

    pub(crate) fn project(&self, lat: f64, lon: f64) -> Pixel {
        let r = ((90.0 - lat).to_radians() / 2.0).tan() * self.earth_pixels;
        let a = lon.to_radians() + self.tilt;
        Pixel::new(r * a.sin() + self.pole.x, r * a.cos() + self.pole.y)
    }

    pub(crate) fn unproject(&self, pixel: Pixel) -> LatLon {
        let dx = pixel.x - self.pole.x;
        let dy = pixel.y - self.pole.y;
        let r = dx.hypot(dy);
        let lat = 90.0 - (2.0 * (r / self.earth_pixels).atan()).to_degrees();
        let lon = (dx.atan2(dy) - self.tilt).to_degrees();
        LatLon::new(lat, normal_lon(lon))
    }
}
