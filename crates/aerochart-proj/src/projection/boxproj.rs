//! Linear lat/lon box projection.

use super::{parse_fields, split_leading};
use crate::error::ChartError;
use crate::geo::{lon_extent, normal_lon, LatLon, Pixel};
use crate::Result;

/// Edges of a box chart as read from `box:latN,lonW,latS,lonE,...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxParams {
    /// Latitude of the top edge.
    pub north: f64,
    /// Longitude of the left edge.
    pub west: f64,
    /// Latitude of the bottom edge.
    pub south: f64,
    /// Longitude of the right edge.
    pub east: f64,
}

impl BoxParams {
    pub(crate) fn parse(line: &str) -> Result<(Self, String)> {
        let (fields, rest) = split_leading(line, 4)
            .ok_or_else(|| ChartError::MalformedDescriptor(format!("box: {line}")))?;
        let [north, west, south, east] = parse_fields(
            ["north latitude", "west longitude", "south latitude", "east longitude"],
            &fields,
        )?;
        Ok((
            Self {
                north,
                west,
                south,
                east,
            },
            rest.to_string(),
        ))
    }
}

/// A chart whose pixels are linear in latitude and longitude.
#[derive(Debug, Clone)]
pub struct BoxProjection {
    north: f64,
    south: f64,
    west: f64,
    /// Always greater than `west`, possibly beyond 180.
    east: f64,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl BoxProjection {
    pub(crate) fn new(params: &BoxParams, width: u32, height: u32) -> Self {
        let (west, east) = lon_extent(params.west, params.east);
        Self {
            north: params.north,
            south: params.south,
            west,
            east,
            width,
            height,
        }
    }

    pub(crate) fn project(&self, lat: f64, lon: f64) -> Pixel {
        // keep the longitude within half a turn of the box's center
        let center = (self.west + self.east) / 2.0;
        let mut lon = lon;
        while lon < center - 180.0 {
            lon += 360.0;
        }
        while lon >= center + 180.0 {
            lon -= 360.0;
        }
        let x = (lon - self.west) / (self.east - self.west) * self.width as f64;
        let y = (self.north - lat) / (self.north - self.south) * self.height as f64;
        Pixel::new(x, y)
    }

    pub(crate) fn unproject(&self, pixel: Pixel) -> LatLon {
        let lat = self.north - pixel.y / self.height as f64 * (self.north - self.south);
        let lon = self.west + pixel.x / self.width as f64 * (self.east - self.west);
        LatLon::new(lat, normal_lon(lon))
    }
}
