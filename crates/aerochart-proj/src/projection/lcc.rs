//! Lambert conformal conic projection on an ellipsoid.
//!
//! Forward equations follow Snyder, *Map Projections: A Working Manual*
//! (USGS PP 1395), eqs 14-15, 15-7, 15-8, 15-9a, 15-10, 14-1, 14-2 and 14-4.
//! Projected metres are mapped to pixels through the inverse of the chart's
//! world-file calibration:
//!
//! ```text
//! easting  = A*x + C*y + E
//! northing = B*x + D*y + F
//! ```

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::debug;

use super::{parse_fields, split_leading};
use crate::error::ChartError;
use crate::geo::{normal_lon, LatLon, Pixel};
use crate::Result;

/// Upper bound on latitude refinement steps in [`ConformalConic::unproject`].
pub const MAX_INVERSE_ITERATIONS: usize = 32;

/// Latitudes are kept this far inside the poles while iterating.
const POLE_MARGIN: f64 = 1e-9;

/// Refinement stops once the northing error is below this fraction of a pixel.
const INVERSE_TOLERANCE_PIXELS: f64 = 0.125;

/// Descriptor fields of a conformal conic chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConformalConicParams {
    /// Latitude of the projection origin, degrees.
    pub center_lat: f64,
    /// Central meridian, degrees.
    pub center_lon: f64,
    /// First standard parallel, degrees.
    pub std_parallel_1: f64,
    /// Second standard parallel, degrees.
    pub std_parallel_2: f64,
    /// Ellipsoid semi-major axis, metres.
    pub semi_major: f64,
    /// Ellipsoid semi-minor axis, metres.
    pub semi_minor: f64,
    /// World-file calibration `[A, B, C, D, E, F]`.
    pub calibration: [f64; 6],
}

impl ConformalConicParams {
    /// Field layout:
    /// `centerLat,centerLon,stdPar1,stdPar2,width,height,a,b,A,B,C,D,E,F,<rest>`.
    pub(crate) fn parse(line: &str) -> Result<(Self, String)> {
        let (fields, rest) = split_leading(line, 14)
            .ok_or_else(|| ChartError::MalformedDescriptor(line.to_string()))?;
        let [center_lat, center_lon, std_parallel_1, std_parallel_2] = parse_fields(
            ["center latitude", "center longitude", "standard parallel 1", "standard parallel 2"],
            &fields[0..4],
        )?;
        let [semi_major, semi_minor, a, b, c, d, e, f] = parse_fields(
            [
                "semi-major axis",
                "semi-minor axis",
                "calibration A",
                "calibration B",
                "calibration C",
                "calibration D",
                "calibration E",
                "calibration F",
            ],
            &fields[6..14],
        )?;
        // width and height sit between the parallels and the ellipsoid
        let suffix = format!("{},{},{}", fields[4].trim(), fields[5].trim(), rest);
        Ok((
            Self {
                center_lat,
                center_lon,
                std_parallel_1,
                std_parallel_2,
                semi_major,
                semi_minor,
                calibration: [a, b, c, d, e, f],
            },
            suffix,
        ))
    }
}

/// A calibrated conformal conic chart.
#[derive(Debug, Clone)]
pub struct ConformalConic {
    center_lon: f64,
    center_lat: f64,
    a: f64,
    e: f64,
    e2: f64,
    n: f64,
    f_const: f64,
    rho0: f64,
    calibration: [f64; 6],
    /// Inverse calibration, projected metres to pixels.
    pixel_from_metres: [[f64; 3]; 3],
    /// Ground size of one pixel in metres.
    pixel_size: f64,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl ConformalConic {
    pub(crate) fn new(p: &ConformalConicParams, width: u32, height: u32, chart: &str) -> Result<Self> {
        let a = p.semi_major;
        let e2 = 1.0 - (p.semi_minor * p.semi_minor) / (a * a);
        if !(0.0..1.0).contains(&e2) {
            return Err(ChartError::MalformedDescriptor(format!(
                "{chart}: ellipsoid axes {} / {}",
                p.semi_major, p.semi_minor
            )));
        }
        let e = e2.sqrt();

        let phi0 = p.center_lat.to_radians();
        let phi1 = p.std_parallel_1.to_radians();
        let phi2 = p.std_parallel_2.to_radians();

        let m1 = m(phi1, e2);
        let t1 = t(phi1, e);
        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            (m1.ln() - m(phi2, e2).ln()) / (t1.ln() - t(phi2, e).ln())
        };
        if n == 0.0 || !n.is_finite() {
            return Err(ChartError::MalformedDescriptor(format!(
                "{chart}: standard parallels {} / {}",
                p.std_parallel_1, p.std_parallel_2
            )));
        }
        let f_const = m1 / (n * t1.powf(n));
        let rho0 = a * f_const * t(phi0, e).powf(n);

        let [ca, cb, cc, cd, ce, cf] = p.calibration;
        let metres_from_pixel = [[ca, cc, ce], [cb, cd, cf], [0.0, 0.0, 1.0]];
        let pixel_from_metres = invert_affine(metres_from_pixel)
            .ok_or_else(|| ChartError::SingularCalibration(chart.to_string()))?;
        let pixel_size = (ca * cd - cb * cc).abs().sqrt();

        Ok(Self {
            center_lon: p.center_lon.to_radians(),
            center_lat: phi0,
            a,
            e,
            e2,
            n,
            f_const,
            rho0,
            calibration: p.calibration,
            pixel_from_metres,
            pixel_size,
            width,
            height,
        })
    }

    fn rho(&self, phi: f64) -> f64 {
        self.a * self.f_const * t(phi, self.e).powf(self.n)
    }

    pub(crate) fn project(&self, lat: f64, lon: f64) -> Pixel {
        let phi = lat.to_radians();
        let mut dlon = lon.to_radians() - self.center_lon;
        while dlon < -PI {
            dlon += 2.0 * PI;
        }
        while dlon >= PI {
            dlon -= 2.0 * PI;
        }
        let theta = self.n * dlon;
        let rho = self.rho(phi);
        let easting = rho * theta.sin();
        let northing = self.rho0 - rho * theta.cos();

        let w = &self.pixel_from_metres;
        Pixel::new(
            w[0][0] * easting + w[0][1] * northing + w[0][2],
            w[1][0] * easting + w[1][1] * northing + w[1][2],
        )
    }

    pub(crate) fn unproject(&self, pixel: Pixel) -> LatLon {
        self.unproject_counted(pixel).0
    }

    /// Inverse projection that also reports how many latitude refinement
    /// steps were taken.
    pub(crate) fn unproject_counted(&self, pixel: Pixel) -> (LatLon, usize) {
        let [ca, cb, cc, cd, ce, cf] = self.calibration;
        let easting = ca * pixel.x + cc * pixel.y + ce;
        let northing = cb * pixel.x + cd * pixel.y + cf;

        // cone angle, with the sign convention for cones opening southward
        let sign = self.n.signum();
        let theta = (sign * easting).atan2(sign * (self.rho0 - northing));
        let lon = (theta / self.n + self.center_lon).to_degrees();

        let cos_theta = theta.cos();
        let tolerance = self.pixel_size * INVERSE_TOLERANCE_PIXELS;
        let mut phi = self.center_lat;
        let mut steps = 0;
        while steps < MAX_INVERSE_ITERATIONS {
            let rho = self.rho(phi);
            let error = northing - (self.rho0 - rho * cos_theta);
            if error.abs() <= tolerance {
                break;
            }
            // northing gained per radian of latitude along this meridian
            let sin_phi = phi.sin();
            let rate = cos_theta * rho * self.n * (1.0 - self.e2)
                / ((1.0 - self.e2 * sin_phi * sin_phi) * phi.cos());
            if rate.abs() < f64::EPSILON {
                break;
            }
            phi = (phi + error / rate).clamp(-FRAC_PI_2 + POLE_MARGIN, FRAC_PI_2 - POLE_MARGIN);
            steps += 1;
        }
        if steps == MAX_INVERSE_ITERATIONS {
            debug!(x = pixel.x, y = pixel.y, "latitude refinement hit iteration cap");
        }

        (LatLon::new(phi.to_degrees(), normal_lon(lon)), steps)
    }
}

/// Snyder eq 14-15.
fn m(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

/// Snyder eq 15-9a.
fn t(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    let es = e * s;
    (((1.0 - s) / (1.0 + s)) * ((1.0 + es) / (1.0 - es)).powf(e)).sqrt()
}

/// Inverts a 3x3 matrix by Gauss-Jordan elimination with partial pivoting.
fn invert_affine(m: [[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let mut rows = [[0.0; 6]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        row[..3].copy_from_slice(&m[i]);
        row[3 + i] = 1.0;
    }

    for col in 0..3 {
        let pivot = (col..3).max_by(|&r1, &r2| {
            rows[r1][col].abs().total_cmp(&rows[r2][col].abs())
        })?;
        if rows[pivot][col].abs() < 1e-12 {
            return None;
        }
        rows.swap(col, pivot);

        let scale = rows[col][col];
        for v in rows[col].iter_mut() {
            *v /= scale;
        }
        for r in 0..3 {
            if r != col {
                let factor = rows[r][col];
                if factor != 0.0 {
                    let pivot_row = rows[col];
                    for (v, p) in rows[r].iter_mut().zip(pivot_row.iter()) {
                        *v -= factor * p;
                    }
                }
            }
        }
    }

    let mut inv = [[0.0; 3]; 3];
    for (i, row) in rows.iter().enumerate() {
        inv[i].copy_from_slice(&row[3..]);
    }
    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WGS84_A: f64 = 6378137.0;
    const WGS84_B: f64 = 6356752.314245;

    /// A chart of `width` x `height` pixels, `pixel` metres each, centered on
    /// the projection origin.
    fn centered_chart(center_lat: f64, center_lon: f64, par1: f64, par2: f64) -> ConformalConic {
        let (width, height, pixel) = (8000u32, 6000u32, 50.0);
        let params = ConformalConicParams {
            center_lat,
            center_lon,
            std_parallel_1: par1,
            std_parallel_2: par2,
            semi_major: WGS84_A,
            semi_minor: WGS84_B,
            calibration: [
                pixel,
                0.0,
                0.0,
                -pixel,
                -(width as f64) / 2.0 * pixel,
                height as f64 / 2.0 * pixel,
            ],
        };
        ConformalConic::new(&params, width, height, "Synthetic 1").unwrap()
    }

    #[test]
    fn test_center_maps_to_chart_middle() {
        let chart = centered_chart(38.5, -73.5, 33.0, 45.0);
        let p = chart.project(38.5, -73.5);
        assert_abs_diff_eq!(p.x, 4000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 3000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let chart = centered_chart(38.5, -73.5, 33.0, 45.0);
        let center = chart.project(38.5, -73.5);
        let north = chart.project(39.0, -73.5);
        let east = chart.project(38.5, -73.0);
        assert!(north.y < center.y);
        assert!(east.x > center.x);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let chart = centered_chart(38.5, -73.5, 33.0, 45.0);
        for &(lat, lon) in &[(38.5, -73.5), (40.0, -75.0), (37.0, -72.0), (39.9, -71.2)] {
            let p = chart.project(lat, lon);
            let back = chart.unproject(p);
            let again = chart.project(back.lat, back.lon);
            assert!(p.distance(&again) < 1.0, "{lat},{lon}: {p:?} vs {again:?}");
            assert_abs_diff_eq!(back.lon, lon, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_inverse_terminates_across_latitudes() {
        for &center in &[-89.0, -60.0, -30.0, -5.0, 5.0, 30.0, 60.0, 89.0] {
            let s: f64 = if center < 0.0 { -1.0 } else { 1.0 };
            let chart = centered_chart(center, 10.0, center - s * 2.0, center - s * 0.5);
            for &(dlat, dlon) in &[(0.0, 0.0), (0.4, 1.5), (-0.4, -1.5), (0.3, -2.0)] {
                let lat = center + dlat;
                let lon = 10.0 + dlon;
                let p = chart.project(lat, lon);
                let (back, steps) = chart.unproject_counted(p);
                assert!(steps < MAX_INVERSE_ITERATIONS, "center {center}: {steps} steps");
                let again = chart.project(back.lat, back.lon);
                assert!(p.distance(&again) < 1.0, "center {center}: {p:?} vs {again:?}");
            }
        }
    }

    #[test]
    fn test_tangent_cone() {
        let chart = centered_chart(45.0, 0.0, 45.0, 45.0);
        let p = chart.project(46.0, 1.0);
        let back = chart.unproject(p);
        assert_abs_diff_eq!(back.lat, 46.0, epsilon = 1e-3);
        assert_abs_diff_eq!(back.lon, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_singular_calibration_is_rejected() {
        let params = ConformalConicParams {
            center_lat: 38.5,
            center_lon: -73.5,
            std_parallel_1: 33.0,
            std_parallel_2: 45.0,
            semi_major: WGS84_A,
            semi_minor: WGS84_B,
            calibration: [1.0, 2.0, 2.0, 4.0, 0.0, 0.0],
        };
        assert!(matches!(
            ConformalConic::new(&params, 10, 10, "Broken 1"),
            Err(ChartError::SingularCalibration(_))
        ));
    }

    #[test]
    fn test_invert_affine_with_rotation() {
        let m = [[0.0, 2.0, 5.0], [3.0, 0.0, -1.0], [0.0, 0.0, 1.0]];
        let inv = invert_affine(m).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| m[i][k] * inv[k][j]).sum();
                assert_abs_diff_eq!(v, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-12);
            }
        }
    }
}
