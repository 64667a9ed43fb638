//! Universal Transverse Mercator on the WGS84 ellipsoid.
//!
//! Series expansions after Snyder, "Map Projections: A Working Manual"
//! (USGS PP 1395), pp. 61-64. Sub-millimeter within a zone; accuracy
//! degrades slowly beyond roughly 10 degrees from the central meridian.

/// WGS84 semi-major axis (meters).
const A: f64 = 6_378_137.0;
/// WGS84 flattening.
const F: f64 = 1.0 / 298.257_223_563;
/// Scale factor on the central meridian.
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// One UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub zone: u8,
    pub north: bool,
    /// Central meridian in degrees
    lon0: f64,
    e2: f64,
    ep2: f64,
}

impl TransverseMercator {
    /// Zone 1..=60; other values are clamped into range.
    pub fn utm(zone: u8, north: bool) -> Self {
        let zone = zone.clamp(1, 60);
        let e2 = F * (2.0 - F);
        Self {
            zone,
            north,
            lon0: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0
    }

    /// Meridional arc length from the equator to latitude `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Geographic degrees to easting/northing in meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let lam = lon.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = A / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lam - self.lon0.to_radians());
        let m = self.meridian_arc(phi);

        let x = K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;
        let mut y = K0
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a.powi(6)
                        / 720.0));
        if !self.north {
            y += FALSE_NORTHING_SOUTH;
        }
        (x, y)
    }

    /// Easting/northing in meters to geographic degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let x = x - FALSE_EASTING;
        let y = if self.north { y } else { y - FALSE_NORTHING_SOUTH };

        let mu = (y / K0) / (A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let c1 = self.ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = A / w.sqrt();
        let r1 = A * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * K0);

        let phi = phi1
            - (n1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lam = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;

        (lam.to_degrees(), phi.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian() {
        assert_eq!(TransverseMercator::utm(33, true).central_meridian(), 15.0);
        assert_eq!(TransverseMercator::utm(19, false).central_meridian(), -69.0);
    }

    #[test]
    fn test_point_on_central_meridian() {
        let (x, y) = TransverseMercator::utm(33, true).forward(15.0, 42.0);
        assert!((x - 500_000.0).abs() < 1e-6);
        assert!((y - 4_649_776.225).abs() < 1e-2);
    }

    #[test]
    fn test_equator_origin() {
        let (x, y) = TransverseMercator::utm(31, true).forward(3.0, 0.0);
        assert!((x - 500_000.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_southern_hemisphere() {
        let tm = TransverseMercator::utm(19, false);
        let (x, y) = tm.forward(-70.66, -33.45);
        assert!((x - 345_713.154).abs() < 1e-2);
        assert!((y - 6_297_592.028).abs() < 1e-2);
        let (lon, lat) = tm.inverse(x, y);
        assert!((lon + 70.66).abs() < 1e-8);
        assert!((lat + 33.45).abs() < 1e-8);
    }
}
