//! Spherical ("Web") Mercator, EPSG:3857.

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857 (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the square Web Mercator world is clipped.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Geographic degrees to Web Mercator meters. Latitude is clamped.
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator meters to geographic degrees.
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (y / EARTH_RADIUS).sinh().atan().to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = forward(0.0, 0.0);
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn test_known_point() {
        let (x, y) = forward(15.0, 42.0);
        assert!((x - 1_669_792.362).abs() < 1e-3);
        assert!((y - 5_160_979.444).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = forward(-70.66, -33.45);
        let (lon, lat) = inverse(x, y);
        assert!((lon + 70.66).abs() < 1e-9);
        assert!((lat + 33.45).abs() < 1e-9);
    }

    #[test]
    fn test_poles_clamped() {
        let (_, y) = forward(0.0, 90.0);
        assert!(y.is_finite());
        assert!((inverse(0.0, y).1 - MAX_LATITUDE).abs() < 1e-9);
    }
}
