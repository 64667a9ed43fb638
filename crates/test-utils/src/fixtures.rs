//! Fixed scenarios with hand-checked answers.

use flood_common::{AffineTransform, Crs};

use crate::generators::SyntheticDem;

/// 3x3 bowl: rim at 10, centre at 5, 2 m cells.
///
/// At water level 3 only the centre floods, 3 m deep, so the volume is
/// `3 * 4 = 12` cubic meters.
pub fn bowl_3x3() -> SyntheticDem {
    SyntheticDem {
        data: vec![10.0, 10.0, 10.0, 10.0, 5.0, 10.0, 10.0, 10.0, 10.0],
        width: 3,
        height: 3,
        transform: AffineTransform::north_up(0.0, 6.0, 2.0, 2.0),
        crs: Crs::epsg(32718),
    }
}

pub const BOWL_3X3_LEVEL: f64 = 3.0;
pub const BOWL_3X3_VOLUME: f64 = 12.0;

/// Zero-width pixels.
pub fn degenerate_transform() -> AffineTransform {
    AffineTransform::new(0.0, 0.0, 100.0, 0.0, -1.0, 200.0)
}

/// 30 m north-up grid anchored in UTM zone 33N.
pub fn utm_transform() -> AffineTransform {
    AffineTransform::north_up(500_000.0, 4_649_776.0, 30.0, 30.0)
}

/// Small GeoJSON river line in WGS84 without a `crs` member.
pub const RIVER_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"name": "river"},
      "geometry": {
        "type": "LineString",
        "coordinates": [[15.0, 42.0], [15.001, 42.001], [15.002, 42.0015]]
      }
    }
  ]
}"#;

/// Dam polygon in UTM 33N with a legacy `crs` member.
pub const DAM_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32633"}},
  "features": [
    {
      "type": "Feature",
      "properties": {},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[500030.0, 4649700.0], [500090.0, 4649700.0], [500090.0, 4649690.0], [500030.0, 4649700.0]]]
      }
    }
  ]
}"#;
