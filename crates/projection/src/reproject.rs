//! Point and layer reprojection.

use tracing::debug;

use flood_common::{Crs, CrsCode, FloodResult};
use raster_store::VectorLayer;

use crate::error::{ProjectionError, ProjectionResult};
use crate::mercator;
use crate::utm::TransverseMercator;

/// Converts coordinates between reference systems.
pub trait Reprojector: Send + Sync {
    fn transform_point(&self, from: &Crs, to: &Crs, x: f64, y: f64) -> ProjectionResult<(f64, f64)>;

    /// Reproject every vertex of a layer into `to`.
    ///
    /// Fails with `GeometryMismatch` when no conversion exists.
    fn reproject_layer(&self, layer: &VectorLayer, to: &Crs) -> FloodResult<VectorLayer> {
        if layer.crs == *to {
            return Ok(layer.clone());
        }
        let from = layer.crs;
        let geometries = layer
            .geometries
            .iter()
            .map(|g| g.try_map_coords(&mut |x, y| self.transform_point(&from, to, x, y)))
            .collect::<ProjectionResult<Vec<_>>>()?;
        debug!(
            layer = %layer.name,
            from = %from,
            to = %to,
            vertices = layer.vertex_count(),
            "Reprojected vector layer"
        );
        Ok(VectorLayer {
            geometries,
            crs: *to,
            ..layer.clone()
        })
    }
}

/// Geographic (WGS84), Web Mercator and WGS84 UTM zones.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinReprojector;

impl BuiltinReprojector {
    pub fn new() -> Self {
        Self
    }

    /// Whether `crs` can be converted to and from WGS84.
    pub fn supports(crs: &Crs) -> bool {
        matches!(
            crs.code,
            CrsCode::Epsg4326 | CrsCode::Epsg3857 | CrsCode::Utm { .. }
        )
    }

    fn to_geographic(crs: &Crs, x: f64, y: f64) -> Option<(f64, f64)> {
        match crs.code {
            CrsCode::Epsg4326 => Some((x, y)),
            CrsCode::Epsg3857 => Some(mercator::inverse(x, y)),
            CrsCode::Utm { zone, north } => Some(TransverseMercator::utm(zone, north).inverse(x, y)),
            _ => None,
        }
    }

    fn from_geographic(crs: &Crs, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match crs.code {
            CrsCode::Epsg4326 => Some((lon, lat)),
            CrsCode::Epsg3857 => Some(mercator::forward(lon, lat)),
            CrsCode::Utm { zone, north } => Some(TransverseMercator::utm(zone, north).forward(lon, lat)),
            _ => None,
        }
    }
}

impl Reprojector for BuiltinReprojector {
    fn transform_point(&self, from: &Crs, to: &Crs, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if from == to {
            return Ok((x, y));
        }
        let unsupported = || ProjectionError::Unsupported {
            from: *from,
            to: *to,
        };
        let (lon, lat) = Self::to_geographic(from, x, y).ok_or_else(unsupported)?;
        if !(-90.0..=90.0).contains(&lat) || !lon.is_finite() {
            return Err(ProjectionError::OutOfDomain { crs: *from, x, y });
        }
        Self::from_geographic(to, lon, lat).ok_or_else(unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let r = BuiltinReprojector::new();
        let crs = Crs::epsg(2193);
        assert_eq!(r.transform_point(&crs, &crs, 1.5, 2.5).unwrap(), (1.5, 2.5));
    }

    #[test]
    fn test_utm_to_web_mercator_via_geographic() {
        let r = BuiltinReprojector::new();
        let (x, y) = r
            .transform_point(&Crs::epsg(32633), &Crs::epsg(3857), 500_000.0, 4_649_776.225)
            .unwrap();
        assert!((x - 1_669_792.362).abs() < 0.01);
        assert!((y - 5_160_979.444).abs() < 0.05);
    }

    #[test]
    fn test_unsupported_pair() {
        let r = BuiltinReprojector::new();
        let err = r
            .transform_point(&Crs::epsg(2193), &Crs::wgs84(), 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Unsupported { .. }));
        assert!(r.transform_point(&Crs::wgs84(), &Crs::unknown(), 0.0, 0.0).is_err());
    }

    #[test]
    fn test_latitude_out_of_range() {
        let r = BuiltinReprojector::new();
        let err = r
            .transform_point(&Crs::wgs84(), &Crs::epsg(32633), 15.0, 120.0)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::OutOfDomain { .. }));
    }
}
