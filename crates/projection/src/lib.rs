//! Coordinate reference system transformations.
//!
//! Implements the handful of projections the flood maps need from scratch:
//! WGS84 geographic, spherical Web Mercator and UTM on the WGS84 ellipsoid.
//! Projected-to-projected conversions go through geographic coordinates.

pub mod error;
pub mod mercator;
pub mod reproject;
pub mod utm;

pub use error::{ProjectionError, ProjectionResult};
pub use reproject::{BuiltinReprojector, Reprojector};
pub use utm::TransverseMercator;
