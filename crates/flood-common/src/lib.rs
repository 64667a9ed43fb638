//! Common types shared across the reservoir flood workspace.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod transform;

pub use bbox::BoundingBox;
pub use crs::{Crs, CrsCode, CrsParseError};
pub use error::{FloodError, FloodResult, Stage};
pub use transform::AffineTransform;

/// Sentinel written into persisted depth rasters for dry or missing cells.
pub const DEFAULT_NODATA_SENTINEL: f32 = -9999.0;
