//! Raster and vector persistence for flood mapping.
//!
//! - GeoTIFF elevation input and depth output (`GDAL_NODATA` sentinel)
//! - 8-bit GeoTIFF imagery for map backgrounds
//! - GeoJSON vector layers (rivers, dams) with display styles
//!
//! Exported depth rasters are the source of truth for reported volume:
//! [`integrate_exported_volume`] re-reads the file rather than trusting
//! the in-memory grid.

pub mod error;
pub mod geotiff;
pub mod imagery;
pub mod vector;

pub use error::{StoreError, StoreResult};
pub use geotiff::{
    integrate_exported_volume, read_dem, read_geotiff, write_depth, GeoRaster,
};
pub use imagery::{read_imagery, Imagery};
pub use vector::{parse_color, read_vector_layer, Geometry, LayerStyle, VectorLayer};
