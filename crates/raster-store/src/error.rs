//! Error types for raster and vector I/O.

use std::path::Path;

use thiserror::Error;

use flood_common::{FloodError, Stage};

/// Low-level failures while decoding or encoding a file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither a transformation matrix nor scale + tiepoint tags.
    #[error("missing georeferencing: {0}")]
    MissingGeoreference(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("raster has no GDAL_NODATA tag")]
    MissingNodata,

    #[error(transparent)]
    Flood(#[from] FloodError),
}

impl StoreError {
    /// Convert into an input error raised while loading `path`.
    pub fn into_input(self, path: impl AsRef<Path>) -> FloodError {
        match self {
            StoreError::Flood(e) => e,
            other => FloodError::input(path, other.to_string()),
        }
    }

    /// Convert into a persistence error for `path`.
    pub fn into_persistence(self, stage: Stage, path: impl AsRef<Path>) -> FloodError {
        match self {
            StoreError::Flood(e) => e.at_stage(stage),
            other => FloodError::persistence(stage, path, other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
