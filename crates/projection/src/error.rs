//! Projection errors.

use thiserror::Error;

use flood_common::{Crs, FloodError, Stage};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// No built-in conversion between the two systems.
    #[error("no conversion from {from} to {to}")]
    Unsupported { from: Crs, to: Crs },

    /// Coordinate outside the valid domain of a projection.
    #[error("coordinate ({x}, {y}) outside the domain of {crs}")]
    OutOfDomain { crs: Crs, x: f64, y: f64 },
}

impl From<ProjectionError> for FloodError {
    fn from(err: ProjectionError) -> Self {
        FloodError::geometry_mismatch(Stage::Load, err.to_string())
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
