//! Error taxonomy for the flood mapping pipeline.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias using FloodError.
pub type FloodResult<T> = Result<T, FloodError>;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Compute,
    Render,
    Export,
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Compute => "compute",
            Stage::Render => "render",
            Stage::Export => "export",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary error type. Every variant is terminal for a run.
#[derive(Debug, Error)]
pub enum FloodError {
    /// Missing or unreadable elevation grid, vector layer or imagery.
    #[error("[{stage}] cannot read input '{path}': {message}")]
    Input {
        stage: Stage,
        path: String,
        message: String,
    },

    /// CRS or extent of two layers cannot be reconciled.
    #[error("[{stage}] geometry mismatch: {message}")]
    GeometryMismatch { stage: Stage, message: String },

    /// Degenerate affine transform (zero, negative or non-finite cell area).
    #[error("[{stage}] invalid geometry: {message}")]
    InvalidGeometry { stage: Stage, message: String },

    /// Failure writing or reading back the depth raster.
    #[error("[{stage}] persistence failure for '{path}': {message}")]
    Persistence {
        stage: Stage,
        path: String,
        message: String,
    },

    /// A configuration value or function argument is out of range.
    #[error("[{stage}] invalid parameter '{param}': {message}")]
    InvalidParameter {
        stage: Stage,
        param: String,
        message: String,
    },

    /// The renderer could not produce or save a visual artifact.
    #[error("[{stage}] rendering failed for '{path}': {message}")]
    Render {
        stage: Stage,
        path: String,
        message: String,
    },
}

impl FloodError {
    /// Create an Input error raised while loading.
    pub fn input(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Input {
            stage: Stage::Load,
            path: path.as_ref().display().to_string(),
            message: msg.into(),
        }
    }

    /// Create a Persistence error.
    pub fn persistence(stage: Stage, path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Persistence {
            stage,
            path: path.as_ref().display().to_string(),
            message: msg.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(stage: Stage, param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            stage,
            param: param.into(),
            message: msg.into(),
        }
    }

    /// Create a GeometryMismatch error.
    pub fn geometry_mismatch(stage: Stage, msg: impl Into<String>) -> Self {
        Self::GeometryMismatch {
            stage,
            message: msg.into(),
        }
    }

    /// Create a Render error.
    pub fn render(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Render {
            stage: Stage::Render,
            path: path.as_ref().display().to_string(),
            message: msg.into(),
        }
    }

    /// Stage the error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            FloodError::Input { stage, .. }
            | FloodError::GeometryMismatch { stage, .. }
            | FloodError::InvalidGeometry { stage, .. }
            | FloodError::Persistence { stage, .. }
            | FloodError::InvalidParameter { stage, .. }
            | FloodError::Render { stage, .. } => *stage,
        }
    }

    /// Re-attribute the error to another stage.
    pub fn at_stage(mut self, new_stage: Stage) -> Self {
        match &mut self {
            FloodError::Input { stage, .. }
            | FloodError::GeometryMismatch { stage, .. }
            | FloodError::InvalidGeometry { stage, .. }
            | FloodError::Persistence { stage, .. }
            | FloodError::InvalidParameter { stage, .. }
            | FloodError::Render { stage, .. } => *stage = new_stage,
        }
        self
    }

    /// Short taxonomy name, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FloodError::Input { .. } => "InputError",
            FloodError::GeometryMismatch { .. } => "GeometryMismatchError",
            FloodError::InvalidGeometry { .. } => "InvalidGeometryError",
            FloodError::Persistence { .. } => "PersistenceError",
            FloodError::InvalidParameter { .. } => "InvalidParameterError",
            FloodError::Render { .. } => "RenderError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_stage_and_path() {
        let err = FloodError::input("/data/dem.tif", "No such file");
        let msg = err.to_string();
        assert!(msg.contains("[load]"));
        assert!(msg.contains("/data/dem.tif"));
        assert_eq!(err.kind(), "InputError");
    }

    #[test]
    fn test_at_stage_rewrites_stage() {
        let err = FloodError::invalid_parameter(Stage::Load, "step", "must be > 0");
        assert_eq!(err.stage(), Stage::Load);
        let err = err.at_stage(Stage::Compute);
        assert_eq!(err.stage(), Stage::Compute);
        assert!(err.to_string().starts_with("[compute]"));
        assert!(err.to_string().contains("'step'"));
    }
}
