//! Rendering errors.

use std::path::Path;

use thiserror::Error;

use flood_common::{FloodError, Stage};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding failed: {0}")]
    Png(String),

    #[error("font '{path}' could not be loaded: {message}")]
    Font { path: String, message: String },

    #[error("invalid render setting '{param}': {message}")]
    InvalidSetting { param: String, message: String },

    /// No usable extent or no frames.
    #[error("nothing to render: {0}")]
    Empty(String),
}

impl RenderError {
    pub fn invalid_setting(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Convert into the pipeline error for an artifact at `path`.
    pub fn into_flood(self, path: impl AsRef<Path>) -> FloodError {
        match self {
            RenderError::InvalidSetting { param, message } => {
                FloodError::invalid_parameter(Stage::Render, param, message)
            }
            other => FloodError::render(path, other.to_string()),
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
