//! Configuration for the depth engine.

use flood_common::{FloodError, FloodResult, Stage};
use serde::{Deserialize, Serialize};

/// Tunables for depth computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grids with at least this many cells are processed with rayon.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 65_536, // 256x256
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> FloodResult<()> {
        if self.parallel_threshold == 0 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "parallel_threshold",
                "must be at least 1 cell",
            ));
        }
        Ok(())
    }
}
