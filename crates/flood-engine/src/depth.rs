//! Flood depth computation.
//!
//! `depth = max(0, (min(E) + water_elevation) - E[cell])`, elementwise.
//! Cells are independent, so large grids are split across the rayon pool;
//! the result is bit-identical to the sequential path.

use rayon::prelude::*;
use tracing::debug;

use flood_common::{FloodError, FloodResult, Stage};

use crate::config::EngineConfig;
use crate::types::{DepthGrid, ElevationGrid};

/// Depth engine carrying its configuration.
#[derive(Debug, Clone, Default)]
pub struct DepthEngine {
    config: EngineConfig,
}

impl DepthEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the water depth grid for one water level.
    ///
    /// `water_elevation` is measured above the lowest valid cell. Values
    /// `<= 0` yield a fully dry grid; values above the full relief flood
    /// every valid cell. Missing elevation cells stay NaN.
    pub fn compute(&self, grid: &ElevationGrid, water_elevation: f64) -> FloodResult<DepthGrid> {
        if !water_elevation.is_finite() {
            return Err(FloodError::invalid_parameter(
                Stage::Compute,
                "water_elevation",
                format!("must be finite, got {}", water_elevation),
            ));
        }

        let base = grid.min_elevation().ok_or_else(|| {
            FloodError::invalid_parameter(
                Stage::Compute,
                "elevation_grid",
                "grid contains no valid elevation cells",
            )
        })? as f64;
        let surface = base + water_elevation;

        let depth_at = |e: &f32| -> f32 {
            if grid.is_missing(*e) {
                f32::NAN
            } else {
                (surface - *e as f64).max(0.0) as f32
            }
        };

        let source = grid.data();
        let data: Vec<f32> = if source.len() >= self.config.parallel_threshold {
            source.par_iter().map(depth_at).collect()
        } else {
            source.iter().map(depth_at).collect()
        };

        debug!(
            water_elevation,
            base_elevation = base,
            cells = data.len(),
            "Computed depth grid"
        );

        Ok(DepthGrid {
            data,
            width: grid.width(),
            height: grid.height(),
            transform: *grid.transform(),
            crs: *grid.crs(),
            water_elevation,
            base_elevation: base,
        })
    }
}

/// Compute a depth grid with the default engine configuration.
pub fn compute_depth(grid: &ElevationGrid, water_elevation: f64) -> FloodResult<DepthGrid> {
    DepthEngine::default().compute(grid, water_elevation)
}
