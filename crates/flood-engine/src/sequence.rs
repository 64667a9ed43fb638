//! Water-level ramps for animated flooding.
//!
//! A sequence of `N + 1` levels, `level_i = i * step` for `i = 0..=N`,
//! with `N = floor(max_height / step)`. Every frame is computed from the
//! shared elevation grid alone, so the sequence can be restarted or
//! precomputed in parallel without changing its output.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use flood_common::{FloodError, FloodResult, Stage};

use crate::depth::DepthEngine;
use crate::mask::{mask_dry, MaskedDepthGrid};
use crate::types::{DepthGrid, ElevationGrid};

/// Upper bound on the number of levels in one sequence.
pub const MAX_FRAMES: usize = 100_000;

/// Arithmetic progression of water levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SequenceParams")]
pub struct FloodSequence {
    step: f64,
    max_height: f64,
}

#[derive(Deserialize)]
struct SequenceParams {
    step: f64,
    max_height: f64,
}

impl TryFrom<SequenceParams> for FloodSequence {
    type Error = FloodError;

    fn try_from(params: SequenceParams) -> FloodResult<Self> {
        Self::new(params.step, params.max_height)
    }
}

impl FloodSequence {
    /// Create a sequence. `step` must be finite and > 0, `max_height`
    /// finite and >= 0, and the ramp may not exceed [`MAX_FRAMES`] levels.
    pub fn new(step: f64, max_height: f64) -> FloodResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "step",
                format!("must be a finite value > 0, got {}", step),
            ));
        }
        if !max_height.is_finite() || max_height < 0.0 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "max_height",
                format!("must be a finite value >= 0, got {}", max_height),
            ));
        }
        let intervals = (max_height / step).floor();
        if intervals >= MAX_FRAMES as f64 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "step",
                format!(
                    "max_height {} / step {} gives more than {} frames",
                    max_height, step, MAX_FRAMES
                ),
            ));
        }
        Ok(Self { step, max_height })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Number of frames, `floor(max_height / step) + 1`.
    pub fn len(&self) -> usize {
        (self.max_height / self.step).floor() as usize + 1
    }

    /// A validated sequence always has at least the level-0 frame.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Water level of frame `index`.
    pub fn level(&self, index: usize) -> Option<f64> {
        (index < self.len()).then(|| index as f64 * self.step)
    }

    /// All levels in increasing order.
    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| i as f64 * self.step)
    }

    /// Highest level in the sequence.
    pub fn last_level(&self) -> f64 {
        (self.len() - 1) as f64 * self.step
    }

    /// Lazily compute frames in increasing-level order.
    pub fn frames<'a>(&self, engine: &'a DepthEngine, grid: &'a ElevationGrid) -> Frames<'a> {
        Frames {
            sequence: *self,
            engine,
            grid,
            next: 0,
        }
    }

    /// Compute every frame on the rayon pool, returned in level order.
    pub fn compute_all(&self, engine: &DepthEngine, grid: &ElevationGrid) -> FloodResult<Vec<Frame>> {
        info!(
            frames = self.len(),
            step = self.step,
            max_height = self.max_height,
            "Precomputing flood frames"
        );
        (0..self.len())
            .into_par_iter()
            .map(|index| Frame::compute(engine, grid, index, index as f64 * self.step))
            .collect()
    }
}

/// One animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub water_elevation: f64,
    pub depth: DepthGrid,
}

impl Frame {
    fn compute(
        engine: &DepthEngine,
        grid: &ElevationGrid,
        index: usize,
        water_elevation: f64,
    ) -> FloodResult<Self> {
        Ok(Self {
            index,
            water_elevation,
            depth: engine.compute(grid, water_elevation)?,
        })
    }

    pub fn masked(&self) -> MaskedDepthGrid {
        mask_dry(&self.depth)
    }
}

/// Lazy, restartable frame iterator.
pub struct Frames<'a> {
    sequence: FloodSequence,
    engine: &'a DepthEngine,
    grid: &'a ElevationGrid,
    next: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = FloodResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let level = self.sequence.level(self.next)?;
        let index = self.next;
        self.next += 1;
        Some(Frame::compute(self.engine, self.grid, index, level))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Frames<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use flood_common::{AffineTransform, Crs};

    #[test]
    fn test_frame_count() {
        assert_eq!(FloodSequence::new(1.0, 2.0).unwrap().len(), 3);
        assert_eq!(FloodSequence::new(0.25, 25.0).unwrap().len(), 101);
        assert_eq!(FloodSequence::new(3.0, 2.0).unwrap().len(), 1);
        assert_eq!(FloodSequence::new(1.0, 0.0).unwrap().len(), 1);
    }

    #[test]
    fn test_levels_are_multiples_not_accumulated() {
        let seq = FloodSequence::new(0.1, 1.0).unwrap();
        let levels: Vec<f64> = seq.levels().collect();
        assert_eq!(levels[7], 7.0 * 0.1);
        assert_eq!(seq.level(levels.len()), None);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(FloodSequence::new(0.0, 1.0).is_err());
        assert!(FloodSequence::new(-1.0, 1.0).is_err());
        assert!(FloodSequence::new(f64::NAN, 1.0).is_err());
        assert!(FloodSequence::new(1.0, -0.5).is_err());
        assert!(FloodSequence::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_frame_count_is_capped() {
        let err = FloodSequence::new(1e-300, 1e300).unwrap_err();
        assert!(matches!(err, FloodError::InvalidParameter { ref param, .. } if param == "step"));
        assert!(FloodSequence::new(f64::MIN_POSITIVE, 1.0).is_err());

        let last = FloodSequence::new(1.0, (MAX_FRAMES - 1) as f64).unwrap();
        assert_eq!(last.len(), MAX_FRAMES);
        assert!(FloodSequence::new(1.0, MAX_FRAMES as f64).is_err());
    }

    #[test]
    fn test_frames_restartable_and_parallel_identical() {
        let grid = ElevationGrid::new(
            vec![3.0, 1.0, 2.0, 5.0],
            2,
            2,
            AffineTransform::default(),
            Crs::unknown(),
            None,
        )
        .unwrap();
        let engine = DepthEngine::default();
        let seq = FloodSequence::new(0.5, 2.0).unwrap();

        let first: Vec<Frame> = seq.frames(&engine, &grid).collect::<FloodResult<_>>().unwrap();
        let second: Vec<Frame> = seq.frames(&engine, &grid).collect::<FloodResult<_>>().unwrap();
        let parallel = seq.compute_all(&engine, &grid).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, parallel);
        assert_eq!(seq.frames(&engine, &grid).len(), 5);
    }
}
