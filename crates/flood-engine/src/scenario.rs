//! Single-level versus ramped flood runs.

use serde::{Deserialize, Serialize};

use flood_common::{FloodError, FloodResult, Stage};

use crate::sequence::FloodSequence;

/// What a run computes: one water level, or an animated ramp of levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scenario {
    Single { water_elevation: f64 },
    Animation(FloodSequence),
}

impl Scenario {
    /// Build from the mutually exclusive configuration options.
    pub fn from_options(
        water_elevation: Option<f64>,
        step: Option<f64>,
        max_height: Option<f64>,
    ) -> FloodResult<Self> {
        match (water_elevation, step, max_height) {
            (Some(w), None, None) => {
                if !w.is_finite() {
                    return Err(FloodError::invalid_parameter(
                        Stage::Load,
                        "water_elevation",
                        format!("must be finite, got {}", w),
                    ));
                }
                Ok(Scenario::Single { water_elevation: w })
            }
            (None, Some(step), Some(max_height)) => {
                Ok(Scenario::Animation(FloodSequence::new(step, max_height)?))
            }
            (None, Some(_), None) => Err(FloodError::invalid_parameter(
                Stage::Load,
                "max_height",
                "animation runs need both step and max_height",
            )),
            (None, None, Some(_)) => Err(FloodError::invalid_parameter(
                Stage::Load,
                "step",
                "animation runs need both step and max_height",
            )),
            (None, None, None) => Err(FloodError::invalid_parameter(
                Stage::Load,
                "water_elevation",
                "set either water_elevation or step + max_height",
            )),
            (Some(_), _, _) => Err(FloodError::invalid_parameter(
                Stage::Load,
                "water_elevation",
                "water_elevation cannot be combined with step/max_height",
            )),
        }
    }

    /// Water levels in the order frames are emitted.
    pub fn levels(&self) -> Vec<f64> {
        match self {
            Scenario::Single { water_elevation } => vec![*water_elevation],
            Scenario::Animation(seq) => seq.levels().collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Scenario::Single { .. } => 1,
            Scenario::Animation(seq) => seq.len(),
        }
    }

    /// Level of the frame that gets exported and reported.
    pub fn final_level(&self) -> f64 {
        match self {
            Scenario::Single { water_elevation } => *water_elevation,
            Scenario::Animation(seq) => seq.last_level(),
        }
    }

    pub fn is_animation(&self) -> bool {
        matches!(self, Scenario::Animation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let s = Scenario::from_options(Some(25.0), None, None).unwrap();
        assert_eq!(s.levels(), vec![25.0]);
        assert_eq!(s.final_level(), 25.0);
        assert!(!s.is_animation());
    }

    #[test]
    fn test_animation() {
        let s = Scenario::from_options(None, Some(1.0), Some(2.0)).unwrap();
        assert_eq!(s.levels(), vec![0.0, 1.0, 2.0]);
        assert_eq!(s.frame_count(), 3);
        assert_eq!(s.final_level(), 2.0);
    }

    #[test]
    fn test_conflicting_or_incomplete_options() {
        assert!(Scenario::from_options(Some(1.0), Some(1.0), Some(2.0)).is_err());
        assert!(Scenario::from_options(None, Some(1.0), None).is_err());
        assert!(Scenario::from_options(None, None, Some(1.0)).is_err());
        assert!(Scenario::from_options(None, None, None).is_err());
        assert!(Scenario::from_options(Some(f64::NAN), None, None).is_err());
    }
}
