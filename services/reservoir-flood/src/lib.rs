//! Reservoir flood pipeline.
//!
//! Loads a DEM plus optional vector layers and imagery, floods it to one
//! water level or a ramp of levels, renders a map or animation, exports
//! the depth raster and reports the stored volume read back from it.

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{FloodRunConfig, LayerConfig, OutputConfig, Overrides};
pub use pipeline::{Computed, Exported, Inputs, PipelineContext};
pub use report::{CurvePoint, VolumeReport};
