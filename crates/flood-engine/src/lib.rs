//! Flat-fill ("bathtub") reservoir flooding over a digital elevation model.
//!
//! Given an elevation grid and a target water level measured above the
//! lowest valid cell, every cell below the resulting water surface is
//! flooded independently of its neighbours:
//!
//! ```text
//! ElevationGrid ──► compute_depth(level) ──► DepthGrid
//!                                              │
//!                                              ▼
//!                                        mask_dry() ──► MaskedDepthGrid
//!                                                         │
//!                              ┌──────────────────────────┤
//!                              ▼                          ▼
//!                     integrate_volume()        filled(sentinel) ──► export
//! ```
//!
//! No flow routing, connectivity or time dependence is modelled.
//!
//! # Example
//!
//! ```
//! use flood_common::{AffineTransform, Crs};
//! use flood_engine::{compute_depth, integrate_volume, mask_dry, ElevationGrid};
//!
//! let dem = ElevationGrid::new(
//!     vec![10.0, 10.0, 10.0, 10.0, 5.0, 10.0, 10.0, 10.0, 10.0],
//!     3,
//!     3,
//!     AffineTransform::north_up(0.0, 6.0, 2.0, 2.0),
//!     Crs::epsg(32718),
//!     None,
//! )?;
//! let depth = compute_depth(&dem, 3.0)?;
//! let volume = integrate_volume(&mask_dry(&depth))?;
//! assert_eq!(volume.cubic_units, 12.0);
//! # Ok::<(), flood_common::FloodError>(())
//! ```

pub mod config;
pub mod depth;
pub mod mask;
pub mod scenario;
pub mod sequence;
pub mod types;
pub mod volume;

pub use config::EngineConfig;
pub use depth::{compute_depth, DepthEngine};
pub use mask::{mask_dry, CellState, MaskedDepthGrid};
pub use scenario::Scenario;
pub use sequence::{FloodSequence, Frame, Frames, MAX_FRAMES};
pub use types::{DepthGrid, ElevationGrid};
pub use volume::{cell_area, integrate_sentinel_grid, integrate_volume, NeumaierSum, Volume};

pub use flood_common::{FloodError, FloodResult};
