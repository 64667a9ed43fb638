//! Impounded volume integration.
//!
//! `volume = sum(valid depths) * cell_area`. The sum is accumulated in f64
//! with Neumaier compensation so the result does not drift with traversal
//! order on large grids.

use serde::{Deserialize, Serialize};
use tracing::debug;

use flood_common::{AffineTransform, FloodResult};

use crate::mask::MaskedDepthGrid;

/// Compensated (Neumaier) summation accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = NeumaierSum::new();
        for v in iter {
            acc.add(v);
        }
        acc
    }
}

/// Integrated water volume and the cell geometry used to derive it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Volume in cubic linear units (cubic meters for metric inputs).
    pub cubic_units: f64,
    /// Number of cells that contributed.
    pub wet_cells: usize,
    /// Pixel width in world units.
    pub cell_width: f64,
    /// Pixel height in world units.
    pub cell_height: f64,
    /// `cell_width * cell_height`.
    pub cell_area: f64,
}

impl Volume {
    /// Flooded surface area in square linear units.
    pub fn flooded_area(&self) -> f64 {
        self.wet_cells as f64 * self.cell_area
    }
}

/// Ground area of one cell, `|a| * |e|`.
///
/// Only meaningful for a projected, locally planar CRS. Fails with
/// `InvalidGeometry` for zero, negative or non-finite areas.
pub fn cell_area(transform: &AffineTransform) -> FloodResult<f64> {
    let area = transform.cell_area()?;
    if !transform.is_rectilinear() {
        debug!(
            b = transform.b,
            d = transform.d,
            "Rotated transform; cell area uses |a| * |e| only"
        );
    }
    Ok(area)
}

fn finish(sum: NeumaierSum, wet_cells: usize, transform: &AffineTransform, area: f64) -> Volume {
    let (cell_width, cell_height) = transform.cell_size();
    Volume {
        cubic_units: sum.total() * area,
        wet_cells,
        cell_width,
        cell_height,
        cell_area: area,
    }
}

/// Integrate the volume of an in-memory masked depth grid.
pub fn integrate_volume(masked: &MaskedDepthGrid) -> FloodResult<Volume> {
    let area = cell_area(masked.transform())?;
    let mut wet_cells = 0usize;
    let sum: NeumaierSum = masked
        .wet_depths()
        .map(|d| {
            wet_cells += 1;
            d as f64
        })
        .collect();
    Ok(finish(sum, wet_cells, masked.transform(), area))
}

/// Integrate the volume of a grid in persisted layout.
///
/// Cells equal to `nodata` are excluded, as are NaN cells (which also
/// covers a NaN sentinel). Every other value is summed as stored.
pub fn integrate_sentinel_grid(
    values: &[f32],
    nodata: f32,
    transform: &AffineTransform,
) -> FloodResult<Volume> {
    let area = cell_area(transform)?;
    let mut wet_cells = 0usize;
    let sum: NeumaierSum = values
        .iter()
        .filter(|v| !v.is_nan() && **v != nodata)
        .map(|v| {
            wet_cells += 1;
            *v as f64
        })
        .collect();
    debug!(
        wet_cells,
        excluded = values.len() - wet_cells,
        "Integrated persisted depth grid"
    );
    Ok(finish(sum, wet_cells, transform, area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::compute_depth;
    use crate::mask::mask_dry;
    use crate::types::ElevationGrid;
    use flood_common::{Crs, FloodError};

    #[test]
    fn test_neumaier_recovers_small_terms() {
        let mut acc = NeumaierSum::new();
        acc.add(1.0e16);
        for _ in 0..1000 {
            acc.add(1.0);
        }
        acc.add(-1.0e16);
        assert_eq!(acc.total(), 1000.0);
    }

    #[test]
    fn test_sentinel_grid_excludes_nodata_and_nan() {
        let t = AffineTransform::north_up(0.0, 0.0, 2.0, 2.0);
        let values = [3.0, -9999.0, f32::NAN, 1.5];
        let v = integrate_sentinel_grid(&values, -9999.0, &t).unwrap();
        assert_eq!(v.cubic_units, 18.0);
        assert_eq!(v.wet_cells, 2);
        assert_eq!(v.cell_area, 4.0);
        assert_eq!(v.flooded_area(), 8.0);
    }

    #[test]
    fn test_degenerate_transform_reports_no_volume() {
        let t = AffineTransform::new(0.0, 0.0, 0.0, 0.0, -1.0, 0.0);
        let err = integrate_sentinel_grid(&[1.0], -9999.0, &t).unwrap_err();
        assert!(matches!(err, FloodError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_in_memory_matches_persisted_layout() {
        let grid = ElevationGrid::new(
            vec![4.0, 1.0, 2.5, 7.0, 3.0, 0.5],
            3,
            2,
            AffineTransform::north_up(0.0, 0.0, 10.0, 5.0),
            Crs::epsg(32633),
            None,
        )
        .unwrap();
        let masked = mask_dry(&compute_depth(&grid, 2.0).unwrap());
        let in_memory = integrate_volume(&masked).unwrap();
        let persisted =
            integrate_sentinel_grid(&masked.filled(-9999.0), -9999.0, masked.transform()).unwrap();
        assert_eq!(in_memory, persisted);
        // surface = 2.5; depths 1.5, 0, 2.0 -> 3.5 * 50
        assert_eq!(in_memory.cubic_units, 175.0);
    }
}
