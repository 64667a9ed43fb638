//! Dry-cell masking.
//!
//! A masked grid separates flooded cells from cells that must not tint a
//! map or enter an aggregate. Dry cells (depth <= 0) and cells missing in
//! the source DEM are kept apart so a later model can treat them
//! differently; for the flat-fill model both are simply excluded.

use flood_common::{AffineTransform, Crs};

use crate::types::DepthGrid;

/// Classification of one cell of a masked depth grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellState {
    /// Flooded, with strictly positive depth.
    Wet(f32),
    /// Above the water surface.
    Dry,
    /// No elevation in the source grid.
    Missing,
}

impl CellState {
    pub fn depth(&self) -> Option<f32> {
        match self {
            CellState::Wet(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_wet(&self) -> bool {
        matches!(self, CellState::Wet(_))
    }
}

/// Depth grid with dry and missing cells excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedDepthGrid {
    cells: Vec<CellState>,
    width: usize,
    height: usize,
    transform: AffineTransform,
    crs: Crs,
    water_elevation: f64,
}

impl MaskedDepthGrid {
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn water_elevation(&self) -> f64 {
        self.water_elevation
    }

    pub fn get(&self, col: usize, row: usize) -> Option<CellState> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col).copied()
    }

    /// Depths of every wet cell in row-major order.
    pub fn wet_depths(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().filter_map(CellState::depth)
    }

    pub fn wet_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_wet()).count()
    }

    pub fn dry_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == CellState::Dry).count()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == CellState::Missing).count()
    }

    /// Deepest wet cell, 0 when nothing is flooded.
    pub fn max_depth(&self) -> f32 {
        self.wet_depths().fold(0.0f32, f32::max)
    }

    /// Flatten for storage: wet cells keep their depth, everything else
    /// becomes `sentinel`.
    pub fn filled(&self, sentinel: f32) -> Vec<f32> {
        self.cells
            .iter()
            .map(|c| c.depth().unwrap_or(sentinel))
            .collect()
    }
}

/// Mark every cell with depth `<= 0` as dry and every NaN cell as missing.
pub fn mask_dry(depth: &DepthGrid) -> MaskedDepthGrid {
    let cells = depth
        .data()
        .iter()
        .map(|d| {
            if d.is_nan() {
                CellState::Missing
            } else if *d > 0.0 {
                CellState::Wet(*d)
            } else {
                CellState::Dry
            }
        })
        .collect();

    MaskedDepthGrid {
        cells,
        width: depth.width(),
        height: depth.height(),
        transform: *depth.transform(),
        crs: *depth.crs(),
        water_elevation: depth.water_elevation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::compute_depth;
    use crate::types::ElevationGrid;

    fn grid(data: Vec<f32>, nodata: Option<f32>) -> ElevationGrid {
        ElevationGrid::new(data, 2, 2, AffineTransform::default(), Crs::unknown(), nodata).unwrap()
    }

    #[test]
    fn test_classifies_cells() {
        let depth = compute_depth(&grid(vec![1.0, 3.0, -9999.0, 2.0], Some(-9999.0)), 1.5).unwrap();
        let masked = mask_dry(&depth);
        assert_eq!(masked.get(0, 0), Some(CellState::Wet(1.5)));
        assert_eq!(masked.get(1, 0), Some(CellState::Dry));
        assert_eq!(masked.get(0, 1), Some(CellState::Missing));
        assert_eq!(masked.get(1, 1), Some(CellState::Wet(0.5)));
        assert_eq!(masked.wet_count(), 2);
        assert_eq!(masked.dry_count(), 1);
        assert_eq!(masked.missing_count(), 1);
    }

    #[test]
    fn test_zero_depth_is_dry() {
        // The lowest cell sits exactly at the water surface when level == 0
        let depth = compute_depth(&grid(vec![1.0, 2.0, 3.0, 4.0], None), 0.0).unwrap();
        let masked = mask_dry(&depth);
        assert_eq!(masked.wet_count(), 0);
        assert_eq!(masked.dry_count(), 4);
        assert_eq!(masked.max_depth(), 0.0);
    }

    #[test]
    fn test_filled_uses_sentinel() {
        let depth = compute_depth(&grid(vec![1.0, 3.0, f32::NAN, 2.0], None), 1.5).unwrap();
        let filled = mask_dry(&depth).filled(-9999.0);
        assert_eq!(filled, vec![1.5, -9999.0, -9999.0, 0.5]);
    }
}
