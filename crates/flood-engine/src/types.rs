//! Core grid types for flood computation.

use flood_common::{AffineTransform, BoundingBox, Crs, FloodError, FloodResult, Stage};

/// A single-band terrain raster: elevations in linear units (meters),
/// row-major order, top row first.
///
/// Immutable once constructed; frame computations share it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: AffineTransform,
    crs: Crs,
    nodata: Option<f32>,
}

impl ElevationGrid {
    /// Create a new elevation grid.
    ///
    /// Rejects empty grids and data whose length does not match
    /// `width * height`.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: AffineTransform,
        crs: Crs,
        nodata: Option<f32>,
    ) -> FloodResult<Self> {
        if width == 0 || height == 0 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "elevation_grid",
                format!("grid must be non-empty, got {}x{}", width, height),
            ));
        }
        if data.len() != width * height {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "elevation_grid",
                format!(
                    "expected {} values for a {}x{} grid, got {}",
                    width * height,
                    width,
                    height,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
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

    /// Nodata value declared by the source raster, if any.
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed grid; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the value at a specific grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// A cell is missing when it is non-finite or equals the declared nodata.
    pub fn is_missing(&self, value: f32) -> bool {
        !value.is_finite() || self.nodata.map_or(false, |nd| value == nd)
    }

    /// Lowest valid elevation, ignoring missing cells.
    pub fn min_elevation(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !self.is_missing(*v))
            .fold(None, |acc, v| match acc {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            })
    }

    /// Highest valid elevation, ignoring missing cells.
    pub fn max_elevation(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !self.is_missing(*v))
            .fold(None, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }

    /// Number of cells holding a usable elevation.
    pub fn valid_cell_count(&self) -> usize {
        self.data.iter().filter(|v| !self.is_missing(**v)).count()
    }

    /// World extent of the grid.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }
}

/// Water depth per cell for one target water level.
///
/// Same shape, transform and CRS as the elevation grid it was derived
/// from. Cells that were missing in the elevation grid hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthGrid {
    pub(crate) data: Vec<f32>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) transform: AffineTransform,
    pub(crate) crs: Crs,
    pub(crate) water_elevation: f64,
    pub(crate) base_elevation: f64,
}

impl DepthGrid {
    pub fn data(&self) -> &[f32] {
        &self.data
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

    /// Water level above the base elevation this grid was computed for.
    pub fn water_elevation(&self) -> f64 {
        self.water_elevation
    }

    /// Lowest valid elevation of the source grid.
    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    /// Absolute elevation of the water surface.
    pub fn water_surface(&self) -> f64 {
        self.base_elevation + self.water_elevation
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Deepest water in the grid (0 when fully dry).
    pub fn max_depth(&self) -> f32 {
        self.data
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0f32, f32::max)
    }

    /// Number of cells with strictly positive depth.
    pub fn wet_cell_count(&self) -> usize {
        self.data.iter().filter(|d| **d > 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> AffineTransform {
        AffineTransform::north_up(0.0, 3.0, 1.0, 1.0)
    }

    #[test]
    fn test_rejects_empty_grid() {
        let err = ElevationGrid::new(vec![], 0, 0, transform(), Crs::unknown(), None).unwrap_err();
        assert!(matches!(err, FloodError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let err =
            ElevationGrid::new(vec![1.0; 5], 3, 2, transform(), Crs::unknown(), None).unwrap_err();
        assert!(err.to_string().contains("expected 6 values"));
    }

    #[test]
    fn test_min_max_ignore_missing() {
        let grid = ElevationGrid::new(
            vec![-9999.0, 4.0, f32::NAN, 7.0, 2.5, 9.0],
            3,
            2,
            transform(),
            Crs::unknown(),
            Some(-9999.0),
        )
        .unwrap();
        assert_eq!(grid.min_elevation(), Some(2.5));
        assert_eq!(grid.max_elevation(), Some(9.0));
        assert_eq!(grid.valid_cell_count(), 4);
    }

    #[test]
    fn test_all_missing_has_no_min() {
        let grid = ElevationGrid::new(
            vec![f32::NAN; 4],
            2,
            2,
            transform(),
            Crs::unknown(),
            None,
        )
        .unwrap();
        assert_eq!(grid.min_elevation(), None);
    }

    #[test]
    fn test_get() {
        let grid = ElevationGrid::new(
            (0..6).map(|v| v as f32).collect(),
            3,
            2,
            transform(),
            Crs::unknown(),
            None,
        )
        .unwrap();
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(2, 1), Some(5.0));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }
}
