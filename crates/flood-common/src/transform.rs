//! Affine pixel-to-world transforms.
//!
//! Coefficients follow the `a, b, c, d, e, f` convention:
//!
//! ```text
//! x = a * col + b * row + c
//! y = d * col + e * row + f
//! ```
//!
//! where `(col, row)` addresses the upper-left corner of a pixel. A
//! north-up raster has `b == d == 0` and a negative `e`.

use serde::{Deserialize, Serialize};

use crate::error::{FloodError, FloodResult, Stage};
use crate::BoundingBox;

/// Six-coefficient affine transform from grid (col, row) to world (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the upper-left corner and positive pixel sizes.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height.abs(), origin_y)
    }

    /// Coefficients in `[a, b, c, d, e, f]` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Map a fractional grid position to world coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// World coordinates of the centre of cell `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Inverse mapping, or `None` when the transform is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(AffineTransform {
            a: ia,
            b: ib,
            c: -(ia * self.c + ib * self.f),
            d: id,
            e: ie,
            f: -(id * self.c + ie * self.f),
        })
    }

    /// `true` when the grid axes are aligned with the world axes.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Absolute pixel width and height in world units.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.a.abs(), self.e.abs())
    }

    /// Ground area represented by one cell, `|a| * |e|`.
    ///
    /// Fails with [`FloodError::InvalidGeometry`] when the area is zero,
    /// negative or non-finite, which happens for degenerate or
    /// unreadable transforms.
    pub fn cell_area(&self) -> FloodResult<f64> {
        let area = self.a.abs() * self.e.abs();
        if !area.is_finite() || area <= 0.0 {
            return Err(FloodError::InvalidGeometry {
                stage: Stage::Report,
                message: format!(
                    "cell area {} derived from pixel size {} x {} is not a positive finite value",
                    area, self.a, self.e
                ),
            });
        }
        Ok(area)
    }

    /// World extent covered by a `width x height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        // Four finite corners always yield a box
        BoundingBox::from_points(corners).unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_north_up() {
        let t = AffineTransform::north_up(500_000.0, 8_600_000.0, 30.0, 30.0);
        assert_eq!(t.apply(0.0, 0.0), (500_000.0, 8_600_000.0));
        assert_eq!(t.apply(2.0, 1.0), (500_060.0, 8_599_970.0));
        assert_eq!(t.cell_center(0, 0), (500_015.0, 8_599_985.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = AffineTransform::new(2.0, 0.5, 100.0, -0.25, -2.0, 300.0);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(7.0, 3.0);
        let (col, row) = inv.apply(x, y);
        assert!((col - 7.0).abs() < 1e-9);
        assert!((row - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t = AffineTransform::new(0.0, 0.0, 1.0, 0.0, 0.0, 1.0);
        assert!(t.inverse().is_none());
    }

    #[test]
    fn test_cell_area() {
        let t = AffineTransform::north_up(0.0, 0.0, 2.0, 2.0);
        assert_eq!(t.cell_area().unwrap(), 4.0);
        assert_eq!(t.cell_size(), (2.0, 2.0));
    }

    #[test]
    fn test_degenerate_cell_area_is_invalid_geometry() {
        let t = AffineTransform::new(0.0, 0.0, 0.0, 0.0, -2.0, 0.0);
        let err = t.cell_area().unwrap_err();
        assert!(matches!(err, FloodError::InvalidGeometry { .. }));

        let t = AffineTransform::new(f64::NAN, 0.0, 0.0, 0.0, -2.0, 0.0);
        assert!(t.cell_area().is_err());
    }

    #[test]
    fn test_bounds() {
        let t = AffineTransform::north_up(10.0, 100.0, 2.0, 5.0);
        let b = t.bounds(3, 4);
        assert_eq!(b, BoundingBox::new(10.0, 80.0, 16.0, 100.0));
    }
}
