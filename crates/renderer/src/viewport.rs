//! World-to-canvas mapping.
//!
//! The viewport keeps one scale for both axes so a square metre stays
//! square on the canvas; the map extent is centred and the leftover
//! space on the longer canvas axis becomes padding.

use flood_common::{AffineTransform, BoundingBox};

use crate::error::{RenderError, RenderResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World extent covered by the full canvas.
    view: BoundingBox,
    /// Canvas pixels per world unit.
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Fit `extent` into a `width` x `height` canvas, leaving `margin`
    /// (a fraction of each canvas dimension) clear on every side.
    pub fn fit(extent: &BoundingBox, width: u32, height: u32, margin: f64) -> RenderResult<Self> {
        let ew = extent.width();
        let eh = extent.height();
        let finite = [extent.min_x, extent.min_y, extent.max_x, extent.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || ew < 0.0 || eh < 0.0 || (ew == 0.0 && eh == 0.0) {
            return Err(RenderError::Empty(format!(
                "cannot fit [{}, {}, {}, {}]",
                extent.min_x, extent.min_y, extent.max_x, extent.max_y
            )));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::invalid_setting("figure_size", "canvas must be non-zero"));
        }

        let inner_w = width as f64 * (1.0 - 2.0 * margin);
        let inner_h = height as f64 * (1.0 - 2.0 * margin);
        let scale = match (ew > 0.0, eh > 0.0) {
            (true, true) => (inner_w / ew).min(inner_h / eh),
            (true, false) => inner_w / ew,
            _ => inner_h / eh,
        };

        let half_w = width as f64 / scale / 2.0;
        let half_h = height as f64 / scale / 2.0;
        let cx = (extent.min_x + extent.max_x) / 2.0;
        let cy = (extent.min_y + extent.max_y) / 2.0;

        Ok(Self {
            view: BoundingBox::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h),
            scale,
            width,
            height,
        })
    }

    pub fn view(&self) -> &BoundingBox {
        &self.view
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Canvas position of a world coordinate (pixel edges, y down).
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        (
            ((x - self.view.min_x) * self.scale) as f32,
            ((self.view.max_y - y) * self.scale) as f32,
        )
    }

    /// World coordinate of a canvas position.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.view.min_x + px / self.scale,
            self.view.max_y - py / self.scale,
        )
    }

    /// World coordinate of the centre of canvas pixel `(px, py)`.
    pub fn pixel_center(&self, px: u32, py: u32) -> (f64, f64) {
        self.pixel_to_world(px as f64 + 0.5, py as f64 + 0.5)
    }
}

/// Union of every extent present; `None` when all are absent.
pub fn union_extent<I>(extents: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = Option<BoundingBox>>,
{
    extents
        .into_iter()
        .flatten()
        .reduce(|acc, b| acc.union(&b))
}

/// Nearest-neighbour lookup from world coordinates into a raster.
#[derive(Debug, Clone, Copy)]
pub struct RasterSampler {
    inverse: AffineTransform,
    width: usize,
    height: usize,
}

impl RasterSampler {
    pub fn new(transform: &AffineTransform, width: usize, height: usize) -> RenderResult<Self> {
        let inverse = transform.inverse().ok_or_else(|| {
            RenderError::Empty("raster transform is not invertible".to_string())
        })?;
        Ok(Self {
            inverse,
            width,
            height,
        })
    }

    /// Row-major index of the cell containing `(x, y)`.
    pub fn index_at(&self, x: f64, y: f64) -> Option<usize> {
        let (col, row) = self.inverse.apply(x, y);
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_preserves_aspect_and_centres() {
        let extent = BoundingBox::new(0.0, 0.0, 200.0, 100.0);
        let vp = Viewport::fit(&extent, 1000, 1000, 0.0).unwrap();
        assert_eq!(vp.scale(), 5.0);
        assert_eq!(vp.world_to_pixel(0.0, 100.0), (0.0, 250.0));
        assert_eq!(vp.world_to_pixel(200.0, 0.0), (1000.0, 750.0));
        assert_eq!(vp.pixel_to_world(500.0, 500.0), (100.0, 50.0));
    }

    #[test]
    fn test_fit_with_margin() {
        let extent = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let vp = Viewport::fit(&extent, 1000, 1000, 0.1).unwrap();
        assert_eq!(vp.scale(), 8.0);
        assert_eq!(vp.world_to_pixel(0.0, 100.0), (100.0, 100.0));
    }

    #[test]
    fn test_fit_rejects_point_extent() {
        let extent = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        assert!(Viewport::fit(&extent, 100, 100, 0.0).is_err());
        let line = BoundingBox::new(0.0, 5.0, 10.0, 5.0);
        assert!(Viewport::fit(&line, 100, 100, 0.0).is_ok());
    }

    #[test]
    fn test_union_extent() {
        let u = union_extent([
            Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            None,
            Some(BoundingBox::new(-1.0, 0.5, 0.5, 3.0)),
        ])
        .unwrap();
        assert_eq!(u, BoundingBox::new(-1.0, 0.0, 1.0, 3.0));
        assert!(union_extent([None, None]).is_none());
    }

    #[test]
    fn test_raster_sampler() {
        let t = AffineTransform::north_up(100.0, 200.0, 10.0, 10.0);
        let s = RasterSampler::new(&t, 3, 2).unwrap();
        assert_eq!(s.index_at(105.0, 195.0), Some(0));
        assert_eq!(s.index_at(125.0, 185.0), Some(5));
        assert_eq!(s.index_at(135.0, 185.0), None);
        assert_eq!(s.index_at(95.0, 195.0), None);
    }
}
