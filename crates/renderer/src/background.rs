//! Background strategies drawn beneath the flood overlay.

use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use flood_common::BoundingBox;
use flood_engine::ElevationGrid;
use raster_store::Imagery;

use crate::error::{RenderError, RenderResult};
use crate::hillshade::hillshade;
use crate::style::{BackgroundKind, HillshadeParams};
use crate::viewport::{RasterSampler, Viewport};

/// Canvas color outside any raster.
pub const CANVAS_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Something that can fill the canvas before data layers are drawn.
pub trait BackgroundStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// World extent the background covers, if it has one of its own.
    fn extent(&self) -> Option<BoundingBox>;

    /// Paint the whole canvas. Called once per frame.
    fn paint(&self, canvas: &mut RgbaImage, viewport: &Viewport);
}

fn fill(canvas: &mut RgbaImage, color: [u8; 4]) {
    let pixels: &mut [u8] = canvas;
    pixels.par_chunks_exact_mut(4).for_each(|px| px.copy_from_slice(&color));
}

/// Paint every canvas pixel whose centre falls on a raster cell.
fn paint_sampled<F>(canvas: &mut RgbaImage, viewport: &Viewport, sampler: &RasterSampler, color_at: F)
where
    F: Fn(usize) -> Option<[u8; 3]> + Sync,
{
    let width = canvas.width() as usize;
    let pixels: &mut [u8] = canvas;
    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for (px, out) in row.chunks_exact_mut(4).enumerate() {
                let (x, y) = viewport.pixel_center(px as u32, py as u32);
                let rgb = sampler.index_at(x, y).and_then(&color_at);
                match rgb {
                    Some([r, g, b]) => out.copy_from_slice(&[r, g, b, 255]),
                    None => out.copy_from_slice(&CANVAS_COLOR),
                }
            }
        });
}

/// Blank canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainBackground;

impl BackgroundStrategy for PlainBackground {
    fn name(&self) -> &'static str {
        "none"
    }

    fn extent(&self) -> Option<BoundingBox> {
        None
    }

    fn paint(&self, canvas: &mut RgbaImage, _viewport: &Viewport) {
        fill(canvas, CANVAS_COLOR);
    }
}

/// Grey-scale shaded relief of the DEM, computed once.
pub struct HillshadeBackground {
    shade: Vec<f32>,
    sampler: RasterSampler,
    bounds: BoundingBox,
}

impl HillshadeBackground {
    pub fn new(dem: &ElevationGrid, params: &HillshadeParams) -> RenderResult<Self> {
        let shade = hillshade(dem, params);
        debug!(
            width = dem.width(),
            height = dem.height(),
            azimuth = params.azimuth,
            altitude = params.altitude,
            "Computed hillshade"
        );
        Ok(Self {
            shade,
            sampler: RasterSampler::new(dem.transform(), dem.width(), dem.height())?,
            bounds: dem.bounds(),
        })
    }
}

impl BackgroundStrategy for HillshadeBackground {
    fn name(&self) -> &'static str {
        "hillshade"
    }

    fn extent(&self) -> Option<BoundingBox> {
        Some(self.bounds)
    }

    fn paint(&self, canvas: &mut RgbaImage, viewport: &Viewport) {
        paint_sampled(canvas, viewport, &self.sampler, |i| {
            let v = *self.shade.get(i)?;
            if v.is_nan() {
                return None;
            }
            let g = (v * 255.0).round() as u8;
            Some([g, g, g])
        });
    }
}

/// RGB imagery already in the map CRS, drawn at its own resolution.
pub struct ImageryBackground {
    imagery: Imagery,
    sampler: RasterSampler,
}

impl ImageryBackground {
    pub fn new(imagery: Imagery) -> RenderResult<Self> {
        let sampler = RasterSampler::new(
            &imagery.transform,
            imagery.image.width() as usize,
            imagery.image.height() as usize,
        )?;
        Ok(Self { imagery, sampler })
    }
}

impl BackgroundStrategy for ImageryBackground {
    fn name(&self) -> &'static str {
        "imagery"
    }

    fn extent(&self) -> Option<BoundingBox> {
        Some(self.imagery.bounds())
    }

    fn paint(&self, canvas: &mut RgbaImage, viewport: &Viewport) {
        let raw = self.imagery.image.as_raw();
        paint_sampled(canvas, viewport, &self.sampler, |i| {
            let px = raw.get(i * 3..i * 3 + 3)?;
            Some([px[0], px[1], px[2]])
        });
    }
}

/// Build the background for `kind`.
///
/// `imagery` is required for [`BackgroundKind::Imagery`] and ignored
/// otherwise.
pub fn background_for(
    kind: BackgroundKind,
    dem: &ElevationGrid,
    imagery: Option<Imagery>,
    params: &HillshadeParams,
) -> RenderResult<Box<dyn BackgroundStrategy>> {
    let background: Box<dyn BackgroundStrategy> = match kind {
        BackgroundKind::None => Box::new(PlainBackground),
        BackgroundKind::Hillshade => Box::new(HillshadeBackground::new(dem, params)?),
        BackgroundKind::Imagery => {
            let imagery = imagery.ok_or_else(|| {
                RenderError::invalid_setting("imagery", "an imagery background needs an imagery file")
            })?;
            Box::new(ImageryBackground::new(imagery)?)
        }
    };
    Ok(background)
}
