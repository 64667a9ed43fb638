//! Flood map composition.
//!
//! The background does not change between frames, so it is painted once
//! into a base image that every frame starts from.

use std::collections::VecDeque;
use std::path::Path;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::info;

use flood_common::{BoundingBox, FloodError, FloodResult};
use flood_engine::{Frame, MaskedDepthGrid};
use raster_store::VectorLayer;

use crate::animation::write_gif;
use crate::background::BackgroundStrategy;
use crate::colormap::Colormap;
use crate::error::{RenderError, RenderResult};
use crate::legend::{draw_colorbar, draw_layer_legend};
use crate::overlay::{draw_flood, draw_layer};
use crate::png::save_png;
use crate::style::RenderConfig;
use crate::text::TextRenderer;
use crate::viewport::{union_extent, Viewport};

const TITLE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Title shown above every frame.
pub fn frame_title(water_elevation: f64) -> String {
    format!("Reservoir flood simulation (water level: +{:.2} m)", water_elevation)
}

pub struct MapRenderer {
    config: RenderConfig,
    colormap: Colormap,
    layers: Vec<VectorLayer>,
    viewport: Viewport,
    /// Canvas rectangle covered by the data extent.
    map_area: (i32, i32, u32, u32),
    text: Option<TextRenderer>,
    base: RgbaImage,
}

impl MapRenderer {
    /// Prepare a renderer whose extent covers the DEM, the background and
    /// every layer. Layers must already be in the DEM's CRS.
    pub fn new(
        config: RenderConfig,
        background: &dyn BackgroundStrategy,
        layers: Vec<VectorLayer>,
        dem_bounds: BoundingBox,
    ) -> RenderResult<Self> {
        config.validate()?;
        let colormap = config.build_colormap()?;

        let extent = union_extent(
            std::iter::once(Some(dem_bounds))
                .chain(std::iter::once(background.extent()))
                .chain(layers.iter().map(VectorLayer::bounds)),
        )
        .unwrap_or(dem_bounds);
        let viewport = Viewport::fit(&extent, config.width, config.height, config.margin)?;

        let (x0, y0) = viewport.world_to_pixel(extent.min_x, extent.max_y);
        let (x1, y1) = viewport.world_to_pixel(extent.max_x, extent.min_y);
        let map_area = (
            x0.round() as i32,
            y0.round() as i32,
            (x1 - x0).round().max(1.0) as u32,
            (y1 - y0).round().max(1.0) as u32,
        );

        let text = config
            .font_path
            .as_ref()
            .map(|p| TextRenderer::load(p, config.font_size))
            .transpose()?;

        let mut base = RgbaImage::new(config.width, config.height);
        background.paint(&mut base, &viewport);

        info!(
            width = config.width,
            height = config.height,
            background = background.name(),
            layers = layers.len(),
            text = text.is_some(),
            "Map renderer ready"
        );

        Ok(Self {
            config,
            colormap,
            layers,
            viewport,
            map_area,
            text,
            base,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Pixels per typographic point, for a figure ten inches wide.
    fn px_per_point(&self) -> f32 {
        self.config.width as f32 / 720.0
    }

    /// Compose one frame: background, flood overlay, vector layers,
    /// colorbar, then text.
    pub fn render_frame(&self, masked: &MaskedDepthGrid, vmax: f32, water_elevation: f64) -> RenderResult<RgbaImage> {
        let mut canvas = self.base.clone();
        draw_flood(
            &mut canvas,
            &self.viewport,
            masked,
            &self.colormap,
            vmax,
            self.config.flood_alpha,
        )?;

        let px_per_point = self.px_per_point();
        for layer in &self.layers {
            draw_layer(&mut canvas, &self.viewport, layer, px_per_point);
        }

        let bar = self.config.colorbar.to_pixels(self.config.width, self.config.height);
        draw_colorbar(
            &mut canvas,
            bar,
            &self.colormap,
            vmax,
            self.text.as_ref(),
            &self.config.colorbar_label,
        );

        if let Some(text) = &self.text {
            let title = frame_title(water_elevation);
            let (_, th) = text.measure(&title, 1.0);
            let top = ((self.map_area.1 - th) / 2).max(2);
            text.draw_centered(&mut canvas, &title, self.config.width as i32 / 2, top, 1.0, TITLE_COLOR);

            if self.config.show_legend {
                let styles: Vec<_> = self.layers.iter().map(|l| l.style.clone()).collect();
                draw_layer_legend(&mut canvas, self.map_area, &styles, px_per_point, text);
            }
        }
        Ok(canvas)
    }

    /// Render a single static map to PNG.
    pub fn render_png(
        &self,
        masked: &MaskedDepthGrid,
        vmax: f32,
        water_elevation: f64,
        path: impl AsRef<Path>,
    ) -> FloodResult<()> {
        let path = path.as_ref();
        let canvas = self
            .render_frame(masked, vmax, water_elevation)
            .map_err(|e| e.into_flood(path))?;
        save_png(path, canvas.as_raw(), canvas.width() as usize, canvas.height() as usize)
            .map_err(|e| e.into_flood(path))?;
        info!(path = %path.display(), water_elevation, "Wrote flood map");
        Ok(())
    }

    /// Render an animation to GIF in the order `frames` yields them.
    ///
    /// Frames are pulled in batches of one per rayon thread, rendered in
    /// parallel and encoded in order, so at most one batch of images is
    /// held in memory.
    pub fn render_gif<I>(&self, frames: I, vmax: f32, path: impl AsRef<Path>) -> FloodResult<usize>
    where
        I: IntoIterator<Item = FloodResult<Frame>>,
    {
        let path = path.as_ref();
        let batch = rayon::current_num_threads().max(1);
        let mut source = frames.into_iter();
        let mut pending: VecDeque<FloodResult<RgbaImage>> = VecDeque::with_capacity(batch);

        let rendered = std::iter::from_fn(|| -> Option<Result<RgbaImage, GifFailure>> {
            if pending.is_empty() {
                let chunk: Vec<FloodResult<Frame>> = source.by_ref().take(batch).collect();
                let images: Vec<FloodResult<RgbaImage>> = chunk
                    .into_par_iter()
                    .map(|frame| {
                        let frame = frame?;
                        self.render_frame(&frame.masked(), vmax, frame.water_elevation)
                            .map_err(|e| e.into_flood(path))
                    })
                    .collect();
                pending.extend(images);
            }
            pending.pop_front().map(|r| r.map_err(GifFailure::Frame))
        });

        write_gif(path, self.config.fps, rendered).map_err(|e| match e {
            GifFailure::Frame(err) => err,
            GifFailure::Encode(err) => err.into_flood(path),
        })
    }
}

/// Keeps frame failures apart from encoder failures so only the latter
/// get attributed to the GIF path.
enum GifFailure {
    Frame(FloodError),
    Encode(RenderError),
}

impl From<RenderError> for GifFailure {
    fn from(err: RenderError) -> Self {
        GifFailure::Encode(err)
    }
}
