//! Data layers drawn over the background: flood depth and vector layers.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use rayon::prelude::*;

use flood_engine::{CellState, MaskedDepthGrid};
use raster_store::{Geometry, VectorLayer};

use crate::colormap::Colormap;
use crate::error::RenderResult;
use crate::viewport::{RasterSampler, Viewport};

/// Tint wet cells by depth over `[0, vmax]`. Dry and missing cells leave
/// the canvas untouched.
pub fn draw_flood(
    canvas: &mut RgbaImage,
    viewport: &Viewport,
    masked: &MaskedDepthGrid,
    colormap: &Colormap,
    vmax: f32,
    alpha: f32,
) -> RenderResult<()> {
    let sampler = RasterSampler::new(masked.transform(), masked.width(), masked.height())?;
    let cells = masked.cells();
    let width = canvas.width() as usize;
    let pixels: &mut [u8] = canvas;

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for (px, out) in row.chunks_exact_mut(4).enumerate() {
                let (x, y) = viewport.pixel_center(px as u32, py as u32);
                if let Some(CellState::Wet(depth)) = sampler.index_at(x, y).and_then(|i| cells.get(i)) {
                    colormap.map(*depth, 0.0, vmax).blend_over(out, alpha);
                }
            }
        });
    Ok(())
}

/// Draw every geometry of `layer` in its style. `px_per_point` converts
/// the style's line width (typographic points) into canvas pixels.
pub fn draw_layer(canvas: &mut RgbaImage, viewport: &Viewport, layer: &VectorLayer, px_per_point: f32) {
    let [r, g, b] = layer.style.color;
    let color = Rgba([r, g, b, 255]);
    let width = (layer.style.line_width * px_per_point).max(1.0);

    for geometry in &layer.geometries {
        match geometry {
            Geometry::Point(c) => {
                let (x, y) = viewport.world_to_pixel(c.0, c.1);
                let radius = (width * 1.5).max(3.0).round() as i32;
                draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), radius, color);
            }
            Geometry::LineString(coords) => {
                let pts: Vec<(f32, f32)> = coords.iter().map(|c| viewport.world_to_pixel(c.0, c.1)).collect();
                draw_polyline(canvas, &pts, width, color);
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    let mut pts: Vec<(f32, f32)> =
                        ring.iter().map(|c| viewport.world_to_pixel(c.0, c.1)).collect();
                    if pts.len() > 1 && pts.first() != pts.last() {
                        pts.push(pts[0]);
                    }
                    draw_polyline(canvas, &pts, width, color);
                }
            }
        }
    }
}

/// Thick polyline with round joins.
pub fn draw_polyline(canvas: &mut RgbaImage, pts: &[(f32, f32)], width: f32, color: Rgba<u8>) {
    if pts.len() == 1 {
        let (x, y) = pts[0];
        draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), (width / 2.0).round() as i32, color);
        return;
    }
    for seg in pts.windows(2) {
        draw_thick_segment(canvas, seg[0], seg[1], width, color);
    }
    if width > 2.0 {
        let radius = (width / 2.0).round() as i32;
        for (x, y) in pts {
            draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), radius, color);
        }
    }
}

fn draw_thick_segment(canvas: &mut RgbaImage, a: (f32, f32), b: (f32, f32), width: f32, color: Rgba<u8>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if width <= 1.5 || len < 0.5 {
        draw_line_segment_mut(canvas, a, b, color);
        return;
    }
    let half = width / 2.0;
    let (nx, ny) = (-dy / len * half, dx / len * half);
    let corner = |x: f32, y: f32| Point::new(x.round() as i32, y.round() as i32);
    let quad = [
        corner(a.0 + nx, a.1 + ny),
        corner(b.0 + nx, b.1 + ny),
        corner(b.0 - nx, b.1 - ny),
        corner(a.0 - nx, a.1 - ny),
    ];
    // Polygon drawing rejects a closed ring; rounding can collapse one
    if quad[0] == quad[3] || quad[0] == quad[1] {
        draw_line_segment_mut(canvas, a, b, color);
    } else {
        draw_polygon_mut(canvas, &quad, color);
    }
}
