//! Colorbar and layer legend.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use raster_store::LayerStyle;

use crate::colormap::Colormap;
use crate::overlay::draw_polyline;
use crate::text::TextRenderer;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TICK_LEN: i32 = 4;

/// "Nice" tick values from 0 to `vmax` inclusive, at most about
/// `max_ticks` of them, stepping by 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_ticks(vmax: f64, max_ticks: usize) -> Vec<f64> {
    if !(vmax > 0.0 && vmax.is_finite()) || max_ticks < 2 {
        return vec![0.0];
    }
    let raw = vmax / (max_ticks - 1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let count = (vmax / step + 1e-9).floor() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}

fn tick_label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').to_string()
    }
}

/// Vertical colorbar spanning `[0, vmax]`, low values at the bottom.
///
/// `rect` is `(x, y, w, h)` in canvas pixels. Tick labels and the axis
/// label are drawn only when a text renderer is available.
pub fn draw_colorbar(
    canvas: &mut RgbaImage,
    rect: (i32, i32, u32, u32),
    colormap: &Colormap,
    vmax: f32,
    text: Option<&TextRenderer>,
    label: &str,
) {
    let (x, y, w, h) = rect;
    for row in 0..h {
        let t = 1.0 - (row as f32 + 0.5) / h as f32;
        let color = colormap.sample(t).to_rgba();
        draw_filled_rect_mut(canvas, Rect::at(x, y + row as i32).of_size(w, 1), color);
    }
    draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(w, h), INK);

    let right = x + w as i32;
    let mut label_x = right + TICK_LEN + 2;
    let ticks = nice_ticks(vmax as f64, 6);
    for value in &ticks {
        let frac = if vmax > 0.0 { *value as f32 / vmax } else { 0.0 };
        let ty = y + h as i32 - 1 - (frac * (h as f32 - 1.0)).round() as i32;
        draw_line_segment_mut(
            canvas,
            (right as f32, ty as f32),
            ((right + TICK_LEN) as f32, ty as f32),
            INK,
        );
        if let Some(text) = text {
            let s = tick_label(*value);
            let (tw, th) = text.measure(&s, 0.7);
            text.draw(canvas, &s, right + TICK_LEN + 2, ty - th / 2, 0.7, INK);
            label_x = label_x.max(right + TICK_LEN + 2 + tw + 4);
        }
    }

    if let Some(text) = text {
        if !label.is_empty() {
            text.draw_vertical(canvas, label, label_x, y + h as i32 / 2, 0.8, INK);
        }
    }
}

/// Framed legend in the top-right corner of `area` with one line sample
/// per layer style.
pub fn draw_layer_legend(
    canvas: &mut RgbaImage,
    area: (i32, i32, u32, u32),
    entries: &[LayerStyle],
    px_per_point: f32,
    text: &TextRenderer,
) {
    if entries.is_empty() {
        return;
    }
    let scale = 0.8;
    let pad = 8;
    let sample_len = 30;
    let (_, line_h) = text.measure("Ag", scale);
    let row_h = line_h + 6;
    let text_w = entries
        .iter()
        .map(|e| text.measure(&e.label, scale).0)
        .max()
        .unwrap_or(0);
    let box_w = pad * 3 + sample_len + text_w;
    let box_h = pad * 2 + row_h * entries.len() as i32;

    let (ax, ay, aw, _) = area;
    let bx = ax + aw as i32 - box_w - pad;
    let by = ay + pad;
    if box_w <= 0 || box_h <= 0 {
        return;
    }
    let frame = Rect::at(bx, by).of_size(box_w as u32, box_h as u32);
    draw_filled_rect_mut(canvas, frame, Rgba([255, 255, 255, 255]));
    draw_hollow_rect_mut(canvas, frame, Rgba([204, 204, 204, 255]));

    for (i, entry) in entries.iter().enumerate() {
        let row_y = by + pad + row_h * i as i32;
        let mid = (row_y + row_h / 2) as f32;
        let [r, g, b] = entry.color;
        let x0 = (bx + pad) as f32;
        draw_polyline(
            canvas,
            &[(x0, mid), (x0 + sample_len as f32, mid)],
            (entry.line_width * px_per_point).max(1.0),
            Rgba([r, g, b, 255]),
        );
        text.draw(canvas, &entry.label, bx + pad * 2 + sample_len, row_y + 3, scale, INK);
    }
}
