//! Shaded relief from an elevation grid.
//!
//! Slopes come from the 3x3 Horn kernel with `p = dz/dx` (east) and
//! `q = dz/dy` (north). Illumination then follows
//!
//! ```text
//! val = sin(slope) * (sin(alt) / tan(slope) - cos(alt) * sin(az - aspect))
//! ```
//!
//! clamped at zero, and the whole grid is stretched to `[0, 1]`.

use std::f64::consts::PI;

use rayon::prelude::*;

use flood_engine::ElevationGrid;

use crate::style::HillshadeParams;

/// Flat cells would divide by zero in the illumination term.
const MIN_TAN_SLOPE: f64 = 0.00017;

/// Relief intensity per cell in `[0, 1]`; missing cells are NaN.
pub fn hillshade(grid: &ElevationGrid, params: &HillshadeParams) -> Vec<f32> {
    let width = grid.width();
    let height = grid.height();
    let mut out = vec![f32::NAN; width * height];
    if width == 0 || height == 0 {
        return out;
    }

    let azimuth = (params.azimuth - 90.0).to_radians();
    let altitude = params.altitude.to_radians();
    let (sin_alt, cos_alt) = altitude.sin_cos();
    let z_factor = params.vertical_exaggeration;
    let half_pi = PI / 2.0;

    let value_at = |col: isize, row: isize, fallback: f64| -> f64 {
        let c = col.clamp(0, width as isize - 1) as usize;
        let r = row.clamp(0, height as isize - 1) as usize;
        match grid.get(c, r) {
            Some(z) if !grid.is_missing(z) => z as f64 * z_factor,
            _ => fallback,
        }
    };

    out.par_chunks_mut(width).enumerate().for_each(|(row, line)| {
        for (col, px) in line.iter_mut().enumerate() {
            let centre = match grid.get(col, row) {
                Some(z) if !grid.is_missing(z) => z as f64 * z_factor,
                _ => continue,
            };
            let (c, r) = (col as isize, row as isize);
            let n = |dc: isize, dr: isize| value_at(c + dc, r + dr, centre);

            let p = ((n(1, -1) + 2.0 * n(1, 0) + n(1, 1)) - (n(-1, -1) + 2.0 * n(-1, 0) + n(-1, 1)))
                / (8.0 * params.dx);
            let q = ((n(-1, -1) + 2.0 * n(0, -1) + n(1, -1)) - (n(-1, 1) + 2.0 * n(0, 1) + n(1, 1)))
                / (8.0 * params.dy);

            let tan_slope = (p * p + q * q).sqrt().max(MIN_TAN_SLOPE);
            let aspect = if p != 0.0 {
                PI - (q / p).atan() + half_pi * p.signum()
            } else {
                PI
            };
            let term1 = tan_slope / (1.0 + tan_slope * tan_slope).sqrt();
            let term2 = sin_alt / tan_slope;
            let term3 = cos_alt * (azimuth - aspect).sin();
            *px = (term1 * (term2 - term3)).max(0.0) as f32;
        }
    });

    stretch(&mut out);
    out
}

/// Linearly rescale finite values to `[0, 1]`. A constant field maps to
/// its own value clamped into range.
fn stretch(values: &mut [f32]) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !(hi > lo) {
        values
            .iter_mut()
            .filter(|v| v.is_finite())
            .for_each(|v| *v = v.clamp(0.0, 1.0));
        return;
    }
    let range = hi - lo;
    values
        .par_iter_mut()
        .filter(|v| v.is_finite())
        .for_each(|v| *v = (*v - lo) / range);
}
