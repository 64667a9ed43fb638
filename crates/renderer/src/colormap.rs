//! Linear segmented colormaps for depth shading.

use image::Rgba;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Opaque color from unit-range channels.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(c(r), c(g), c(b))
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Composite this color over `dst` with the given opacity.
    pub fn blend_over(self, dst: &mut [u8], alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        for (d, s) in dst.iter_mut().zip([self.r, self.g, self.b]) {
            *d = (s as f32 * a + *d as f32 * (1.0 - a)).round() as u8;
        }
        if dst.len() > 3 {
            dst[3] = 255;
        }
    }
}

/// Linear interpolation between two colors
pub fn interpolate_color(c1: Color, c2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::new(
        lerp(c1.r, c2.r),
        lerp(c1.g, c2.g),
        lerp(c1.b, c2.b),
        lerp(c1.a, c2.a),
    )
}

/// A lookup table of `n` colors spanning evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    lut: Vec<Color>,
}

impl Colormap {
    pub const DEFAULT_BINS: usize = 256;

    /// Build an `n`-entry table interpolating linearly between `stops`,
    /// placed at equal spacing over `[0, 1]`.
    pub fn from_stops(stops: &[Color], n: usize) -> Self {
        let n = n.max(2);
        let lut = match stops {
            [] => vec![Color::transparent(); n],
            [only] => vec![*only; n],
            _ => {
                let segments = (stops.len() - 1) as f32;
                (0..n)
                    .map(|i| {
                        let x = i as f32 / (n - 1) as f32 * segments;
                        let k = (x.floor() as usize).min(stops.len() - 2);
                        interpolate_color(stops[k], stops[k + 1], x - k as f32)
                    })
                    .collect()
            }
        };
        Self { lut }
    }

    /// Cyan through medium blue to dark blue, 256 bins.
    pub fn flood() -> Self {
        Self::from_stops(
            &[
                Color::from_unit(0.0, 1.0, 1.0),
                Color::from_unit(0.0, 0.5, 1.0),
                Color::from_unit(0.0, 0.0, 0.5),
            ],
            Self::DEFAULT_BINS,
        )
    }

    pub fn len(&self) -> usize {
        self.lut.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    /// Color at normalised position `t`; out-of-range values clamp.
    pub fn sample(&self, t: f32) -> Color {
        let n = self.lut.len();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.lut[((t * n as f32) as usize).min(n - 1)]
    }

    /// Color for `value` normalised over `[vmin, vmax]`.
    pub fn map(&self, value: f32, vmin: f32, vmax: f32) -> Color {
        if vmax > vmin {
            self.sample((value - vmin) / (vmax - vmin))
        } else {
            self.sample(0.0)
        }
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::flood()
    }
}
