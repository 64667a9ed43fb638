//! Render configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use raster_store::parse_color;

use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};

/// What is drawn underneath the flood overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    /// Plain light-grey canvas.
    None,
    /// Grey-scale shaded relief derived from the DEM.
    #[default]
    Hillshade,
    /// Georeferenced RGB imagery in the DEM's CRS.
    Imagery,
}

impl fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackgroundKind::None => "none",
            BackgroundKind::Hillshade => "hillshade",
            BackgroundKind::Imagery => "imagery",
        })
    }
}

impl FromStr for BackgroundKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(BackgroundKind::None),
            "hillshade" | "relief" => Ok(BackgroundKind::Hillshade),
            "imagery" | "image" | "satellite" => Ok(BackgroundKind::Imagery),
            other => Err(RenderError::invalid_setting(
                "background",
                format!("expected none, hillshade or imagery, got '{}'", other),
            )),
        }
    }
}

/// Illumination for shaded relief.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Light source azimuth, degrees clockwise from north.
    pub azimuth: f64,
    /// Light source altitude above the horizon, degrees.
    pub altitude: f64,
    pub vertical_exaggeration: f64,
    /// Sample spacing used for the slope kernel. The default of 1 treats
    /// neighbouring cells as one unit apart regardless of cell size.
    pub dx: f64,
    pub dy: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0,
            altitude: 45.0,
            vertical_exaggeration: 1.0,
            dx: 1.0,
            dy: 1.0,
        }
    }
}

/// Rectangle in figure fractions, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureRect {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl FigureRect {
    pub fn new(left: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Pixel rectangle `(x, y, w, h)` on a canvas, y growing downwards.
    pub fn to_pixels(&self, canvas_w: u32, canvas_h: u32) -> (i32, i32, u32, u32) {
        let w = (self.width * canvas_w as f64).round().max(1.0) as u32;
        let h = (self.height * canvas_h as f64).round().max(1.0) as u32;
        let x = (self.left * canvas_w as f64).round() as i32;
        let y = ((1.0 - self.bottom - self.height) * canvas_h as f64).round() as i32;
        (x, y, w, h)
    }

    fn is_valid(&self) -> bool {
        let vals = [self.left, self.bottom, self.width, self.height];
        vals.iter().all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
            && self.left >= 0.0
            && self.bottom >= 0.0
            && self.left + self.width <= 1.0
            && self.bottom + self.height <= 1.0
    }
}

impl Default for FigureRect {
    fn default() -> Self {
        Self::new(0.79, 0.2, 0.02, 0.2)
    }
}

/// Everything the map renderer needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: BackgroundKind,
    pub hillshade: HillshadeParams,
    /// Opacity of the flood overlay in `[0, 1]`.
    pub flood_alpha: f32,
    /// Colormap stops as `#rrggbb` strings, low depth first.
    pub colormap: Vec<String>,
    pub colorbar: FigureRect,
    pub colorbar_label: String,
    /// Fraction of the canvas kept clear around the map extent.
    pub margin: f64,
    /// Animation frame rate.
    pub fps: u32,
    /// TrueType font used for titles and labels. Text is skipped when unset.
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub show_legend: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            background: BackgroundKind::default(),
            hillshade: HillshadeParams::default(),
            flood_alpha: 0.6,
            colormap: vec!["#00ffff".into(), "#0080ff".into(), "#000080".into()],
            colorbar: FigureRect::default(),
            colorbar_label: "Water depth (m)".into(),
            margin: 0.05,
            fps: 5,
            font_path: None,
            font_size: 18.0,
            show_legend: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::invalid_setting(
                "figure_size",
                format!("must be non-zero, got {}x{}", self.width, self.height),
            ));
        }
        if !(0.0..=1.0).contains(&self.flood_alpha) {
            return Err(RenderError::invalid_setting(
                "flood_alpha",
                format!("must be within [0, 1], got {}", self.flood_alpha),
            ));
        }
        if self.fps == 0 {
            return Err(RenderError::invalid_setting("fps", "must be at least 1"));
        }
        if !self.margin.is_finite() || !(0.0..0.5).contains(&self.margin) {
            return Err(RenderError::invalid_setting(
                "margin",
                format!("must be within [0, 0.5), got {}", self.margin),
            ));
        }
        if !self.colorbar.is_valid() {
            return Err(RenderError::invalid_setting(
                "colorbar",
                "rectangle must lie inside the figure",
            ));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(RenderError::invalid_setting("font_size", "must be > 0"));
        }
        let h = &self.hillshade;
        if !(0.0..=90.0).contains(&h.altitude) || !h.azimuth.is_finite() {
            return Err(RenderError::invalid_setting(
                "hillshade",
                "altitude must be within [0, 90] and azimuth finite",
            ));
        }
        if !(h.dx > 0.0 && h.dy > 0.0 && h.vertical_exaggeration.is_finite()) {
            return Err(RenderError::invalid_setting(
                "hillshade",
                "dx and dy must be > 0",
            ));
        }
        self.build_colormap().map(|_| ())
    }

    /// Parse the configured stops into a 256-bin colormap.
    pub fn build_colormap(&self) -> RenderResult<Colormap> {
        if self.colormap.is_empty() {
            return Err(RenderError::invalid_setting("colormap", "needs at least one color"));
        }
        let stops = self
            .colormap
            .iter()
            .map(|s| {
                parse_color(s)
                    .map(|[r, g, b]| Color::rgb(r, g, b))
                    .ok_or_else(|| RenderError::invalid_setting("colormap", format!("bad color '{}'", s)))
            })
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Colormap::from_stops(&stops, Colormap::DEFAULT_BINS))
    }

    /// GIF frame delay in milliseconds.
    pub fn frame_delay_ms(&self) -> u32 {
        1000 / self.fps.max(1)
    }
}
