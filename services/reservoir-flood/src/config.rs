//! Run configuration.
//!
//! Values come from three layers, highest priority first: command-line
//! overrides, a YAML file, then built-in defaults. `${VAR}` references in
//! the file are expanded from the environment before parsing and a
//! leading `~` in any path is expanded to the home directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use flood_common::{FloodError, FloodResult, Stage, DEFAULT_NODATA_SENTINEL};
use flood_engine::{EngineConfig, Scenario};
use raster_store::{parse_color, LayerStyle};
use renderer::{BackgroundKind, RenderConfig};

/// One vector overlay and how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub path: PathBuf,
    /// Legend label; defaults to the file stem.
    #[serde(default)]
    pub label: Option<String>,
    /// `#rrggbb` or a basic color name.
    #[serde(default = "default_layer_color")]
    pub color: String,
    /// Line width in points.
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

fn default_layer_color() -> String {
    "blue".to_string()
}

fn default_line_width() -> f32 {
    1.5
}

impl LayerConfig {
    pub fn from_style(path: impl Into<PathBuf>, style: &LayerStyle) -> Self {
        let [r, g, b] = style.color;
        Self {
            path: path.into(),
            label: Some(style.label.clone()),
            color: format!("#{:02x}{:02x}{:02x}", r, g, b),
            line_width: style.line_width,
        }
    }

    pub fn style(&self) -> FloodResult<LayerStyle> {
        let color = parse_color(&self.color).ok_or_else(|| {
            FloodError::invalid_parameter(
                Stage::Load,
                "layers.color",
                format!("unrecognised color '{}' for {}", self.color, self.path.display()),
            )
        })?;
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "layers.line_width",
                format!("must be > 0, got {}", self.line_width),
            ));
        }
        let label = self.label.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Ok(LayerStyle::new(label, color, self.line_width))
    }
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Depth GeoTIFF of the single level, or of the highest animation level.
    pub depth_raster: PathBuf,
    /// PNG for single runs, GIF for animations. Defaults by mode.
    pub map: Option<PathBuf>,
    /// When set, every animation frame is exported here and an
    /// elevation-volume curve is reported.
    pub frame_rasters_dir: Option<PathBuf>,
    /// Optional machine-readable copy of the report.
    pub report_json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            depth_raster: PathBuf::from("water_depth.tif"),
            map: None,
            frame_rasters_dir: None,
            report_json: None,
        }
    }
}

impl OutputConfig {
    pub fn map_path(&self, scenario: &Scenario) -> PathBuf {
        match (&self.map, scenario.is_animation()) {
            (Some(p), _) => p.clone(),
            (None, false) => PathBuf::from("flood_map.png"),
            (None, true) => PathBuf::from("flood_animation.gif"),
        }
    }
}

/// Full configuration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodRunConfig {
    pub dem: Option<PathBuf>,
    pub imagery: Option<PathBuf>,
    pub layers: Vec<LayerConfig>,

    /// Single-run water level above the lowest DEM cell.
    pub water_elevation: Option<f64>,
    /// Animation ramp increment.
    pub step: Option<f64>,
    /// Animation ramp top.
    pub max_height: Option<f64>,

    pub nodata_sentinel: f32,
    pub parallel_threshold: usize,

    pub output: OutputConfig,
    pub render: RenderConfig,
}

impl Default for FloodRunConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            dem: None,
            imagery: None,
            layers: Vec::new(),
            water_elevation: None,
            step: None,
            max_height: None,
            nodata_sentinel: DEFAULT_NODATA_SENTINEL,
            parallel_threshold: engine.parallel_threshold,
            output: OutputConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Values supplied on the command line. `None` leaves the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dem: Option<PathBuf>,
    pub imagery: Option<PathBuf>,
    pub river: Option<PathBuf>,
    pub dam: Option<PathBuf>,
    pub water_elevation: Option<f64>,
    pub step: Option<f64>,
    pub max_height: Option<f64>,
    pub nodata_sentinel: Option<f32>,
    pub background: Option<BackgroundKind>,
    pub depth_raster: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub frame_rasters_dir: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub fps: Option<u32>,
}

impl FloodRunConfig {
    /// Parse YAML text, expanding `${VAR}` references first.
    pub fn from_yaml(text: &str) -> FloodResult<Self> {
        let expanded = shellexpand::env(text).map_err(|e| {
            FloodError::invalid_parameter(Stage::Load, "config", format!("variable expansion failed: {}", e))
        })?;
        let mut config: FloodRunConfig = serde_yaml::from_str(&expanded)
            .map_err(|e| FloodError::invalid_parameter(Stage::Load, "config", e.to_string()))?;
        config.expand_paths();
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> FloodResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| FloodError::input(path, e.to_string()))?;
        let config = Self::from_yaml(&text)?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply command-line values on top of this configuration.
    ///
    /// Scenario options are replaced as a group: any of
    /// `water_elevation`, `step` or `max_height` given on the command line
    /// discards all three from the file. An imagery path selects the
    /// imagery background unless a background is also given.
    pub fn apply_overrides(&mut self, o: Overrides) {
        if o.water_elevation.is_some() || o.step.is_some() || o.max_height.is_some() {
            self.water_elevation = o.water_elevation;
            self.step = o.step;
            self.max_height = o.max_height;
        }
        if let Some(v) = o.dem {
            self.dem = Some(v);
        }
        if let Some(v) = o.imagery {
            self.imagery = Some(v);
            if o.background.is_none() {
                self.render.background = BackgroundKind::Imagery;
            }
        }
        if let Some(v) = o.river {
            self.layers.push(LayerConfig::from_style(v, &LayerStyle::river()));
        }
        if let Some(v) = o.dam {
            self.layers.push(LayerConfig::from_style(v, &LayerStyle::dam()));
        }
        if let Some(v) = o.nodata_sentinel {
            self.nodata_sentinel = v;
        }
        if let Some(v) = o.background {
            self.render.background = v;
        }
        if let Some(v) = o.depth_raster {
            self.output.depth_raster = v;
        }
        if let Some(v) = o.map {
            self.output.map = Some(v);
        }
        if let Some(v) = o.frame_rasters_dir {
            self.output.frame_rasters_dir = Some(v);
        }
        if let Some(v) = o.report_json {
            self.output.report_json = Some(v);
        }
        if let Some(v) = o.font {
            self.render.font_path = Some(v);
        }
        if let Some(v) = o.fps {
            self.render.fps = v;
        }
        self.expand_paths();
    }

    fn expand_paths(&mut self) {
        fn tilde(p: &mut PathBuf) {
            if let Some(s) = p.to_str() {
                let expanded = shellexpand::tilde(s).into_owned();
                *p = PathBuf::from(expanded);
            }
        }
        let o = &mut self.output;
        for p in self
            .dem
            .iter_mut()
            .chain(self.imagery.iter_mut())
            .chain(self.layers.iter_mut().map(|l| &mut l.path))
            .chain(std::iter::once(&mut o.depth_raster))
            .chain(o.map.iter_mut())
            .chain(o.frame_rasters_dir.iter_mut())
            .chain(o.report_json.iter_mut())
            .chain(self.render.font_path.iter_mut())
        {
            tilde(p);
        }
    }

    pub fn scenario(&self) -> FloodResult<Scenario> {
        Scenario::from_options(self.water_elevation, self.step, self.max_height)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            parallel_threshold: self.parallel_threshold,
        }
    }

    /// Check everything that can be checked before touching input files.
    pub fn validate(&self) -> FloodResult<()> {
        if self.dem.is_none() {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "dem",
                "an elevation raster path is required",
            ));
        }
        self.scenario()?;
        // Must never be confused with a real water depth
        if !self.nodata_sentinel.is_finite() || self.nodata_sentinel > 0.0 {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "nodata_sentinel",
                format!("must be a finite value <= 0, got {}", self.nodata_sentinel),
            ));
        }
        self.engine_config().validate()?;
        for layer in &self.layers {
            layer.style()?;
        }
        self.render
            .validate()
            .map_err(|e| e.into_flood(self.output.map.clone().unwrap_or_default()))?;
        if self.render.background == BackgroundKind::Imagery && self.imagery.is_none() {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "imagery",
                "background 'imagery' needs an imagery raster",
            ));
        }
        if self.output.frame_rasters_dir.is_some() && self.water_elevation.is_some() {
            return Err(FloodError::invalid_parameter(
                Stage::Load,
                "frame_rasters_dir",
                "only applies to animation runs",
            ));
        }
        Ok(())
    }
}
