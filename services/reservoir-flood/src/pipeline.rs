//! Staged flood pipeline.
//!
//! ```text
//! load ──► compute ──► render ──► export ──► report
//! ```
//!
//! Each stage is a method on [`PipelineContext`] taking the previous
//! stage's output, so nothing is shared between runs. Rendering comes
//! before export: a failed export still leaves a complete map or
//! animation on disk. The reported volume is always integrated from the
//! exported raster, never from the in-memory grid.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use flood_common::{FloodError, FloodResult, Stage};
use flood_engine::{cell_area, mask_dry, DepthEngine, ElevationGrid, FloodSequence, MaskedDepthGrid, Scenario};
use projection::{BuiltinReprojector, Reprojector};
use raster_store::{integrate_exported_volume, read_dem, read_imagery, read_vector_layer, write_depth, Imagery, VectorLayer};
use renderer::{background_for, BackgroundKind, MapRenderer};

use crate::config::FloodRunConfig;
use crate::report::{CurvePoint, VolumeReport};

/// Everything read from disk, already in the DEM's CRS.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub dem_path: PathBuf,
    pub dem: ElevationGrid,
    pub layers: Vec<VectorLayer>,
    pub imagery: Option<Imagery>,
}

/// Depth grid of the level that gets exported and reported.
#[derive(Debug, Clone)]
pub struct Computed {
    pub water_elevation: f64,
    pub masked: MaskedDepthGrid,
}

/// Rasters written by the export stage.
#[derive(Debug, Clone)]
pub struct Exported {
    pub depth_raster: PathBuf,
    pub water_elevation: f64,
    /// `(water_elevation, path)` per animation frame, in level order.
    pub frame_rasters: Vec<(f64, PathBuf)>,
}

pub struct PipelineContext {
    config: FloodRunConfig,
    scenario: Scenario,
    engine: DepthEngine,
    reprojector: Box<dyn Reprojector>,
}

impl PipelineContext {
    /// Validate `config` and prepare a context with the built-in
    /// reprojector.
    pub fn new(config: FloodRunConfig) -> FloodResult<Self> {
        config.validate()?;
        let scenario = config.scenario()?;
        let engine = DepthEngine::new(config.engine_config());
        Ok(Self {
            config,
            scenario,
            engine,
            reprojector: Box::new(BuiltinReprojector::new()),
        })
    }

    pub fn with_reprojector(mut self, reprojector: Box<dyn Reprojector>) -> Self {
        self.reprojector = reprojector;
        self
    }

    pub fn config(&self) -> &FloodRunConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn map_path(&self) -> PathBuf {
        self.config.output.map_path(&self.scenario)
    }

    fn sequence(&self) -> Option<FloodSequence> {
        match self.scenario {
            Scenario::Animation(seq) => Some(seq),
            Scenario::Single { .. } => None,
        }
    }

    /// Read the DEM, vector layers and imagery, and bring every layer
    /// into the DEM's CRS.
    pub fn load(&self) -> FloodResult<Inputs> {
        let dem_path = self.config.dem.clone().ok_or_else(|| {
            FloodError::invalid_parameter(Stage::Load, "dem", "an elevation raster path is required")
        })?;
        let dem = read_dem(&dem_path)?;
        cell_area(dem.transform()).map_err(|e| match e {
            FloodError::InvalidGeometry { message, .. } => FloodError::InvalidGeometry {
                stage: Stage::Load,
                message: format!("elevation grid '{}': {}", dem_path.display(), message),
            },
            other => other,
        })?;
        let target = *dem.crs();

        let mut layers = Vec::with_capacity(self.config.layers.len());
        for layer_config in &self.config.layers {
            let layer = read_vector_layer(&layer_config.path, layer_config.style()?)?;
            let layer = self.reprojector.reproject_layer(&layer, &target)?;
            if layer.geometries.is_empty() {
                warn!(path = %layer_config.path.display(), "Vector layer has no geometries");
            }
            layers.push(layer);
        }

        let imagery = match (&self.config.imagery, self.config.render.background) {
            (Some(path), BackgroundKind::Imagery) => {
                let imagery = read_imagery(path)?;
                if imagery.crs != target {
                    return Err(FloodError::geometry_mismatch(
                        Stage::Load,
                        format!(
                            "imagery '{}' is in {} but the elevation grid is in {}; reproject the imagery first",
                            path.display(),
                            imagery.crs,
                            target
                        ),
                    ));
                }
                if !imagery.bounds().intersects(&dem.bounds()) {
                    warn!(path = %path.display(), "Imagery does not overlap the elevation grid");
                }
                Some(imagery)
            }
            (Some(path), _) => {
                debug!(path = %path.display(), "Imagery configured but not used as background");
                None
            }
            (None, _) => None,
        };

        info!(
            dem = %dem_path.display(),
            width = dem.width(),
            height = dem.height(),
            crs = %target,
            layers = layers.len(),
            imagery = imagery.is_some(),
            "Loaded inputs"
        );
        Ok(Inputs {
            dem_path,
            dem,
            layers,
            imagery,
        })
    }

    /// Flood the DEM to the single level, or to the top of the ramp.
    pub fn compute(&self, inputs: &Inputs) -> FloodResult<Computed> {
        let water_elevation = self.scenario.final_level();
        let depth = self.engine.compute(&inputs.dem, water_elevation)?;
        let masked = mask_dry(&depth);
        info!(
            water_elevation,
            base_elevation = depth.base_elevation(),
            wet_cells = masked.wet_count(),
            dry_cells = masked.dry_count(),
            missing_cells = masked.missing_count(),
            max_depth = masked.max_depth(),
            "Computed flood depth"
        );
        Ok(Computed {
            water_elevation,
            masked,
        })
    }

    /// Draw the static map or the animation. Returns the artifact path.
    pub fn render(&self, inputs: &Inputs, computed: &Computed) -> FloodResult<PathBuf> {
        let path = self.map_path();
        let render = &self.config.render;
        let background = background_for(
            render.background,
            &inputs.dem,
            inputs.imagery.clone(),
            &render.hillshade,
        )
        .map_err(|e| e.into_flood(&path))?;
        let renderer = MapRenderer::new(
            render.clone(),
            background.as_ref(),
            inputs.layers.clone(),
            inputs.dem.bounds(),
        )
        .map_err(|e| e.into_flood(&path))?;

        match self.sequence() {
            None => {
                let vmax = computed.masked.max_depth();
                renderer.render_png(&computed.masked, vmax, computed.water_elevation, &path)?;
            }
            Some(seq) => {
                let vmax = seq.max_height() as f32;
                renderer.render_gif(seq.frames(&self.engine, &inputs.dem), vmax, &path)?;
            }
        }
        Ok(path)
    }

    /// Write the depth raster, plus one raster per frame when a frame
    /// directory is configured.
    pub fn export(&self, inputs: &Inputs, computed: &Computed) -> FloodResult<Exported> {
        let sentinel = self.config.nodata_sentinel;
        let depth_raster = self.config.output.depth_raster.clone();
        write_depth(&depth_raster, &computed.masked, sentinel)?;

        let mut frame_rasters = Vec::new();
        if let (Some(seq), Some(dir)) = (self.sequence(), &self.config.output.frame_rasters_dir) {
            for frame in seq.frames(&self.engine, &inputs.dem) {
                let frame = frame?;
                let path = frame_raster_path(dir, frame.index);
                write_depth(&path, &frame.masked(), sentinel)?;
                frame_rasters.push((frame.water_elevation, path));
            }
            info!(dir = %dir.display(), frames = frame_rasters.len(), "Exported frame rasters");
        }

        Ok(Exported {
            depth_raster,
            water_elevation: computed.water_elevation,
            frame_rasters,
        })
    }

    /// Integrate volumes from the exported rasters.
    pub fn report(&self, inputs: &Inputs, exported: &Exported, visual: &Path) -> FloodResult<VolumeReport> {
        let volume = integrate_exported_volume(&exported.depth_raster)?;

        let curve = exported
            .frame_rasters
            .iter()
            .map(|(level, path)| {
                let v = integrate_exported_volume(path)?;
                Ok(CurvePoint {
                    water_elevation: *level,
                    volume_m3: v.cubic_units,
                    flooded_area_m2: v.flooded_area(),
                    raster: path.clone(),
                })
            })
            .collect::<FloodResult<Vec<_>>>()?;

        let report = VolumeReport {
            generated_at: Utc::now(),
            dem: inputs.dem_path.clone(),
            depth_raster: exported.depth_raster.clone(),
            visual: visual.to_path_buf(),
            animation: self.scenario.is_animation(),
            water_elevation: exported.water_elevation,
            volume,
            curve,
        };
        if let Some(path) = &self.config.output.report_json {
            report.write_json(path)?;
        }
        info!(
            volume_m3 = report.total_volume(),
            wet_cells = volume.wet_cells,
            cell_width = volume.cell_width,
            cell_height = volume.cell_height,
            "Volume report ready"
        );
        Ok(report)
    }

    /// Run every stage in order, stopping at the first error.
    pub fn run(&self) -> FloodResult<VolumeReport> {
        let mode = if self.scenario.is_animation() { "animation" } else { "single" };
        info!(
            mode,
            frames = self.scenario.frame_count(),
            final_level = self.scenario.final_level(),
            "Starting flood run"
        );
        let inputs = self.load()?;
        let computed = self.compute(&inputs)?;
        let visual = self.render(&inputs, &computed)?;
        info!(path = %visual.display(), "Rendered");
        let exported = self.export(&inputs, &computed)?;
        self.report(&inputs, &exported, &visual)
    }
}

/// Path of frame `index` inside the frame raster directory.
pub fn frame_raster_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("depth_{:04}.tif", index))
}
