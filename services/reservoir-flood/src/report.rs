//! Volume report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use flood_common::{FloodError, FloodResult, Stage};
use flood_engine::Volume;

/// Stored volume at one level of an animation ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub water_elevation: f64,
    pub volume_m3: f64,
    pub flooded_area_m2: f64,
    pub raster: PathBuf,
}

/// Outcome of a run. Every volume is integrated from an exported raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeReport {
    pub generated_at: DateTime<Utc>,
    pub dem: PathBuf,
    pub depth_raster: PathBuf,
    pub visual: PathBuf,
    pub animation: bool,
    pub water_elevation: f64,
    pub volume: Volume,
    /// Elevation-volume curve, empty unless frame rasters were exported.
    pub curve: Vec<CurvePoint>,
}

impl VolumeReport {
    pub fn total_volume(&self) -> f64 {
        self.volume.cubic_units
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> FloodResult<()> {
        let path = path.as_ref();
        let persist = |msg: String| FloodError::persistence(Stage::Report, path, msg);
        let json = serde_json::to_string_pretty(self).map_err(|e| persist(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persist(e.to_string()))?;
        }
        fs::write(path, json).map_err(|e| persist(e.to_string()))?;
        info!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }
}

impl fmt::Display for VolumeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "total stored water volume: {:.2} cubic meters",
            self.volume.cubic_units
        )?;
        write!(
            f,
            "cell size used: {} x {} meters",
            self.volume.cell_width, self.volume.cell_height
        )?;
        if !self.curve.is_empty() {
            write!(f, "\nelevation-volume curve:")?;
            for point in &self.curve {
                write!(
                    f,
                    "\n  +{:.2} m: {:.2} cubic meters",
                    point.water_elevation, point.volume_m3
                )?;
            }
        }
        Ok(())
    }
}
