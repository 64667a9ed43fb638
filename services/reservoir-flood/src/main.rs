//! Reservoir flood simulation CLI.
//!
//! Floods a DEM to a water level (or a ramp of levels), renders a map or
//! animation, exports the depth raster and prints the stored volume.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use renderer::BackgroundKind;
use reservoir_flood::{FloodRunConfig, Overrides, PipelineContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "reservoir-flood")]
#[command(about = "Simulate reservoir filling over a DEM and report the stored volume")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "RESERVOIR_FLOOD_CONFIG")]
    config: Option<PathBuf>,

    /// Elevation raster (GeoTIFF)
    #[arg(long)]
    dem: Option<PathBuf>,

    /// Background imagery (GeoTIFF, same CRS as the DEM)
    #[arg(long)]
    imagery: Option<PathBuf>,

    /// River layer (GeoJSON), drawn blue
    #[arg(long)]
    river: Option<PathBuf>,

    /// Dam layer (GeoJSON), drawn red
    #[arg(long)]
    dam: Option<PathBuf>,

    /// Water level above the lowest DEM cell, for a single map
    #[arg(long, conflicts_with_all = ["step", "max_height"])]
    water_elevation: Option<f64>,

    /// Level increment for an animation
    #[arg(long, requires = "max_height")]
    step: Option<f64>,

    /// Highest level of an animation
    #[arg(long, requires = "step")]
    max_height: Option<f64>,

    /// Value written for dry cells in the depth raster
    #[arg(long, allow_negative_numbers = true)]
    nodata: Option<f32>,

    /// Background under the flood overlay: none, hillshade or imagery
    #[arg(long)]
    background: Option<BackgroundKind>,

    /// Depth raster output path
    #[arg(long)]
    output_raster: Option<PathBuf>,

    /// Map (PNG) or animation (GIF) output path
    #[arg(long)]
    output_map: Option<PathBuf>,

    /// Export every animation frame's depth raster into this directory
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Also write the report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// TrueType font for title and labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Animation frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            dem: self.dem.clone(),
            imagery: self.imagery.clone(),
            river: self.river.clone(),
            dam: self.dam.clone(),
            water_elevation: self.water_elevation,
            step: self.step,
            max_height: self.max_height,
            nodata_sentinel: self.nodata,
            background: self.background,
            depth_raster: self.output_raster.clone(),
            map: self.output_map.clone(),
            frame_rasters_dir: self.frames_dir.clone(),
            report_json: self.report_json.clone(),
            font: self.font.clone(),
            fps: self.fps,
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match args.log_format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => FloodRunConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => FloodRunConfig::default(),
    };
    config.apply_overrides(args.overrides());

    let context = PipelineContext::new(config)?;
    let report = context.run()?;
    println!("{}", report);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting reservoir-flood");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Flood run failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
