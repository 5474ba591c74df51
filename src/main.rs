//! CLI Entry Point for the SSRL beamline simulator
//!
//! Provides command-line access to the simulated HiTp endstation:
//! - Inspecting the device inventory and filestore
//! - Triggering the array detectors and dumping their asset documents
//! - Moving the stage and reading the height and beam-stop sensors
//! - Listing wafer sample positions
//!
//! # Usage
//!
//! ```bash
//! ssrl-sim info
//! ssrl-sim --seed 7 trigger --detector marccd --count 3
//! ssrl-sim sense --x 1.5 --y -2 --z 0.4
//! ssrl-sim wafer --radius 5 --square
//! ```

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use ssrl_core::capabilities::{Movable, Readable};
use ssrl_driver_sim::{wafer_locations, WaferShape};
use ssrl_sim::beamline::{Beamline, DetectorKind};
use ssrl_sim::config::{SimConfig, DEFAULT_CONFIG_FILE};
use ssrl_sim::telemetry::{self, OutputFormat, TracingConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ssrl-sim")]
#[command(about = "Simulated SSRL HiTp diffraction beamline", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for all random models (overrides the configuration)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log output format: pretty, compact or json
    #[arg(long, global = true, default_value = "compact")]
    log_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the filestore root and device inventory
    Info,

    /// Trigger an array detector and print readings and asset documents
    Trigger {
        /// Detector to trigger: marccd or xspress3
        #[arg(long, default_value = "marccd")]
        detector: DetectorKind,

        /// Number of triggers
        #[arg(long, default_value = "1")]
        count: u32,
    },

    /// Move the stage and read the range finder and beam-stop detector
    Sense {
        /// stage_x position
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// stage_y position
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// stage_z position
        #[arg(long, allow_hyphen_values = true)]
        z: Option<f64>,

        /// plate_x position
        #[arg(long, allow_hyphen_values = true)]
        plate_x: Option<f64>,

        /// plate_y position
        #[arg(long, allow_hyphen_values = true)]
        plate_y: Option<f64>,
    },

    /// Print wafer sample positions, one `x y` pair per line
    Wafer {
        /// Wafer radius in grid steps
        #[arg(long, default_value = "10")]
        radius: u32,

        /// Keep the full square grid instead of the inscribed circle
        #[arg(long)]
        square: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = SimConfig::load_from(&config_path)?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;

    let tracing_config = TracingConfig::from_sim_config(&config)
        .map_err(|e| anyhow!(e))?
        .with_format(cli.log_format);
    telemetry::init(&tracing_config).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Info => {
            let beamline = open_beamline(&config);
            println!(
                "Storage: tiff={} hdf5={}",
                ssrl_storage::TIFF_ENABLED,
                ssrl_storage::HDF5_ENABLED
            );
            for device in beamline.devices() {
                for (signal, key) in device.describe()? {
                    println!(
                        "{:<12} {:<12} {:<8} {:?}",
                        device.name(),
                        signal,
                        key.dtype,
                        key.shape
                    );
                }
            }
        }
        Commands::Trigger { detector, count } => {
            let mut beamline = open_beamline(&config);
            info!(%detector, count, "Triggering detector");
            for _ in 0..count {
                let acquisition = beamline.acquire(detector)?;
                println!("{}", serde_json::to_string(&acquisition)?);
            }
        }
        Commands::Sense {
            x,
            y,
            z,
            plate_x,
            plate_y,
        } => {
            let beamline = open_beamline(&config);
            let stage = &beamline.stage;
            stage.stage_x.move_abs(x)?;
            stage.stage_y.move_abs(y)?;
            if let Some(z) = z {
                stage.stage_z.move_abs(z)?;
            }
            if let Some(px) = plate_x {
                stage.plate_x.move_abs(px)?;
            }
            if let Some(py) = plate_y {
                stage.plate_y.move_abs(py)?;
            }

            let mut readings = beamline.lrf.read()?;
            readings.extend(beamline.pt_det.read()?);
            println!(
                "{}",
                json!({
                    "stage": beamline.baseline_readings()?,
                    "sensors": readings,
                })
            );
        }
        Commands::Wafer { radius, square } => {
            let shape = if square {
                WaferShape::Square
            } else {
                WaferShape::Circle
            };
            let (xs, ys) = wafer_locations(shape, radius);
            for (x, y) in xs.iter().zip(&ys) {
                println!("{x} {y}");
            }
        }
    }

    Ok(())
}

/// Build the beamline and announce where its files go.
fn open_beamline(config: &SimConfig) -> Beamline {
    let beamline = Beamline::from_config(config);
    println!("Filestore root: {}", beamline.filestore().root().display());
    beamline
}
