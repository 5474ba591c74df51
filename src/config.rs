//! Simulator Configuration using Figment
//!
//! Configuration is layered:
//! 1. Built-in defaults
//! 2. `ssrl_sim.toml` (or an explicit file)
//! 3. Environment variables prefixed with `SSRL_SIM_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use ssrl_sim::config::SimConfig;
//!
//! let config = SimConfig::load()?;
//! config.validate()?;
//! println!("Filestore: {}", config.filestore.root.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Example override: `SSRL_SIM_MARCCD__PEAK_CHANCE=0.2`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use ssrl_core::document::PathSemantics;
use ssrl_core::error::{SimError, SimResult};
use ssrl_driver_sim::beam_stop::DEFAULT_MAX_INTENSITY;
use ssrl_driver_sim::{FilestoreLayout, ImageProducerConfig, SpectrumProducerConfig};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ssrl_sim.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SSRL_SIM_";

/// Top-level simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Seed for every random model; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Where detectors write their files
    pub filestore: FilestoreConfig,
    /// MarCCD area detector image settings
    pub marccd: ImageProducerConfig,
    /// Xspress3 MCA spectrum settings
    pub xspress3: SpectrumProducerConfig,
    /// Beam-stop detector settings
    pub beam_stop: BeamStopConfig,
}

/// Filestore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilestoreConfig {
    /// Filestore root; detectors write below `<root>/tmp`
    pub root: PathBuf,
    /// Path semantics recorded in every resource
    pub path_semantics: PathSemantics,
}

/// Beam-stop detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamStopConfig {
    /// Intensity drop across the beam-stop edge
    pub max_intensity: f64,
}

/// `<cwd>/fstore`
pub fn default_filestore_root() -> PathBuf {
    std::env::current_dir().unwrap_or_default().join("fstore")
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: None,
            filestore: FilestoreConfig::default(),
            marccd: ImageProducerConfig::default(),
            xspress3: SpectrumProducerConfig::default(),
            beam_stop: BeamStopConfig::default(),
        }
    }
}

impl Default for FilestoreConfig {
    fn default() -> Self {
        Self {
            root: default_filestore_root(),
            path_semantics: PathSemantics::default(),
        }
    }
}

impl Default for BeamStopConfig {
    fn default() -> Self {
        Self {
            max_intensity: DEFAULT_MAX_INTENSITY,
        }
    }
}

impl FilestoreConfig {
    /// Detector filestore layout for this configuration.
    pub fn layout(&self) -> FilestoreLayout {
        FilestoreLayout::new(&self.root).with_path_semantics(self.path_semantics)
    }
}

impl SimConfig {
    /// Load configuration from `ssrl_sim.toml` and environment variables
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// The layered provider stack, for callers that merge further overrides.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(SimConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> SimResult<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(SimError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        let (rows, cols) = self.marccd.shape;
        if rows == 0 || cols == 0 {
            return Err(SimError::Configuration(format!(
                "Invalid marccd.shape ({rows}, {cols}). Both dimensions must be non-zero"
            )));
        }

        let (start, stop, samples) = self.marccd.q_range;
        if samples == 0 || !(start < stop) {
            return Err(SimError::Configuration(format!(
                "Invalid marccd.q_range ({start}, {stop}, {samples}). \
                 Need start < stop and samples > 0"
            )));
        }

        if self.xspress3.channels == 0 {
            return Err(SimError::Configuration(
                "Invalid xspress3.channels 0. Must be at least 1".to_string(),
            ));
        }

        for (name, chance) in [
            ("marccd.peak_chance", self.marccd.peak_chance),
            ("xspress3.peak_chance", self.xspress3.peak_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(SimError::Configuration(format!(
                    "Invalid {name} {chance}. Must be within [0, 1]"
                )));
            }
        }

        if !self.beam_stop.max_intensity.is_finite() {
            return Err(SimError::Configuration(format!(
                "Invalid beam_stop.max_intensity {}",
                self.beam_stop.max_intensity
            )));
        }

        Ok(())
    }
}
