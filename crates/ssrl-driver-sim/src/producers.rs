//! Value functions feeding the simulated area and MCA detectors.

use crate::common::SimRng;
use crate::peaks::{linspace, make_random_peaks, PeakParams};
use crate::projection::generate_image;
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Area detector image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProducerConfig {
    /// Image `(rows, cols)`
    pub shape: (usize, usize),
    /// Per-sample peak probability
    pub peak_chance: f64,
    /// Multiplier applied to the peak profile
    pub scale: f64,
    /// Profile sampling `(start, stop, samples)`
    pub q_range: (f64, f64, usize),
}

impl Default for ImageProducerConfig {
    fn default() -> Self {
        Self {
            shape: (512, 512),
            peak_chance: 0.05,
            scale: 100.0,
            q_range: (1.0, 6.0, 301),
        }
    }
}

/// MCA spectrum settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumProducerConfig {
    /// Number of energy channels
    pub channels: usize,
    /// Per-sample peak probability
    pub peak_chance: f64,
}

impl Default for SpectrumProducerConfig {
    fn default() -> Self {
        Self {
            channels: 2000,
            peak_chance: 0.1,
        }
    }
}

/// One scaled random powder pattern projected to a 2-D image.
///
/// An unusable shape yields an empty image after a warning.
pub fn diffraction_image(config: &ImageProducerConfig, rng: &SimRng) -> ArrayD<f64> {
    let (start, stop, samples) = config.q_range;
    let x = linspace(start, stop, samples);
    let y: Vec<f64> = make_random_peaks(&x, &PeakParams::with_chance(config.peak_chance), rng)
        .into_iter()
        .map(|v| v * config.scale)
        .collect();

    match generate_image(&x, &y, config.shape) {
        Ok(image) => image.into_dyn(),
        Err(err) => {
            warn!(error = %err, "Cannot project diffraction image");
            ArrayD::zeros(IxDyn(&[0, 0]))
        }
    }
}

/// One random fluorescence spectrum over channels `1..=channels`.
pub fn mca_spectrum(config: &SpectrumProducerConfig, rng: &SimRng) -> ArrayD<f64> {
    let x = linspace(1.0, config.channels as f64, config.channels);
    let y = make_random_peaks(&x, &PeakParams::with_chance(config.peak_chance), rng);
    Array1::from(y).into_dyn()
}

/// Detector value function drawing images from `rng`.
pub fn image_producer(
    config: ImageProducerConfig,
    rng: Arc<SimRng>,
) -> impl FnMut() -> ArrayD<f64> + Send + 'static {
    move || diffraction_image(&config, &rng)
}

/// Detector value function drawing spectra from `rng`.
pub fn spectrum_producer(
    config: SpectrumProducerConfig,
    rng: Arc<SimRng>,
) -> impl FnMut() -> ArrayD<f64> + Send + 'static {
    move || mca_spectrum(&config, &rng)
}
