//! Random diffraction peak synthesizer.
//!
//! Produces 1-D powder-diffraction-like intensity profiles: sparse, narrow
//! Gaussian peaks whose height falls off as `center^-1/2`, sitting on a wide
//! diffuse background centred at zero.
//!
//! # Example
//!
//! ```rust
//! use ssrl_driver_sim::peaks::{linspace, make_random_peaks, PeakParams};
//! use ssrl_driver_sim::SimRng;
//!
//! let x = linspace(1.0, 6.0, 301);
//! let rng = SimRng::seeded(1);
//! let y = make_random_peaks(&x, &PeakParams::with_chance(0.05), &rng);
//! assert_eq!(y.len(), x.len());
//! ```

use crate::common::SimRng;
use tracing::warn;

/// Standard deviation of every sharp peak.
pub const PEAK_WIDTH: f64 = 0.05;

/// Standard deviation of the diffuse background.
pub const DIFFUSE_WIDTH: f64 = 3.0;

/// Amplitude of the diffuse background.
pub const DIFFUSE_AMPLITUDE: f64 = 0.5;

/// Default per-sample peak probability.
pub const DEFAULT_PEAK_CHANCE: f64 = 0.1;

/// Lower percentile used when no explicit window start is given.
const WINDOW_LOW_PERCENTILE: f64 = 10.0;

/// Upper percentile used when no explicit window end is given.
const WINDOW_HIGH_PERCENTILE: f64 = 90.0;

/// Gaussian bump `amplitude * exp(-((x - center) / sigma)^2 / 2)`.
pub fn gaussian(x: f64, center: f64, sigma: f64, amplitude: f64) -> f64 {
    let z = (x - center) / sigma;
    amplitude * (-0.5 * z * z).exp()
}

/// `n` evenly spaced samples over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    ndarray::Array1::linspace(start, stop, n).to_vec()
}

/// Percentile `q` (0-100) of `values` using linear interpolation between
/// closest ranks. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Parameters for [`make_random_peaks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    /// Smallest allowed peak centre (default: 10th percentile of x)
    pub xmin: Option<f64>,
    /// Largest allowed peak centre (default: 90th percentile of x)
    pub xmax: Option<f64>,
    /// Probability that any one sample becomes a peak centre
    pub peak_chance: f64,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            xmin: None,
            xmax: None,
            peak_chance: DEFAULT_PEAK_CHANCE,
        }
    }
}

impl PeakParams {
    /// Default window with the given peak probability.
    pub fn with_chance(peak_chance: f64) -> Self {
        Self {
            peak_chance,
            ..Self::default()
        }
    }

    /// Restrict peak centres to `[xmin, xmax]`.
    pub fn window(mut self, xmin: f64, xmax: f64) -> Self {
        self.xmin = Some(xmin);
        self.xmax = Some(xmax);
        self
    }

    /// Resolve the window against the sample positions.
    fn resolve_window(&self, x: &[f64]) -> (f64, f64) {
        let xmin = self
            .xmin
            .or_else(|| percentile(x, WINDOW_LOW_PERCENTILE))
            .unwrap_or(f64::NEG_INFINITY);
        let xmax = self
            .xmax
            .or_else(|| percentile(x, WINDOW_HIGH_PERCENTILE))
            .unwrap_or(f64::INFINITY);
        (xmin, xmax)
    }
}

/// Select peak centres from `x` given one uniform draw per sample.
///
/// A sample is a centre when its draw is below `peak_chance` and it lies
/// inside the resolved window.
pub fn pick_peak_centers(x: &[f64], params: &PeakParams, draws: &[f64]) -> Vec<f64> {
    let (xmin, xmax) = params.resolve_window(x);
    x.iter()
        .zip(draws)
        .filter(|&(&xi, &draw)| draw < params.peak_chance && xi >= xmin && xi <= xmax)
        .map(|(&xi, _)| xi)
        .collect()
}

/// Diffuse background alone: one wide Gaussian centred at zero.
pub fn diffuse_background(x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| gaussian(xi, 0.0, DIFFUSE_WIDTH, DIFFUSE_AMPLITUDE))
        .collect()
}

/// Synthesize a random peak profile sampled at `x`.
///
/// Every centre contributes a Gaussian of width [`PEAK_WIDTH`] and amplitude
/// `(1 / center)^0.5`. Centres at or below zero have no defined amplitude
/// and are skipped with a warning. The diffuse background is always added.
pub fn make_random_peaks(x: &[f64], params: &PeakParams, rng: &SimRng) -> Vec<f64> {
    let draws = rng.uniform_samples(x.len());
    let centers = pick_peak_centers(x, params, &draws);

    let mut y = vec![0.0; x.len()];
    for center in centers {
        if center <= 0.0 {
            warn!(center, "Skipping peak centre with undefined amplitude");
            continue;
        }
        let amplitude = (1.0 / center).sqrt();
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi += gaussian(xi, center, PEAK_WIDTH, amplitude);
        }
    }

    for (yi, background) in y.iter_mut().zip(diffuse_background(x)) {
        *yi += background;
    }
    y
}
