//! Simulated beam-stop intensity detector.

use crate::common::SimRng;
use crate::syn_axis::SynAxis;
use ssrl_core::capabilities::Readable;
use ssrl_core::error::SimResult;
use ssrl_core::reading::{DataKey, Describe, ReadRecord, Reading};

/// Default maximum intensity.
pub const DEFAULT_MAX_INTENSITY: f64 = 5.0;

/// Steepness of the logistic edge.
const EDGE_STEEPNESS: f64 = 3.0;

/// `1 - max_intensity / (1 + exp(-3 (z - height)))`.
///
/// Close to 1 well below `height`, close to `1 - max_intensity` well above,
/// and strictly decreasing in `z` for a positive `max_intensity`.
pub fn beam_stop_intensity(z: f64, height: f64, max_intensity: f64) -> f64 {
    1.0 - max_intensity / (1.0 + (-EDGE_STEEPNESS * (z - height)).exp())
}

/// Intensity detector behind a beam stop at a hidden height on `stage_z`.
#[derive(Debug)]
pub struct SynBeamStopDetector {
    name: String,
    stage_z: SynAxis,
    height: f64,
    max_intensity: f64,
}

impl SynBeamStopDetector {
    /// Detector with a random beam-stop height in [-3, 3).
    pub fn new(name: &str, stage_z: SynAxis, rng: &SimRng) -> Self {
        Self {
            name: name.to_string(),
            stage_z,
            height: rng.gen_range(-3.0..3.0),
            max_intensity: DEFAULT_MAX_INTENSITY,
        }
    }

    /// Fix the beam-stop edge height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Set the intensity blocked above the edge.
    pub fn with_max_intensity(mut self, max_intensity: f64) -> Self {
        self.max_intensity = max_intensity;
        self
    }

    /// Beam-stop edge height on `stage_z`.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Intensity blocked above the edge.
    pub fn max_intensity(&self) -> f64 {
        self.max_intensity
    }

    /// Intensity at the current `stage_z` position.
    pub fn get(&self) -> f64 {
        beam_stop_intensity(self.stage_z.value(), self.height, self.max_intensity)
    }
}

impl Readable for SynBeamStopDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> SimResult<ReadRecord> {
        let mut record = ReadRecord::new();
        record.insert(self.name.clone(), Reading::now(self.get()));
        Ok(record)
    }

    fn describe(&self) -> SimResult<Describe> {
        let mut describe = Describe::new();
        describe.insert(self.name.clone(), DataKey::scalar(&self.name, "counts"));
        Ok(describe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssrl_core::capabilities::Movable;

    #[test]
    fn test_asymptotes() {
        let max = DEFAULT_MAX_INTENSITY;
        assert!((beam_stop_intensity(-50.0, 0.0, max) - 1.0).abs() < 1e-9);
        assert!((beam_stop_intensity(50.0, 0.0, max) - (1.0 - max)).abs() < 1e-9);
        // midpoint at the stop height
        assert!((beam_stop_intensity(1.5, 1.5, max) - (1.0 - max / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_decreasing() {
        let mut previous = f64::INFINITY;
        for step in -100..=100 {
            let z = step as f64 * 0.1;
            let value = beam_stop_intensity(z, 0.7, DEFAULT_MAX_INTENSITY);
            assert!(value < previous, "not decreasing at z={z}");
            previous = value;
        }
    }

    #[test]
    fn test_random_height_range() {
        let rng = SimRng::seeded(5);
        for _ in 0..100 {
            let det = SynBeamStopDetector::new("ptDet", SynAxis::new("stage_z"), &rng);
            assert!((-3.0..3.0).contains(&det.height()));
            assert_eq!(det.max_intensity(), DEFAULT_MAX_INTENSITY);
        }
    }

    #[test]
    fn test_device_reads_stage_z() {
        let z = SynAxis::new("stage_z");
        let det = SynBeamStopDetector::new("ptDet", z.clone(), &SimRng::seeded(1))
            .with_height(0.0)
            .with_max_intensity(3.0);

        z.move_abs(0.0).unwrap();
        assert!((det.get() - (-0.5)).abs() < 1e-12);

        z.move_abs(-20.0).unwrap();
        let record = det.read().unwrap();
        let value = record["ptDet"].value.as_f64().unwrap();
        assert!((value - 1.0).abs() < 1e-9);
    }
}
