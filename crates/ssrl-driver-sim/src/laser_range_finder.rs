//! Simulated laser range finder (sample height sensor).
//!
//! The sensor looks down at a tilted sample plate. Its voltage depends on
//! where the stage has moved the plate relative to a randomly placed "true"
//! plate position, drops by one volt over the sample disc near the origin,
//! and saturates at a fault value once the stage leaves its travel range.

use crate::common::SimRng;
use crate::syn_axis::SynAxis;
use parking_lot::RwLock;
use ssrl_core::capabilities::Readable;
use ssrl_core::error::SimResult;
use ssrl_core::reading::{DataKey, Describe, ReadRecord, Reading};

/// Conversion from motor steps to sensor volts.
pub const STEPS_TO_VOLTS: f64 = 0.001454;

/// Reading reported when the stage is outside its travel range.
pub const OFF_STAGE_READING: f64 = 10.0;

/// Nominal reading with the plate level and no sample under the beam.
pub const BASE_READING: f64 = 4.0;

/// Radius of the sample disc around the stage origin.
pub const SAMPLE_RADIUS: f64 = 5.0;

/// Voltage offset while the sensor is over the sample.
pub const SAMPLE_OFFSET: f64 = -1.0;

// =============================================================================
// Geometry
// =============================================================================

/// Travel range of the sample stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageBounds {
    /// Lower stage x limit
    pub x_min: f64,
    /// Upper stage x limit
    pub x_max: f64,
    /// Lower stage y limit
    pub y_min: f64,
    /// Upper stage y limit
    pub y_max: f64,
}

impl Default for StageBounds {
    fn default() -> Self {
        Self {
            x_min: -30.0,
            x_max: 30.0,
            y_min: -60.0,
            y_max: 60.0,
        }
    }
}

impl StageBounds {
    /// Travel along x.
    pub fn x_range(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Travel along y.
    pub fn y_range(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Whether `(x, y)` lies on the stage, limits included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Stage bounds plus the hidden true plate offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateGeometry {
    /// Stage travel limits
    pub bounds: StageBounds,
    /// Hidden plate offset along x
    pub true_plate_x: f64,
    /// Hidden plate offset along y
    pub true_plate_y: f64,
}

impl PlateGeometry {
    /// Geometry with the given plate offsets and default bounds.
    pub fn new(true_plate_x: f64, true_plate_y: f64) -> Self {
        Self {
            bounds: StageBounds::default(),
            true_plate_x,
            true_plate_y,
        }
    }

    /// Random whole-step plate offsets: |x| in [200, 500), |y| in [20, 500),
    /// each with a random sign.
    pub fn random(rng: &SimRng) -> Self {
        let x = rng.gen_range(200.0..500.0_f64).trunc() * rng.sign();
        let y = rng.gen_range(20.0..500.0_f64).trunc() * rng.sign();
        Self::new(x, y)
    }

    /// Replace the stage bounds.
    pub fn with_bounds(mut self, bounds: StageBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sensor voltage for the given stage and plate motor positions.
    pub fn height(&self, stage_x: f64, stage_y: f64, plate_x: f64, plate_y: f64) -> f64 {
        if !self.bounds.contains(stage_x, stage_y) {
            return OFF_STAGE_READING;
        }

        let x_tilt = plate_x - self.true_plate_x;
        let y_tilt = plate_y - self.true_plate_y;
        let x_disp = x_tilt / self.bounds.x_range() * stage_x - x_tilt / 2.0;
        let y_disp = y_tilt / self.bounds.y_range() * stage_y - y_tilt / 2.0;

        let on_sample = stage_x.hypot(stage_y) <= SAMPLE_RADIUS;
        let offset = if on_sample { SAMPLE_OFFSET } else { 0.0 };

        BASE_READING + offset - (x_disp + y_disp) * STEPS_TO_VOLTS / 2.0
    }
}

// =============================================================================
// Device
// =============================================================================

/// Laser range finder reading four stage axes.
#[derive(Debug)]
pub struct SynLaserRangeFinder {
    name: String,
    stage_x: SynAxis,
    stage_y: SynAxis,
    plate_x: SynAxis,
    plate_y: SynAxis,
    geometry: PlateGeometry,
    last_value: RwLock<Option<f64>>,
}

impl SynLaserRangeFinder {
    /// Sensor over the given axes with randomly placed true plate offsets.
    pub fn new(
        name: &str,
        stage_x: SynAxis,
        stage_y: SynAxis,
        plate_x: SynAxis,
        plate_y: SynAxis,
        rng: &SimRng,
    ) -> Self {
        Self {
            name: name.to_string(),
            stage_x,
            stage_y,
            plate_x,
            plate_y,
            geometry: PlateGeometry::random(rng),
            last_value: RwLock::new(None),
        }
    }

    /// Replace the plate geometry.
    pub fn with_geometry(mut self, geometry: PlateGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Hidden plate geometry.
    pub fn geometry(&self) -> &PlateGeometry {
        &self.geometry
    }

    /// Evaluate the sensor at the current axis positions and cache the result.
    pub fn get(&self) -> f64 {
        let value = self.geometry.height(
            self.stage_x.value(),
            self.stage_y.value(),
            self.plate_x.value(),
            self.plate_y.value(),
        );
        *self.last_value.write() = Some(value);
        value
    }

    /// Value from the most recent evaluation, if any.
    pub fn last_value(&self) -> Option<f64> {
        *self.last_value.read()
    }
}

impl Readable for SynLaserRangeFinder {
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
        describe.insert(self.name.clone(), DataKey::scalar(&self.name, "V"));
        Ok(describe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssrl_core::capabilities::Movable;

    fn sensor(geometry: PlateGeometry) -> (SynLaserRangeFinder, [SynAxis; 4]) {
        let axes = [
            SynAxis::new("stage_x"),
            SynAxis::new("stage_y"),
            SynAxis::new("plate_x"),
            SynAxis::new("plate_y"),
        ];
        let lrf = SynLaserRangeFinder::new(
            "lrf",
            axes[0].clone(),
            axes[1].clone(),
            axes[2].clone(),
            axes[3].clone(),
            &SimRng::seeded(0),
        )
        .with_geometry(geometry);
        (lrf, axes)
    }

    #[test]
    fn test_level_plate_reads_base_values() {
        let geometry = PlateGeometry::new(0.0, 0.0);
        assert_eq!(geometry.height(20.0, 20.0, 0.0, 0.0), BASE_READING);
        assert_eq!(geometry.height(0.0, 0.0, 0.0, 0.0), BASE_READING + SAMPLE_OFFSET);
        // boundary of the sample disc counts as on-sample
        assert_eq!(geometry.height(3.0, 4.0, 0.0, 0.0), 3.0);
    }

    #[test]
    fn test_tilted_plate_formula() {
        let geometry = PlateGeometry::new(300.0, -100.0);
        let (sx, sy, px, py) = (10.0, -20.0, 0.0, 0.0);

        let mx = (px - 300.0) / 60.0;
        let my = (py + 100.0) / 120.0;
        let x_disp = mx * sx - (px - 300.0) / 2.0;
        let y_disp = my * sy - (py + 100.0) / 2.0;
        let expected = 4.0 - (x_disp + y_disp) * STEPS_TO_VOLTS / 2.0;

        assert!((geometry.height(sx, sy, px, py) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_off_stage_returns_fault_value() {
        let geometry = PlateGeometry::new(-250.0, 75.0);
        for (x, y) in [(30.5, 0.0), (-31.0, 0.0), (0.0, 60.01), (0.0, -100.0), (1e6, 1e6)] {
            for plate in [-500.0, 0.0, 123.0] {
                assert_eq!(geometry.height(x, y, plate, -plate), OFF_STAGE_READING);
            }
        }
        // limits themselves are on-stage
        assert_ne!(geometry.height(30.0, 60.0, 0.0, 0.0), OFF_STAGE_READING);
    }

    #[test]
    fn test_random_offsets_ranges() {
        let rng = SimRng::seeded(11);
        for _ in 0..200 {
            let g = PlateGeometry::random(&rng);
            assert!((200.0..500.0).contains(&g.true_plate_x.abs()));
            assert!((20.0..500.0).contains(&g.true_plate_y.abs()));
            assert_eq!(g.true_plate_x.fract(), 0.0);
            assert_eq!(g.true_plate_y.fract(), 0.0);
        }
    }

    #[test]
    fn test_device_follows_axes_and_caches() {
        let (lrf, axes) = sensor(PlateGeometry::new(0.0, 0.0));
        assert_eq!(lrf.last_value(), None);

        axes[0].move_abs(10.0).unwrap();
        assert_eq!(lrf.get(), BASE_READING);
        assert_eq!(lrf.last_value(), Some(BASE_READING));

        axes[0].move_abs(45.0).unwrap();
        let record = lrf.read().unwrap();
        assert_eq!(record["lrf"].value.as_f64(), Some(OFF_STAGE_READING));
        assert_eq!(lrf.last_value(), Some(OFF_STAGE_READING));
    }

    #[test]
    fn test_describe_units() {
        let (lrf, _axes) = sensor(PlateGeometry::new(0.0, 0.0));
        let describe = lrf.describe().unwrap();
        assert_eq!(describe["lrf"].units, "V");
        assert_eq!(describe["lrf"].dtype, "number");
    }
}
