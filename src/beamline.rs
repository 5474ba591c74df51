//! The simulated high-throughput (HiTp) diffraction beamline.
//!
//! Wires the simulated devices together the way the endstation is laid out:
//! a six-axis sample stage, a laser range finder looking at the plate, a
//! beam-stop diode on `stage_z`, a fast shutter, two ion chambers and two
//! array detectors writing into a shared filestore.
//!
//! # Example
//! ```no_run
//! use ssrl_sim::beamline::{Beamline, DetectorKind};
//! use ssrl_sim::config::SimConfig;
//!
//! let mut beamline = Beamline::from_config(&SimConfig::load()?);
//! let acquisition = beamline.acquire(DetectorKind::MarCCD)?;
//! println!("{} asset docs", acquisition.asset_docs.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::SimConfig;
use serde::Serialize;
use ssrl_core::capabilities::{AssetCollector, Readable, TriggerStatus, Triggerable};
use ssrl_core::document::AssetDoc;
use ssrl_core::error::SimResult;
use ssrl_core::reading::ReadRecord;
use ssrl_driver_sim::producers::{image_producer, spectrum_producer};
use ssrl_driver_sim::{
    FilestoreLayout, Hdf5Persistence, SimRng, SynAxis, SynBeamStopDetector, SynHdf5Detector,
    SynLaserRangeFinder, SynTiffDetector, TiffPersistence,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// The six motorised axes of the HiTp sample stage.
#[derive(Debug, Clone)]
pub struct HiTpStage {
    /// Sample stage x
    pub stage_x: SynAxis,
    /// Sample stage y
    pub stage_y: SynAxis,
    /// Sample stage height
    pub stage_z: SynAxis,
    /// Plate alignment axis x
    pub plate_x: SynAxis,
    /// Plate alignment axis y
    pub plate_y: SynAxis,
    /// Incidence angle
    pub theta: SynAxis,
}

impl HiTpStage {
    /// Stage with every axis at 0.
    pub fn new() -> Self {
        Self {
            stage_x: SynAxis::new("stage_x"),
            stage_y: SynAxis::new("stage_y"),
            stage_z: SynAxis::new("stage_z"),
            plate_x: SynAxis::new("plate_x"),
            plate_y: SynAxis::new("plate_y"),
            theta: SynAxis::new("theta"),
        }
    }

    /// All axes in stage order.
    pub fn axes(&self) -> [&SynAxis; 6] {
        [
            &self.stage_x,
            &self.stage_y,
            &self.stage_z,
            &self.plate_x,
            &self.plate_y,
            &self.theta,
        ]
    }
}

impl Default for HiTpStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Which array detector to acquire from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    /// Area detector, TIFF per frame
    MarCCD,
    /// MCA detector, HDF5 per spectrum
    Xspress3,
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "marccd" => Ok(Self::MarCCD),
            "xspress3" => Ok(Self::Xspress3),
            _ => Err(format!(
                "Unknown detector '{}'. Must be one of: marccd, xspress3",
                s
            )),
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarCCD => write!(f, "MarCCD"),
            Self::Xspress3 => write!(f, "Xspress3"),
        }
    }
}

/// Result of one trigger-read-collect cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Acquisition {
    /// Detector point number after the trigger
    pub point_number: u64,
    /// Read record, value = datum id
    pub reading: ReadRecord,
    /// Resource/Datum documents drained after the trigger
    pub asset_docs: Vec<AssetDoc>,
}

/// Trigger `detector`, read it back and drain its asset documents.
pub fn acquire<D>(detector: &mut D) -> SimResult<Acquisition>
where
    D: Triggerable + Readable + AssetCollector,
{
    let TriggerStatus { point_number } = detector.trigger()?;
    let reading = detector.read()?;
    let asset_docs = detector.collect_asset_docs().collect();
    Ok(Acquisition {
        point_number,
        reading,
        asset_docs,
    })
}

/// Every simulated device of the endstation.
pub struct Beamline {
    /// Six-axis HiTp stage
    pub stage: HiTpStage,
    /// Fast shutter
    pub fast_shutter: SynAxis,
    /// Incident flux monitor
    pub i0: SynAxis,
    /// Transmitted flux monitor
    pub i1: SynAxis,
    /// Laser range finder over the stage and plate axes
    pub lrf: SynLaserRangeFinder,
    /// Beam-stop point detector over `stage_z`
    pub pt_det: SynBeamStopDetector,
    /// MarCCD area detector (TIFF)
    pub marccd: SynTiffDetector,
    /// Xspress3 MCA detector (HDF5)
    pub xspress3: SynHdf5Detector,
    filestore: FilestoreLayout,
}

impl Beamline {
    /// Build the beamline from configuration.
    ///
    /// All random models draw from one RNG seeded from `config.seed`.
    pub fn from_config(config: &SimConfig) -> Self {
        let rng = Arc::new(SimRng::new(config.seed));
        let filestore = config.filestore.layout();
        info!(root = %filestore.root().display(), "Filestore root");

        let stage = HiTpStage::new();
        let lrf = SynLaserRangeFinder::new(
            "lrf",
            stage.stage_x.clone(),
            stage.stage_y.clone(),
            stage.plate_x.clone(),
            stage.plate_y.clone(),
            &rng,
        );
        let pt_det = SynBeamStopDetector::new("ptDet", stage.stage_z.clone(), &rng)
            .with_max_intensity(config.beam_stop.max_intensity);

        let (rows, cols) = config.marccd.shape;
        let marccd = SynTiffDetector::new(
            "MarCCD",
            TiffPersistence,
            image_producer(config.marccd.clone(), Arc::clone(&rng)),
        )
        .with_filestore(filestore.clone())
        .with_shape_hint(vec![rows, cols]);

        let xspress3 = SynHdf5Detector::new(
            "Xspress3",
            Hdf5Persistence,
            spectrum_producer(config.xspress3.clone(), Arc::clone(&rng)),
        )
        .with_filestore(filestore.clone())
        .with_shape_hint(vec![config.xspress3.channels]);

        Self {
            stage,
            fast_shutter: SynAxis::new("FastShutter"),
            i0: SynAxis::with_position("I0", 1.0),
            i1: SynAxis::with_position("I1", 1.0),
            lrf,
            pt_det,
            marccd,
            xspress3,
            filestore,
        }
    }

    /// Filestore shared by both detectors.
    pub fn filestore(&self) -> &FilestoreLayout {
        &self.filestore
    }

    /// Devices recorded before and after every run.
    pub fn baseline(&self) -> Vec<&dyn Readable> {
        self.stage
            .axes()
            .into_iter()
            .map(|axis| axis as &dyn Readable)
            .collect()
    }

    /// Merged read records of the baseline devices.
    pub fn baseline_readings(&self) -> SimResult<ReadRecord> {
        let mut merged = ReadRecord::new();
        for device in self.baseline() {
            merged.extend(device.read()?);
        }
        Ok(merged)
    }

    /// Every device, in inventory order.
    pub fn devices(&self) -> Vec<&dyn Readable> {
        let mut devices = self.baseline();
        devices.extend([
            &self.fast_shutter as &dyn Readable,
            &self.i0,
            &self.i1,
            &self.lrf,
            &self.pt_det,
            &self.marccd,
            &self.xspress3,
        ]);
        devices
    }

    /// Run one acquisition on the selected detector.
    pub fn acquire(&mut self, kind: DetectorKind) -> SimResult<Acquisition> {
        match kind {
            DetectorKind::MarCCD => acquire(&mut self.marccd),
            DetectorKind::Xspress3 => acquire(&mut self.xspress3),
        }
    }
}
