//! Synthetic array detector with externally stored data.
//!
//! Each trigger produces a fresh array from a value function, writes it to
//! the filestore through a [`Persistence`] strategy and queues the matching
//! Resource and Datum documents. Reads return the datum identifier rather
//! than the array itself.
//!
//! # State machine
//!
//! ```text
//!            trigger()            trigger()
//!   Idle ───────────────► Triggered ───────┐
//!                             ▲            │
//!                             └────────────┘
//! ```
//!
//! `read()` in `Idle` fails with [`SimError::NotTriggered`].
//!
//! # Example
//!
//! ```rust
//! use ndarray::{ArrayD, IxDyn};
//! use ssrl_core::{AssetCollector, Readable, Triggerable};
//! use ssrl_driver_sim::{FilestoreLayout, SynTiffDetector, TiffPersistence};
//!
//! let root = tempfile::tempdir().unwrap();
//! let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, || {
//!     ArrayD::ones(IxDyn(&[4, 4]))
//! })
//! .with_filestore(FilestoreLayout::new(root.path()));
//!
//! det.trigger().unwrap();
//! let record = det.read().unwrap();
//! assert!(record["MarCCD"].value.as_str().is_some());
//! assert_eq!(det.collect_asset_docs().count(), 2);
//! ```

use crate::filestore::{FilestoreLayout, Hdf5Persistence, Persistence, TiffPersistence};
use ndarray::ArrayD;
use ssrl_core::capabilities::{AssetCollector, Readable, TriggerStatus, Triggerable};
use ssrl_core::document::{AssetDoc, AssetDocCache, AssetDocDrain};
use ssrl_core::error::{SimError, SimResult};
use ssrl_core::reading::{DataKey, Describe, ReadRecord, Reading};
use tracing::info;

/// Produces the next detector array.
pub type ValueFn = Box<dyn FnMut() -> ArrayD<f64> + Send>;

/// Detector writing single-frame TIFF files (`AD_TIFF`).
pub type SynTiffDetector = SynArrayDetector<TiffPersistence>;

/// Detector writing HDF5 containers (`XSP3`).
pub type SynHdf5Detector = SynArrayDetector<Hdf5Persistence>;

#[derive(Debug)]
enum DetectorState {
    Idle,
    Triggered {
        value: ArrayD<f64>,
        record: ReadRecord,
    },
}

/// Array detector parameterised by its persistence strategy.
pub struct SynArrayDetector<P: Persistence> {
    name: String,
    persistence: P,
    value_fn: ValueFn,
    filestore: Option<FilestoreLayout>,
    shape_hint: Vec<usize>,
    point_number: u64,
    asset_docs: AssetDocCache,
    state: DetectorState,
}

impl<P: Persistence> SynArrayDetector<P> {
    /// Create an idle detector without a filestore.
    pub fn new<F>(name: &str, persistence: P, value_fn: F) -> Self
    where
        F: FnMut() -> ArrayD<f64> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            persistence,
            value_fn: Box::new(value_fn),
            filestore: None,
            shape_hint: Vec::new(),
            point_number: 0,
            asset_docs: AssetDocCache::new(),
            state: DetectorState::Idle,
        }
    }

    /// Set where triggered arrays are written.
    pub fn with_filestore(mut self, layout: FilestoreLayout) -> Self {
        self.filestore = Some(layout);
        self
    }

    /// Shape reported by `describe()` before the first trigger.
    pub fn with_shape_hint(mut self, shape: Vec<usize>) -> Self {
        self.shape_hint = shape;
        self
    }

    /// Replace or clear the filestore layout.
    pub fn set_filestore(&mut self, layout: Option<FilestoreLayout>) {
        self.filestore = layout;
    }

    /// Current filestore layout, if any.
    pub fn filestore(&self) -> Option<&FilestoreLayout> {
        self.filestore.as_ref()
    }

    /// Persistence strategy.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Number of completed value computations.
    pub fn point_number(&self) -> u64 {
        self.point_number
    }

    /// Whether a trigger has completed.
    pub fn is_triggered(&self) -> bool {
        matches!(self.state, DetectorState::Triggered { .. })
    }

    /// Asset documents waiting to be collected.
    pub fn pending_asset_docs(&self) -> usize {
        self.asset_docs.len()
    }

    /// Raw array from the last successful trigger.
    pub fn get(&self) -> SimResult<&ArrayD<f64>> {
        match &self.state {
            DetectorState::Triggered { value, .. } => Ok(value),
            DetectorState::Idle => Err(SimError::not_triggered(&self.name)),
        }
    }
}

impl<P: Persistence> Triggerable for SynArrayDetector<P> {
    /// Compute, persist and register one array.
    ///
    /// A failure after the value computation leaves the incremented point
    /// number in place and keeps the previous read record.
    fn trigger(&mut self) -> SimResult<TriggerStatus> {
        let layout = self
            .filestore
            .as_ref()
            .ok_or_else(|| SimError::filestore_unset(&self.name))?;
        layout.ensure_directory()?;

        let value = (self.value_fn)();
        self.point_number += 1;

        let (resource, datum) = self
            .persistence
            .serialize(layout, &value, self.point_number)?;
        let datum_id = datum.datum_id.clone();
        self.asset_docs.push(AssetDoc::Resource(resource));
        self.asset_docs.push(AssetDoc::Datum(datum));

        let mut record = ReadRecord::new();
        record.insert(self.name.clone(), Reading::now(datum_id.clone()));
        self.state = DetectorState::Triggered { value, record };

        info!(
            device = %self.name,
            spec = self.persistence.spec(),
            point_number = self.point_number,
            datum_id = %datum_id,
            "Detector triggered"
        );
        Ok(TriggerStatus {
            point_number: self.point_number,
        })
    }
}

impl<P: Persistence> Readable for SynArrayDetector<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> SimResult<ReadRecord> {
        match &self.state {
            DetectorState::Triggered { record, .. } => Ok(record.clone()),
            DetectorState::Idle => Err(SimError::not_triggered(&self.name)),
        }
    }

    fn describe(&self) -> SimResult<Describe> {
        let shape = match &self.state {
            DetectorState::Triggered { value, .. } => value.shape().to_vec(),
            DetectorState::Idle => self.shape_hint.clone(),
        };
        let mut describe = Describe::new();
        describe.insert(
            self.name.clone(),
            DataKey::array(&self.name, shape).external_filestore(),
        );
        Ok(describe)
    }
}

impl<P: Persistence> AssetCollector for SynArrayDetector<P> {
    fn collect_asset_docs(&mut self) -> AssetDocDrain {
        self.asset_docs.drain()
    }
}

impl<P: Persistence + std::fmt::Debug> std::fmt::Debug for SynArrayDetector<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynArrayDetector")
            .field("name", &self.name)
            .field("persistence", &self.persistence)
            .field("filestore", &self.filestore)
            .field("point_number", &self.point_number)
            .field("pending_asset_docs", &self.asset_docs.len())
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
