//! `ssrl-core`
//!
//! Core trait definitions and types for the SSRL beamline simulator.
//!
//! Simulated devices (motors, scalar sensors, array detectors) implement the
//! small capability traits in [`capabilities`] and report state through the
//! record types in [`reading`]. Array detectors additionally emit the asset
//! documents in [`document`] so their data can be referenced by identifier
//! instead of inlined.

pub mod capabilities;
pub mod document;
pub mod error;
pub mod reading;

pub use capabilities::{AssetCollector, Movable, Readable, TriggerStatus, Triggerable};
pub use document::{
    new_uid, now_secs, resource_factory, AssetDoc, AssetDocCache, AssetDocDrain, Datum,
    DatumFactory, Kwargs, PathSemantics, Resource,
};
pub use error::{SimError, SimResult};
pub use reading::{
    AxisReading, DataKey, Describe, ReadRecord, Reading, ReadingValue, FILESTORE_MARKER,
};
