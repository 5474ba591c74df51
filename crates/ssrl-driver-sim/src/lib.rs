//! Simulated beamline devices for the SSRL simulator.
//!
//! This crate provides the numeric models and simulated devices used to
//! exercise data collection without a beamline.
//!
//! # Available Devices
//!
//! - [`SynAxis`] - Instant-move motor axis with shared position
//! - [`SynLaserRangeFinder`] - Plate height sensor over four stage axes
//! - [`SynBeamStopDetector`] - Logistic intensity edge over `stage_z`
//! - [`SynArrayDetector`] - Externally stored array detector, generic over
//!   [`Persistence`] ([`SynTiffDetector`], [`SynHdf5Detector`])
//!
//! # Synthesis
//!
//! - [`peaks`] - Random powder diffraction profiles
//! - [`projection`] - Radial projection of a profile onto an image
//! - [`producers`] - Detector value functions built from the two above
//! - [`wafer`] - Sample grid positions
//!
//! All randomness goes through [`SimRng`], so one seed reproduces a run.

pub mod array_detector;
pub mod beam_stop;
pub mod common;
pub mod filestore;
pub mod laser_range_finder;
pub mod peaks;
pub mod producers;
pub mod projection;
mod syn_axis;
pub mod wafer;

pub use common::SimRng;

pub use array_detector::{SynArrayDetector, SynHdf5Detector, SynTiffDetector, ValueFn};
pub use beam_stop::{beam_stop_intensity, SynBeamStopDetector};
pub use filestore::{FilestoreLayout, Hdf5Persistence, Persistence, TiffPersistence};
pub use laser_range_finder::{PlateGeometry, StageBounds, SynLaserRangeFinder};
pub use producers::{ImageProducerConfig, SpectrumProducerConfig};
pub use syn_axis::SynAxis;
pub use wafer::{wafer_locations, WaferShape};
