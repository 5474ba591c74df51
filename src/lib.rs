//! # SSRL Beamline Simulator
//!
//! This crate assembles the simulated devices from `ssrl-driver-sim` into the
//! HiTp diffraction endstation and provides the ambient pieces an application
//! needs around them. The `ssrl-sim` binary is a thin CLI over this library.
//!
//! ## Crate Structure
//!
//! - **`beamline`**: The `Beamline` struct holding every simulated device, the
//!   baseline registration point and the trigger-read-collect cycle.
//! - **`config`**: Layered configuration (defaults, TOML file, environment)
//!   loaded with figment. See `config::SimConfig`.
//! - **`telemetry`**: Structured logging setup on `tracing-subscriber`.
//!
//! The device traits, records and errors live in `ssrl-core`; the array
//! writers live in `ssrl-storage`.

pub mod beamline;
pub mod config;
pub mod telemetry;

pub use beamline::{acquire, Acquisition, Beamline, DetectorKind, HiTpStage};
pub use config::SimConfig;
