//! Common infrastructure for simulated devices.
//!
//! - **rng**: Seeded random number generator

pub mod rng;

pub use rng::SimRng;
