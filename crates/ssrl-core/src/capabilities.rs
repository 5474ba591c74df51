//! Device Capabilities
//!
//! Fine-grained capability traits that simulated devices implement. Instead
//! of one monolithic device trait, each device implements what it supports:
//!
//! - A motor axis implements: `Movable + Readable`
//! - A scalar sensor implements: `Readable`
//! - An array detector implements: `Triggerable + Readable + AssetCollector`
//!
//! # Design
//!
//! Each capability trait:
//! - Is synchronous; `trigger()` blocks until its file is on disk
//! - Uses [`SimResult`] for errors
//! - Focuses on ONE thing
//!
//! Shared handles (motor axes) use interior mutability and take `&self`.
//! Detectors own their point counter and asset cache and take `&mut self`
//! where state changes.
//!
//! # Example
//!
//! ```rust,ignore
//! fn acquire<D>(det: &mut D) -> SimResult<ReadRecord>
//! where
//!     D: Triggerable + Readable + AssetCollector,
//! {
//!     det.trigger()?;
//!     let record = det.read()?;
//!     for doc in det.collect_asset_docs() {
//!         register(doc);
//!     }
//!     Ok(record)
//! }
//! ```

use crate::document::AssetDocDrain;
use crate::error::SimResult;
use crate::reading::{Describe, ReadRecord};

/// Capability: read-back of current values.
pub trait Readable {
    /// Device name (also the key of its primary signal)
    fn name(&self) -> &str;

    /// Current `{name: {value, timestamp}}` record.
    fn read(&self) -> SimResult<ReadRecord>;

    /// Schema of the signals returned by [`Readable::read`].
    fn describe(&self) -> SimResult<Describe>;
}

/// Capability: motion.
///
/// Positions are in device-native units. Simulated moves complete
/// immediately.
pub trait Movable {
    /// Move to absolute position
    fn move_abs(&self, position: f64) -> SimResult<()>;

    /// Move relative to current position
    fn move_rel(&self, distance: f64) -> SimResult<()> {
        self.move_abs(self.position()? + distance)
    }

    /// Current position
    fn position(&self) -> SimResult<f64>;
}

/// Status returned by a completed trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerStatus {
    /// Point number assigned to this acquisition
    pub point_number: u64,
}

/// Capability: acquisition on demand.
pub trait Triggerable {
    /// Acquire a new value. Returns once all side effects have completed.
    fn trigger(&mut self) -> SimResult<TriggerStatus>;
}

/// Capability: hand over queued resource/datum records.
pub trait AssetCollector {
    /// Drain every queued asset record. The returned iterator is one-shot;
    /// calling again yields nothing until the next trigger queues more.
    fn collect_asset_docs(&mut self) -> AssetDocDrain;
}
