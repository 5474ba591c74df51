//! Custom error types for the simulator.
//!
//! This module defines the primary error type, `SimError`, shared by every
//! simulated device. Using the `thiserror` crate, it provides a consistent way
//! to surface the handful of failure modes a synthetic device can hit:
//!
//! - **`NotTriggered`**: a detector was read before it produced any value.
//!   This is a precondition violation by the caller and is never retried.
//! - **`FilestoreUnset`**: an externally-backed detector was triggered without
//!   a filestore root to write into.
//! - **`Io`**: wraps `std::io::Error` from directory creation or file writes.
//! - **`Storage`**: a file writer failed while encoding an array.
//! - **`FeatureNotEnabled`**: a storage format was requested that was not
//!   compiled in (for example HDF5 without `storage_hdf5`).
//! - **`Configuration`** / **`InvalidShape`**: semantic validation failures.
//!
//! Out-of-range motor positions are *not* errors: sensor models return a
//! defined sentinel reading instead.

use thiserror::Error;

/// Convenience alias for results using the simulator error type.
pub type SimResult<T> = std::result::Result<T, SimError>;

/// Primary error type for simulated devices.
#[derive(Error, Debug)]
pub enum SimError {
    /// `read()` was called on a detector that has never been triggered.
    #[error("Device '{device}' read before being triggered")]
    NotTriggered {
        /// Name of the offending device
        device: String,
    },

    /// An externally-backed detector has no filestore root configured.
    #[error("Device '{device}' has no filestore root configured")]
    FilestoreUnset {
        /// Name of the offending device
        device: String,
    },

    /// Standard I/O operation failed (directory creation, file creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding an array into its on-disk format failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The requested functionality was not compiled in.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),

    /// Configuration values parsed but are semantically invalid.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// An array or grid shape cannot be used for the requested operation.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

impl SimError {
    /// Build a `NotTriggered` error for the named device.
    pub fn not_triggered(device: impl Into<String>) -> Self {
        Self::NotTriggered {
            device: device.into(),
        }
    }

    /// Build a `FilestoreUnset` error for the named device.
    pub fn filestore_unset(device: impl Into<String>) -> Self {
        Self::FilestoreUnset {
            device: device.into(),
        }
    }
}
