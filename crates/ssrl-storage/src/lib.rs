//! `ssrl-storage`
//!
//! File writers used by the simulated array detectors:
//!
//! - [`TiffWriter`]: one single-frame 64-bit float TIFF per array (`storage_tiff`, default)
//! - [`Hdf5Writer`]: one HDF5 container per array at a nested dataset path
//!   (`storage_hdf5`, needs native libhdf5)

pub mod hdf5_writer;
pub mod tiff_writer;

pub use hdf5_writer::{Hdf5Writer, DETECTOR_DATA_PATH, HDF5_ENABLED};
pub use tiff_writer::{TiffWriter, TIFF_ENABLED};
