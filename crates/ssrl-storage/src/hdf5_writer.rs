//! HDF5 export for detector arrays.
//!
//! Writes one HDF5 container per array with the data stored at a nested
//! dataset path, NeXus style:
//!
//! ```text
//! /entry
//!   /instrument
//!     /detector
//!       data   (f64, shape of the array)
//! ```
//!
//! # Features
//!
//! Requires the `storage_hdf5` feature and a native HDF5 installation
//! (e.g. libhdf5-dev). Without it every write returns an error.

use anyhow::{anyhow, Result};
use ndarray::ArrayD;
use std::path::Path;

/// Whether HDF5 support was compiled in.
pub const HDF5_ENABLED: bool = cfg!(feature = "storage_hdf5");

/// Internal dataset path used by the MCA detector files.
pub const DETECTOR_DATA_PATH: &str = "/entry/instrument/detector/data";

/// HDF5 export for detector arrays.
pub struct Hdf5Writer;

impl Hdf5Writer {
    /// Write `array` to a new file at `path`, under `dataset_path`.
    ///
    /// Intermediate groups in `dataset_path` are created as needed. The file
    /// is truncated if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `dataset_path` has no dataset name component
    /// - File cannot be created
    /// - HDF5 group/dataset creation or write fails
    pub fn write_array<P: AsRef<Path>>(
        array: &ArrayD<f64>,
        path: P,
        dataset_path: &str,
    ) -> Result<()> {
        let (groups, dataset) = split_dataset_path(dataset_path)?;
        Self::write_nested(array, path.as_ref(), &groups, dataset)
    }

    #[cfg(feature = "storage_hdf5")]
    fn write_nested(
        array: &ArrayD<f64>,
        path: &Path,
        groups: &[&str],
        dataset: &str,
    ) -> Result<()> {
        use anyhow::Context;
        use hdf5::File;

        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

        let mut current: Option<hdf5::Group> = None;
        for name in groups {
            let parent: &hdf5::Group = current.as_ref().unwrap_or(&*file);
            let child = parent
                .create_group(name)
                .with_context(|| format!("Failed to create group '{}' in {:?}", name, path))?;
            current = Some(child);
        }
        let parent: &hdf5::Group = current.as_ref().unwrap_or(&*file);

        let flat: Vec<f64> = array.iter().copied().collect();
        parent
            .new_dataset::<f64>()
            .shape(array.shape().to_vec())
            .create(dataset)
            .with_context(|| format!("Failed to create dataset '{}' in {:?}", dataset, path))?
            .write_raw(flat.as_slice())?;

        tracing::debug!(
            path = ?path,
            dataset = dataset,
            shape = ?array.shape(),
            "Wrote HDF5 array"
        );

        Ok(())
    }

    #[cfg(not(feature = "storage_hdf5"))]
    fn write_nested(
        _array: &ArrayD<f64>,
        path: &Path,
        _groups: &[&str],
        _dataset: &str,
    ) -> Result<()> {
        Err(anyhow!(
            "Cannot write {:?}: built without the storage_hdf5 feature",
            path
        ))
    }
}

/// Split `/a/b/c/name` into (`[a, b, c]`, `name`).
fn split_dataset_path(dataset_path: &str) -> Result<(Vec<&str>, &str)> {
    let mut parts: Vec<&str> = dataset_path.split('/').filter(|p| !p.is_empty()).collect();
    let dataset = parts
        .pop()
        .ok_or_else(|| anyhow!("Dataset path '{}' has no dataset name", dataset_path))?;
    Ok((parts, dataset))
}
