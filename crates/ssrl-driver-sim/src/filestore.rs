//! Filestore layout and per-format persistence strategies.
//!
//! An array detector hands each captured array to a [`Persistence`]
//! strategy, which writes it below the detector's [`FilestoreLayout`] and
//! returns the Resource/Datum pair describing where it went.
//!
//! | Strategy | Resource spec | File per trigger |
//! |----------|---------------|------------------|
//! | [`TiffPersistence`] | `AD_TIFF` | `<uuid>_<point>.tiff` (64-bit float grayscale) |
//! | [`Hdf5Persistence`] | `XSP3` | `<uuid>.h5`, data at `/entry/instrument/detector/data` |

use ndarray::ArrayD;
use serde_json::json;
use ssrl_core::document::{new_uid, resource_factory, Datum, Kwargs, PathSemantics, Resource};
use ssrl_core::error::{SimError, SimResult};
use ssrl_storage::{Hdf5Writer, TiffWriter, DETECTOR_DATA_PATH, HDF5_ENABLED, TIFF_ENABLED};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resource path below the filestore root used by every simulated detector.
pub const RESOURCE_SUBDIR: &str = "tmp";

/// Resource spec of the image-tile format.
pub const TIFF_SPEC: &str = "AD_TIFF";

/// Filename template of the image-tile format, `(directory, filename, point)`.
pub const TIFF_TEMPLATE: &str = "%s%s_%d.tiff";

/// Resource spec of the MCA array format.
pub const HDF5_SPEC: &str = "XSP3";

// =============================================================================
// Layout
// =============================================================================

/// Where a detector writes its files.
#[derive(Debug, Clone, PartialEq)]
pub struct FilestoreLayout {
    root: PathBuf,
    resource_path: PathBuf,
    path_semantics: PathSemantics,
}

impl FilestoreLayout {
    /// Layout rooted at `root` with the `tmp` resource path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resource_path: PathBuf::from(RESOURCE_SUBDIR),
            path_semantics: PathSemantics::default(),
        }
    }

    /// Set the path semantics recorded in every Resource.
    pub fn with_path_semantics(mut self, path_semantics: PathSemantics) -> Self {
        self.path_semantics = path_semantics;
        self
    }

    /// Filestore root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resource path relative to the root.
    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    /// Path semantics of the filestore host.
    pub fn path_semantics(&self) -> PathSemantics {
        self.path_semantics
    }

    /// `root / resource_path`
    pub fn directory(&self) -> PathBuf {
        self.root.join(&self.resource_path)
    }

    /// Create the resource directory if it does not exist yet.
    pub fn ensure_directory(&self) -> SimResult<PathBuf> {
        let dir = self.directory();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Fresh resource under this layout plus its first datum.
    fn resource_with_datum(
        &self,
        spec: &str,
        resource_kwargs: Kwargs,
        point_number: u64,
    ) -> (Resource, Datum) {
        let (resource, mut datums) = resource_factory(
            spec,
            &self.root,
            &self.resource_path,
            resource_kwargs,
            self.path_semantics,
        );
        let mut datum_kwargs = Kwargs::new();
        datum_kwargs.insert("point_number".to_string(), json!(point_number));
        let datum = datums.datum(datum_kwargs);
        (resource, datum)
    }
}

// =============================================================================
// Strategy trait
// =============================================================================

/// Format-specific persistence of detector arrays.
pub trait Persistence: Send {
    /// Resource spec written into every Resource.
    fn spec(&self) -> &'static str;

    /// Write `value` for `point_number` under `layout`.
    ///
    /// The resource directory must already exist.
    fn serialize(
        &self,
        layout: &FilestoreLayout,
        value: &ArrayD<f64>,
        point_number: u64,
    ) -> SimResult<(Resource, Datum)>;

    /// Path of the file holding `datum`.
    fn resolve(&self, resource: &Resource, datum: &Datum) -> SimResult<PathBuf>;
}

fn storage_error(err: anyhow::Error) -> SimError {
    SimError::Storage(format!("{err:#}"))
}

fn missing_kwarg(resource: &Resource, key: &str) -> SimError {
    SimError::Storage(format!(
        "resource {} ({}) has no '{}' kwarg",
        resource.uid, resource.spec, key
    ))
}

fn point_number(datum: &Datum) -> SimResult<u64> {
    datum
        .datum_kwargs
        .get("point_number")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| SimError::Storage(format!("datum {} has no point_number", datum.datum_id)))
}

/// Expand a printf-style template with `%s`/`%d` placeholders, in order.
fn fill_template(template: &str, args: &[String]) -> SimResult<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut args = args.iter();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') | Some('d') => {
                let arg = args.next().ok_or_else(|| {
                    SimError::Storage(format!("template '{template}' has too many placeholders"))
                })?;
                out.push_str(arg);
            }
            Some('%') => out.push('%'),
            other => {
                return Err(SimError::Storage(format!(
                    "template '{template}' has unsupported placeholder %{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

// =============================================================================
// TIFF
// =============================================================================

/// One single-frame TIFF file per trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffPersistence;

impl Persistence for TiffPersistence {
    fn spec(&self) -> &'static str {
        TIFF_SPEC
    }

    fn serialize(
        &self,
        layout: &FilestoreLayout,
        value: &ArrayD<f64>,
        point_number: u64,
    ) -> SimResult<(Resource, Datum)> {
        if !TIFF_ENABLED {
            return Err(SimError::FeatureNotEnabled("storage_tiff".to_string()));
        }

        let filename = new_uid();
        let mut resource_kwargs = Kwargs::new();
        resource_kwargs.insert("template".to_string(), json!(TIFF_TEMPLATE));
        resource_kwargs.insert("filename".to_string(), json!(filename));

        let (resource, datum) =
            layout.resource_with_datum(TIFF_SPEC, resource_kwargs, point_number);
        let path = self.resolve(&resource, &datum)?;
        TiffWriter::write_array(value, &path).map_err(storage_error)?;

        debug!(path = ?path, datum_id = %datum.datum_id, "Persisted TIFF frame");
        Ok((resource, datum))
    }

    fn resolve(&self, resource: &Resource, datum: &Datum) -> SimResult<PathBuf> {
        let template = resource
            .kwarg_str("template")
            .ok_or_else(|| missing_kwarg(resource, "template"))?;
        let filename = resource
            .kwarg_str("filename")
            .ok_or_else(|| missing_kwarg(resource, "filename"))?;

        let mut directory = resource.directory().to_string_lossy().into_owned();
        if !directory.ends_with(std::path::MAIN_SEPARATOR) {
            directory.push(std::path::MAIN_SEPARATOR);
        }
        let args = [
            directory,
            filename.to_string(),
            point_number(datum)?.to_string(),
        ];
        Ok(PathBuf::from(fill_template(template, &args)?))
    }
}

// =============================================================================
// HDF5
// =============================================================================

/// One HDF5 container per trigger with the array at [`DETECTOR_DATA_PATH`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Persistence;

impl Persistence for Hdf5Persistence {
    fn spec(&self) -> &'static str {
        HDF5_SPEC
    }

    fn serialize(
        &self,
        layout: &FilestoreLayout,
        value: &ArrayD<f64>,
        point_number: u64,
    ) -> SimResult<(Resource, Datum)> {
        if !HDF5_ENABLED {
            return Err(SimError::FeatureNotEnabled("storage_hdf5".to_string()));
        }

        let mut resource_kwargs = Kwargs::new();
        resource_kwargs.insert("filename".to_string(), json!(format!("{}.h5", new_uid())));

        let (resource, datum) =
            layout.resource_with_datum(HDF5_SPEC, resource_kwargs, point_number);
        let path = self.resolve(&resource, &datum)?;
        Hdf5Writer::write_array(value, &path, DETECTOR_DATA_PATH).map_err(storage_error)?;

        debug!(path = ?path, datum_id = %datum.datum_id, "Persisted HDF5 array");
        Ok((resource, datum))
    }

    fn resolve(&self, resource: &Resource, _datum: &Datum) -> SimResult<PathBuf> {
        let filename = resource
            .kwarg_str("filename")
            .ok_or_else(|| missing_kwarg(resource, "filename"))?;
        Ok(resource.directory().join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fill_template() {
        let args = ["/data/tmp/".to_string(), "abc".to_string(), "3".to_string()];
        assert_eq!(
            fill_template(TIFF_TEMPLATE, &args).unwrap(),
            "/data/tmp/abc_3.tiff"
        );
        assert_eq!(fill_template("100%%", &[]).unwrap(), "100%");
        assert!(fill_template("%s_%s", &args[..1]).is_err());
        assert!(fill_template("%x", &args).is_err());
    }

    #[test]
    fn test_layout_directory() {
        let layout = FilestoreLayout::new("/fstore");
        assert_eq!(layout.directory(), PathBuf::from("/fstore/tmp"));
        assert_eq!(layout.resource_path(), Path::new("tmp"));
        assert_eq!(layout.path_semantics(), PathSemantics::Windows);

        let posix = layout.with_path_semantics(PathSemantics::Posix);
        assert_eq!(posix.path_semantics(), PathSemantics::Posix);
    }

    #[test]
    fn test_ensure_directory_creates_tmp() {
        let temp_dir = TempDir::new().unwrap();
        let layout = FilestoreLayout::new(temp_dir.path().join("fstore"));
        let dir = layout.ensure_directory().unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("fstore/tmp"));
        // idempotent
        layout.ensure_directory().unwrap();
    }

    #[test]
    fn test_hdf5_resolve_uses_filename() {
        let layout = FilestoreLayout::new("/fstore");
        let mut kwargs = Kwargs::new();
        kwargs.insert("filename".to_string(), json!("x.h5"));
        let (resource, datum) = layout.resource_with_datum(HDF5_SPEC, kwargs, 4);

        assert_eq!(datum.datum_id, format!("{}/0", resource.uid));
        assert_eq!(datum.datum_kwargs["point_number"], json!(4));
        assert_eq!(
            Hdf5Persistence.resolve(&resource, &datum).unwrap(),
            PathBuf::from("/fstore/tmp/x.h5")
        );
    }

    #[test]
    fn test_resolve_missing_kwarg() {
        let layout = FilestoreLayout::new("/fstore");
        let (resource, datum) = layout.resource_with_datum(TIFF_SPEC, Kwargs::new(), 1);
        assert!(matches!(
            TiffPersistence.resolve(&resource, &datum),
            Err(SimError::Storage(_))
        ));
    }

    #[cfg(feature = "storage_tiff")]
    #[test]
    fn test_tiff_serialize_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let layout = FilestoreLayout::new(temp_dir.path());
        layout.ensure_directory().unwrap();

        let value = ndarray::Array2::<f64>::ones((4, 4)).into_dyn();
        let (resource, datum) = TiffPersistence.serialize(&layout, &value, 2).unwrap();

        assert_eq!(resource.spec, TIFF_SPEC);
        assert_eq!(resource.root, temp_dir.path());
        assert_eq!(resource.kwarg_str("template"), Some(TIFF_TEMPLATE));
        assert_eq!(datum.resource, resource.uid);

        let filename = resource.kwarg_str("filename").unwrap();
        let expected = layout.directory().join(format!("{filename}_2.tiff"));
        assert_eq!(TiffPersistence.resolve(&resource, &datum).unwrap(), expected);
        assert!(expected.is_file());
    }

    #[cfg(feature = "storage_tiff")]
    #[test]
    fn test_tiff_frame_keeps_float_values() {
        let temp_dir = TempDir::new().unwrap();
        let layout = FilestoreLayout::new(temp_dir.path());
        layout.ensure_directory().unwrap();

        let values = vec![0.4, 1.49, 52.7, -3.0];
        let value = ndarray::Array2::from_shape_vec((2, 2), values.clone())
            .unwrap()
            .into_dyn();
        let (resource, datum) = TiffPersistence.serialize(&layout, &value, 1).unwrap();

        let path = TiffPersistence.resolve(&resource, &datum).unwrap();
        let (samples, dimensions) = TiffWriter::read_frame(&path).unwrap();
        assert_eq!(dimensions, (2, 2));
        assert_eq!(samples, values);
    }

    #[cfg(feature = "storage_tiff")]
    #[test]
    fn test_writer_failure_maps_to_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        // resource directory deliberately not created
        let layout = FilestoreLayout::new(temp_dir.path().join("absent"));

        let value = ndarray::Array2::<f64>::ones((2, 2)).into_dyn();
        let err = TiffPersistence.serialize(&layout, &value, 1).unwrap_err();
        match err {
            SimError::Storage(message) => assert!(message.contains("Failed to create")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[cfg(not(feature = "storage_hdf5"))]
    #[test]
    fn test_hdf5_serialize_without_feature() {
        let temp_dir = TempDir::new().unwrap();
        let layout = FilestoreLayout::new(temp_dir.path());
        let value = ndarray::Array1::<f64>::ones(8).into_dyn();
        let err = Hdf5Persistence.serialize(&layout, &value, 1).unwrap_err();
        assert!(matches!(err, SimError::FeatureNotEnabled(ref f) if f == "storage_hdf5"));
    }

    #[cfg(feature = "storage_hdf5")]
    #[test]
    fn test_hdf5_serialize_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let layout = FilestoreLayout::new(temp_dir.path());
        layout.ensure_directory().unwrap();

        let value = ndarray::Array1::<f64>::ones(8).into_dyn();
        let (resource, datum) = Hdf5Persistence.serialize(&layout, &value, 1).unwrap();
        assert_eq!(resource.spec, HDF5_SPEC);
        assert!(resource.kwarg_str("filename").unwrap().ends_with(".h5"));
        assert!(Hdf5Persistence.resolve(&resource, &datum).unwrap().is_file());
    }
}
