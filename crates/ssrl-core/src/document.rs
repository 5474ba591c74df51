//! Asset document model for externally stored detector data.
//!
//! Array detectors do not inline their data. Each trigger writes the array to
//! a file and emits two records describing where it went:
//!
//! - **Resource**: a storage location (format spec, root, resource-relative
//!   path, format-specific parameters, path semantics)
//! - **Datum**: one value inside a resource, keyed by format-specific
//!   parameters (the point number) and carrying a unique `datum_id`
//!
//! # Document Flow
//!
//! ```text
//! trigger()
//!    │
//!    ├── Resource (1 per trigger)
//!    │       │
//!    │       └── Datum (1 per trigger, datum_id = "<resource uid>/<n>")
//!    │
//!    └── read() value := datum_id
//! ```
//!
//! Both records are queued in an [`AssetDocCache`] owned by the detector and
//! drained by whoever registers assets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new unique document ID
pub fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp in seconds since Unix epoch
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Format-specific parameters of a resource or datum.
pub type Kwargs = BTreeMap<String, serde_json::Value>;

/// How consumers should interpret the paths inside a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSemantics {
    /// Forward-slash paths
    Posix,
    /// Backslash paths with drive letters
    #[default]
    Windows,
}

/// Storage location of externally written detector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource ID
    pub uid: String,
    /// Format spec understood by the asset handler (e.g. "AD_TIFF")
    pub spec: String,
    /// Filestore root
    pub root: PathBuf,
    /// Path of the resource relative to `root`
    pub resource_path: PathBuf,
    /// Format-specific parameters (filename, template, ...)
    pub resource_kwargs: Kwargs,
    /// Path interpretation hint
    pub path_semantics: PathSemantics,
}

impl Resource {
    /// Absolute directory of this resource (`root / resource_path`).
    pub fn directory(&self) -> PathBuf {
        self.root.join(&self.resource_path)
    }

    /// Look up a string-valued resource kwarg.
    pub fn kwarg_str(&self, key: &str) -> Option<&str> {
        self.resource_kwargs.get(key).and_then(|v| v.as_str())
    }
}

/// One value stored inside a [`Resource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    /// UID of the owning resource
    pub resource: String,
    /// Format-specific parameters locating the value (the point number)
    pub datum_kwargs: Kwargs,
    /// Unique identifier substituted for the raw value in read records
    pub datum_id: String,
}

/// Issues datums for a single resource.
///
/// Datum IDs are `"<resource uid>/<n>"` with `n` counting from zero per
/// resource.
#[derive(Debug, Clone)]
pub struct DatumFactory {
    resource_uid: String,
    counter: u64,
}

impl DatumFactory {
    /// Create the next datum of this resource.
    pub fn datum(&mut self, datum_kwargs: Kwargs) -> Datum {
        let datum_id = format!("{}/{}", self.resource_uid, self.counter);
        self.counter += 1;
        Datum {
            resource: self.resource_uid.clone(),
            datum_kwargs,
            datum_id,
        }
    }
}

/// Build a fresh resource plus the factory that issues its datums.
pub fn resource_factory(
    spec: &str,
    root: &Path,
    resource_path: &Path,
    resource_kwargs: Kwargs,
    path_semantics: PathSemantics,
) -> (Resource, DatumFactory) {
    let resource = Resource {
        uid: new_uid(),
        spec: spec.to_string(),
        root: root.to_path_buf(),
        resource_path: resource_path.to_path_buf(),
        resource_kwargs,
        path_semantics,
    };
    let factory = DatumFactory {
        resource_uid: resource.uid.clone(),
        counter: 0,
    };
    (resource, factory)
}

/// A queued asset record, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "doc", rename_all = "snake_case")]
pub enum AssetDoc {
    /// Resource document
    Resource(Resource),
    /// Datum document
    Datum(Datum),
}

impl AssetDoc {
    /// `"resource"` or `"datum"`
    pub fn kind(&self) -> &'static str {
        match self {
            AssetDoc::Resource(_) => "resource",
            AssetDoc::Datum(_) => "datum",
        }
    }
}

/// One-shot iterator over drained asset documents.
pub type AssetDocDrain = std::vec::IntoIter<AssetDoc>;

/// Per-device queue of asset records awaiting collection.
///
/// Records come out in insertion order, each exactly once. Draining leaves
/// the cache empty.
#[derive(Debug, Default, Clone)]
pub struct AssetDocCache {
    docs: Vec<AssetDoc>,
}

impl AssetDocCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one document.
    pub fn push(&mut self, doc: AssetDoc) {
        self.docs.push(doc);
    }

    /// Take every queued record, emptying the cache.
    pub fn drain(&mut self) -> AssetDocDrain {
        std::mem::take(&mut self.docs).into_iter()
    }

    /// Number of pending documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
