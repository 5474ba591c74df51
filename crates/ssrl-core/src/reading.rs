//! Read-back and schema records.
//!
//! Every simulated device reports its state as a [`ReadRecord`]: a map from
//! signal name to a `{value, timestamp}` pair. Its schema is reported as a
//! [`Describe`] map from signal name to [`DataKey`].
//!
//! Array detectors never put their raw array into a read record. Instead the
//! value is the datum identifier of the file the array was written to, and the
//! matching data key carries `external = "FILESTORE:"` so consumers resolve
//! the identifier through the asset documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::now_secs;

/// Marker placed in [`DataKey::external`] for filestore-backed signals.
pub const FILESTORE_MARKER: &str = "FILESTORE:";

/// Value carried by a single reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    /// Scalar number (motor positions, sensor voltages)
    Number(f64),
    /// Text value, used for datum identifiers of externally stored arrays
    Text(String),
}

impl ReadingValue {
    /// Numeric value, if this reading is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Number(v) => Some(*v),
            ReadingValue::Text(_) => None,
        }
    }

    /// Text value, if this reading is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ReadingValue::Number(_) => None,
            ReadingValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for ReadingValue {
    fn from(value: f64) -> Self {
        ReadingValue::Number(value)
    }
}

impl From<String> for ReadingValue {
    fn from(value: String) -> Self {
        ReadingValue::Text(value)
    }
}

/// A single `{value, timestamp}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Reported value
    pub value: ReadingValue,
    /// Seconds since the Unix epoch at which the value was produced
    pub timestamp: f64,
}

impl Reading {
    /// Create a reading stamped with the current time.
    pub fn now(value: impl Into<ReadingValue>) -> Self {
        Self {
            value: value.into(),
            timestamp: now_secs(),
        }
    }

    /// Create a reading with an explicit timestamp.
    pub fn at(value: impl Into<ReadingValue>, timestamp: f64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }
}

/// Scalar reading of a motor axis, as seen by the sensor models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    /// Axis name
    pub name: String,
    /// Position in axis units
    pub value: f64,
    /// Seconds since the Unix epoch of the last move
    pub timestamp: f64,
}

impl AxisReading {
    /// Convert into a single-entry read record.
    pub fn to_record(&self) -> ReadRecord {
        let mut record = ReadRecord::new();
        record.insert(
            self.name.clone(),
            Reading::at(self.value, self.timestamp),
        );
        record
    }
}

/// Signal name -> reading.
pub type ReadRecord = BTreeMap<String, Reading>;

/// Signal name -> schema.
pub type Describe = BTreeMap<String, DataKey>;

/// Schema for a single signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataKey {
    /// Data type: "number", "string", "array"
    pub dtype: String,
    /// Shape for arrays (empty for scalars)
    pub shape: Vec<usize>,
    /// Source identifier, `SIM:<device>` for simulated devices
    pub source: String,
    /// Physical units
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub units: String,
    /// External storage marker; `Some("FILESTORE:")` for filestore-backed data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
}

impl DataKey {
    /// Create a scalar number data key
    pub fn scalar(device: &str, units: &str) -> Self {
        Self {
            dtype: "number".to_string(),
            shape: vec![],
            source: format!("SIM:{device}"),
            units: units.to_string(),
            external: None,
        }
    }

    /// Create an array data key
    pub fn array(device: &str, shape: Vec<usize>) -> Self {
        Self {
            dtype: "array".to_string(),
            shape,
            source: format!("SIM:{device}"),
            units: String::new(),
            external: None,
        }
    }

    /// Mark this key as resolved through the filestore.
    pub fn external_filestore(mut self) -> Self {
        self.external = Some(FILESTORE_MARKER.to_string());
        self
    }

    /// Whether consumers must resolve values through asset documents.
    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }
}
