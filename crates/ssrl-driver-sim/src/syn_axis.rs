//! Simulated motor axis.

use parking_lot::RwLock;
use ssrl_core::capabilities::{Movable, Readable};
use ssrl_core::document::now_secs;
use ssrl_core::error::SimResult;
use ssrl_core::reading::{AxisReading, DataKey, Describe, ReadRecord};
use std::sync::Arc;

/// Named scalar axis that moves instantly.
///
/// Clones share the same position, so a sensor model holding a clone sees
/// every move made through any other handle.
#[derive(Debug, Clone)]
pub struct SynAxis {
    name: Arc<str>,
    state: Arc<RwLock<AxisReading>>,
}

impl SynAxis {
    /// Create an axis at position 0.
    pub fn new(name: &str) -> Self {
        Self::with_position(name, 0.0)
    }

    /// Create an axis at `position`.
    pub fn with_position(name: &str, position: f64) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(RwLock::new(AxisReading {
                name: name.to_string(),
                value: position,
                timestamp: now_secs(),
            })),
        }
    }

    /// Snapshot of the current reading.
    pub fn reading(&self) -> AxisReading {
        self.state.read().clone()
    }

    /// Current position without the `SimResult` wrapper.
    pub fn value(&self) -> f64 {
        self.state.read().value
    }

    /// Whether `other` is a handle to the same axis.
    pub fn shares_state_with(&self, other: &SynAxis) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Movable for SynAxis {
    fn move_abs(&self, position: f64) -> SimResult<()> {
        let mut state = self.state.write();
        state.value = position;
        state.timestamp = now_secs();
        tracing::trace!(axis = %self.name, position, "Axis moved");
        Ok(())
    }

    fn position(&self) -> SimResult<f64> {
        Ok(self.value())
    }
}

impl Readable for SynAxis {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> SimResult<ReadRecord> {
        Ok(self.reading().to_record())
    }

    fn describe(&self) -> SimResult<Describe> {
        let mut describe = Describe::new();
        describe.insert(self.name.to_string(), DataKey::scalar(&self.name, ""));
        Ok(describe)
    }
}
