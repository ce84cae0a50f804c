//! Field-level change records, the structural differ and the shared change log.

mod diff;
mod log;

pub use diff::{diff, diff_maps};
pub use log::ChangeLog;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// What happened to a single top-level field between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The field is new in the latest snapshot.
    Added,
    /// The field disappeared from the latest snapshot.
    Removed,
    /// The field exists in both snapshots with different values.
    Modified,
}

/// One field-level delta between two snapshots of a configuration.
///
/// Records are immutable once created; the accessors hand out borrows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    config_name: String,
    field: String,
    old_value: Option<Value>,
    new_value: Option<Value>,
    timestamp: DateTime<Utc>,
}

impl ChangeRecord {
    pub(crate) fn new(
        config_name: &str,
        field: &str,
        old_value: Option<Value>,
        new_value: Option<Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            config_name: config_name.to_string(),
            field: field.to_string(),
            old_value,
            new_value,
            timestamp,
        }
    }

    /// Name of the configuration the field belongs to.
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Top-level key of the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value before the change, `None` if the field was added.
    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    /// Value after the change, `None` if the field was removed.
    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    /// Wall-clock time at which the change was detected.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Classify the record by which side of the comparison is present.
    pub fn kind(&self) -> ChangeKind {
        match (&self.old_value, &self.new_value) {
            (None, _) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(_), Some(_)) => ChangeKind::Modified,
        }
    }
}
