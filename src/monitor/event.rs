//! Change notifications published by monitors.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a notification was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// The file changed and the typed value was reloaded.
    Changed,
    /// The file changed, the typed value was reloaded and the field-level
    /// diff was appended to the change log.
    Tracked,
}

/// What triggered the reload that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadOrigin {
    /// The background poller noticed a new fingerprint.
    Poll,
    /// An explicit load request.
    Load,
    /// A programmatic update written through the registry.
    Update,
}

/// A single "configuration changed" notification.
///
/// Every subscriber of a configuration receives every event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// Name of the configuration that changed.
    pub config_name: String,
    /// Whether the change was tracked into the change log.
    pub reason: ChangeReason,
    /// What triggered the reload.
    pub origin: ReloadOrigin,
    /// Number of change records appended for this reload.
    pub changes: usize,
    /// Fingerprint of the content now loaded.
    pub fingerprint: String,
    /// When the reload completed.
    pub timestamp: DateTime<Utc>,
}
