//! Shared, per-configuration change log.

use super::ChangeRecord;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Append-only log of change records keyed by configuration name.
///
/// One log is shared by every monitor of a registry, guarded by a single
/// mapping-wide lock. By default the log grows without bound; with a capacity
/// each configuration keeps only its most recent records.
///
/// # Examples
///
/// ```rust
/// use confmon::changes::ChangeLog;
///
/// let log = ChangeLog::with_capacity(100);
/// assert!(log.retrieve("app").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ChangeLog {
    logs: Mutex<HashMap<String, VecDeque<ChangeRecord>>>,
    capacity: Option<usize>,
}

impl ChangeLog {
    /// Create an unbounded change log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a change log keeping at most `capacity` records per configuration.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Per-configuration record limit, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Append records for a configuration, preserving their order.
    pub fn record(&self, config_name: &str, records: impl IntoIterator<Item = ChangeRecord>) {
        let mut logs = self.logs.lock();
        let log = logs.entry(config_name.to_string()).or_default();
        log.extend(records);

        // Trim to capacity, oldest first
        if let Some(capacity) = self.capacity {
            while log.len() > capacity {
                log.pop_front();
            }
        }
    }

    /// The full accumulated log for a configuration, oldest first.
    pub fn retrieve(&self, config_name: &str) -> Vec<ChangeRecord> {
        self.logs
            .lock()
            .get(config_name)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records held for a configuration.
    pub fn len(&self, config_name: &str) -> usize {
        self.logs.lock().get(config_name).map_or(0, VecDeque::len)
    }

    /// Whether no records are held for a configuration.
    pub fn is_empty(&self, config_name: &str) -> bool {
        self.len(config_name) == 0
    }

    /// Copy of every configuration's log.
    pub fn all(&self) -> HashMap<String, Vec<ChangeRecord>> {
        self.logs
            .lock()
            .iter()
            .map(|(name, log)| (name.clone(), log.iter().cloned().collect()))
            .collect()
    }

    /// Drop the records of one configuration.
    pub fn clear(&self, config_name: &str) {
        self.logs.lock().remove(config_name);
    }

    /// Drop every record.
    pub fn clear_all(&self) {
        self.logs.lock().clear();
    }
}
