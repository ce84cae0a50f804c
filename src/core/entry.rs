//! Registered configuration entries and their reload pass.

use crate::changes::diff_maps;
use crate::core::ConfigHandle;
use crate::error::{ConfigError, Result};
use crate::formats::{FormatTag, Snapshot};
use crate::monitor::{
    ChangeEvent, ChangeReason, MonitorContext, MonitorHandle, ReloadOrigin, SubscriberRegistry,
    SubscriptionHandle, fingerprint_bytes, read_file,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

/// Default delay between two change checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default back-off after a failed change check.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Polling cadence and tracking flag of one configuration.
///
/// When deserialized (for example from the application's own settings file),
/// intervals are given in whole seconds:
///
/// ```rust
/// use confmon::core::MonitorSettings;
/// use std::time::Duration;
///
/// let settings: MonitorSettings =
///     serde_json::from_str(r#"{"poll_secs": 5, "track_changes": true}"#).unwrap();
/// assert_eq!(settings.poll_interval, Duration::from_secs(5));
/// assert_eq!(settings.retry_interval, Duration::from_secs(10));
/// assert!(settings.track_changes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Delay between two change checks.
    #[serde(rename = "poll_secs", deserialize_with = "duration_from_secs")]
    pub poll_interval: Duration,
    /// Delay before retrying after a failed check.
    #[serde(rename = "retry_secs", deserialize_with = "duration_from_secs")]
    pub retry_interval: Duration,
    /// Whether reloads are diffed into the change log.
    pub track_changes: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            track_changes: false,
        }
    }
}

fn duration_from_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

/// The fingerprint and untyped snapshot of one loaded file generation.
///
/// Both halves always come from the same read of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    fingerprint: String,
    snapshot: Snapshot,
}

impl Generation {
    /// Content fingerprint of this generation.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Untyped view of this generation.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

/// Type-erased write side of a [`ConfigHandle`].
pub(crate) trait Target: Send + Sync {
    /// Decode `bytes` and, on success, replace the typed value.
    fn replace(&self, format: FormatTag, bytes: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> Target for ConfigHandle<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn replace(&self, format: FormatTag, bytes: &[u8]) -> Result<()> {
        let value: T = format.decode(bytes)?;
        self.store(value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One registered configuration: identity, typed target, last generation,
/// settings, monitor lifecycle and notification outlets.
pub(crate) struct ConfigEntry {
    name: String,
    path: PathBuf,
    format: FormatTag,
    target: Box<dyn Target>,
    generation: Mutex<Generation>,
    settings: parking_lot::RwLock<MonitorSettings>,
    monitoring: AtomicBool,
    polls: AtomicU64,
    monitor: Mutex<Option<MonitorHandle>>,
    events: broadcast::Sender<ChangeEvent>,
    subscribers: SubscriberRegistry,
}

impl ConfigEntry {
    /// Read the file once and build an entry plus its typed handle.
    pub(crate) async fn open<T>(
        name: &str,
        path: PathBuf,
        format: FormatTag,
        settings: MonitorSettings,
        channel_capacity: usize,
    ) -> Result<(Self, ConfigHandle<T>)>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let bytes = read_file(&path).await?;
        let snapshot = format.decode_map(&bytes)?;
        let handle = ConfigHandle::new(name, format.decode::<T>(&bytes)?);
        let (events, _) = broadcast::channel(channel_capacity.max(1));

        let entry = Self {
            name: name.to_string(),
            path,
            format,
            target: Box::new(handle.clone()),
            generation: Mutex::new(Generation {
                fingerprint: fingerprint_bytes(&bytes),
                snapshot,
            }),
            settings: parking_lot::RwLock::new(settings),
            monitoring: AtomicBool::new(false),
            polls: AtomicU64::new(0),
            monitor: Mutex::new(None),
            events,
            subscribers: SubscriberRegistry::new(),
        };
        Ok((entry, handle))
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn format(&self) -> FormatTag {
        self.format
    }

    /// The typed handle, if `T` is the type the entry was registered with.
    pub(crate) fn handle<T: 'static>(&self) -> Result<ConfigHandle<T>> {
        self.target
            .as_any()
            .downcast_ref::<ConfigHandle<T>>()
            .cloned()
            .ok_or_else(|| {
                ConfigError::TypeMismatch(format!(
                    "configuration '{}' is not registered as {}",
                    self.name,
                    std::any::type_name::<T>()
                ))
            })
    }

    pub(crate) fn settings(&self) -> MonitorSettings {
        self.settings.read().clone()
    }

    pub(crate) fn update_settings(&self, update: impl FnOnce(&mut MonitorSettings)) {
        update(&mut self.settings.write());
    }

    pub(crate) fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub(crate) fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) async fn generation(&self) -> Generation {
        self.generation.lock().await.clone()
    }

    pub(crate) fn subscribe_channel(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// One reload pass.
    ///
    /// The file is read once under the entry lock. A poll only proceeds when
    /// the fingerprint differs from the current generation; loads and updates
    /// always replace the typed value. The new fingerprint and snapshot are
    /// committed together, and only after every decode has succeeded, so a
    /// failed pass is retried in full on the next tick.
    ///
    /// Returns the published event when the content changed.
    pub(crate) async fn refresh(
        &self,
        context: &MonitorContext,
        origin: ReloadOrigin,
    ) -> Result<Option<ChangeEvent>> {
        let mut current = self.generation.lock().await;

        let bytes = read_file(&self.path).await?;
        let fingerprint = fingerprint_bytes(&bytes);
        let changed = fingerprint != current.fingerprint;
        if !changed && origin == ReloadOrigin::Poll {
            return Ok(None);
        }

        let snapshot = self.format.decode_map(&bytes)?;
        self.target.replace(self.format, &bytes)?;

        let tracking = self.settings.read().track_changes;
        let records = if changed && tracking {
            diff_maps(&self.name, &current.snapshot, &snapshot)
        } else {
            Vec::new()
        };

        *current = Generation {
            fingerprint: fingerprint.clone(),
            snapshot,
        };

        if !changed {
            debug!(config = %self.name, origin = ?origin, "Reloaded unchanged content");
            return Ok(None);
        }

        let event = ChangeEvent {
            config_name: self.name.clone(),
            reason: if tracking {
                ChangeReason::Tracked
            } else {
                ChangeReason::Changed
            },
            origin,
            changes: records.len(),
            fingerprint,
            timestamp: Utc::now(),
        };

        if !records.is_empty() {
            context.log.record(&self.name, records);
        }
        self.publish(context, &event);

        Ok(Some(event))
    }

    fn publish(&self, context: &MonitorContext, event: &ChangeEvent) {
        // No receivers is fine; callbacks may still be listening
        let _ = self.events.send(event.clone());
        self.subscribers.notify_all(event);
        context.subscribers.notify_all(event);
    }

    /// Spawn the monitor unless one is already running.
    ///
    /// Returns `false` if a monitor was already active.
    pub(crate) async fn start(self: &Arc<Self>, context: &Arc<MonitorContext>) -> bool {
        let mut slot = self.monitor.lock().await;
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!(config = %self.name, "Change monitor already running");
            return false;
        }

        *slot = Some(MonitorHandle::spawn(Arc::clone(self), Arc::clone(context)));
        self.monitoring.store(true, Ordering::SeqCst);
        true
    }

    /// Cancel the monitor and wait for its task to exit.
    ///
    /// Returns `true` if a monitor was running. Stopping an idle entry is a
    /// no-op.
    pub(crate) async fn stop(&self) -> bool {
        let mut slot = self.monitor.lock().await;
        let stopped = match slot.take() {
            Some(handle) => {
                handle.stop(&self.name).await;
                info!(config = %self.name, "Change monitoring disabled");
                true
            }
            None => false,
        };
        self.monitoring.store(false, Ordering::SeqCst);
        stopped
    }
}
