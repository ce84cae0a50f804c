//! Change monitoring: fingerprints, per-configuration pollers and notifications.
//!
//! Each monitored configuration runs one background task that re-fingerprints
//! its file on a fixed cadence. When the fingerprint moves, the file is
//! reloaded into the typed handle and the untyped snapshot, optionally diffed
//! into the change log, and a [`ChangeEvent`] is published to every listener.

mod event;
mod fingerprint;
pub(crate) mod poller;
pub mod subscriber;

pub use event::{ChangeEvent, ChangeReason, ReloadOrigin};
pub use fingerprint::{fingerprint, fingerprint_bytes};
pub use subscriber::{SubscriberRegistry, SubscriptionHandle};

pub(crate) use fingerprint::{read_file, write_file};
pub(crate) use poller::MonitorHandle;

use crate::changes::ChangeLog;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// State shared by the registry and every monitor task it spawns.
pub(crate) struct MonitorContext {
    /// Change log shared across all configurations
    pub(crate) log: Arc<ChangeLog>,
    /// Callbacks interested in every configuration
    pub(crate) subscribers: SubscriberRegistry,
    /// Parent of every monitor's cancellation token
    pub(crate) shutdown: CancellationToken,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<ConfigMetrics>,
}

impl MonitorContext {
    pub(crate) fn new(log: ChangeLog) -> Self {
        Self {
            log: Arc::new(log),
            subscribers: SubscriberRegistry::new(),
            shutdown: CancellationToken::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}
