//! Per-configuration polling task and its lifecycle handle.

use super::{MonitorContext, ReloadOrigin};
use crate::core::ConfigEntry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(feature = "metrics")]
use std::time::Instant;

/// A running monitor: its cancellation token and the task to join on stop.
///
/// Handles are single-use. Restarting a monitor spawns a new task with a
/// fresh token.
pub(crate) struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawn the polling loop for an entry.
    pub(crate) fn spawn(entry: Arc<ConfigEntry>, context: Arc<MonitorContext>) -> Self {
        let token = context.shutdown.child_token();
        let task = tokio::spawn(run(entry, context, token.clone()));
        Self { token, task }
    }

    /// Whether the task has already exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal cancellation and wait until the task has exited.
    pub(crate) async fn stop(self, config_name: &str) {
        self.token.cancel();
        match self.task.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                error!(config = %config_name, "Change monitor panicked: {}", e);
            }
            Err(e) => {
                warn!(config = %config_name, "Change monitor did not exit cleanly: {}", e);
            }
        }
    }
}

/// The polling loop.
///
/// Each iteration performs one change check, then sleeps for the poll interval
/// (or the retry interval after a failure). Both the check and the sleep race
/// the cancellation token, so a stop request is honoured within one tick.
async fn run(entry: Arc<ConfigEntry>, context: Arc<MonitorContext>, token: CancellationToken) {
    let name = entry.name().to_string();
    info!(config = %name, path = ?entry.path(), "Change monitor started");

    #[cfg(feature = "metrics")]
    if let Some(metrics) = &context.metrics {
        metrics.monitor_started(&name);
    }

    loop {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            outcome = entry.refresh(&context, ReloadOrigin::Poll) => outcome,
        };
        entry.record_poll();

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &context.metrics {
            metrics.record_poll(&name);
            match &outcome {
                Ok(Some(event)) => metrics.record_reload_success(started, &name, event.changes),
                Ok(None) => {}
                Err(_) => metrics.record_reload_failure(started, &name),
            }
        }

        let settings = entry.settings();
        let wait = match outcome {
            Ok(Some(event)) => {
                info!(
                    config = %name,
                    reason = ?event.reason,
                    changes = event.changes,
                    "Configuration reloaded"
                );
                settings.poll_interval
            }
            Ok(None) => {
                debug!(config = %name, "Fingerprint unchanged");
                settings.poll_interval
            }
            Err(e) => {
                warn!(
                    config = %name,
                    retry_in = ?settings.retry_interval,
                    "Change check failed: {}",
                    e
                );
                settings.retry_interval
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    #[cfg(feature = "metrics")]
    if let Some(metrics) = &context.metrics {
        metrics.monitor_stopped(&name);
    }

    info!(config = %name, "Change monitor stopped");
}
