//! Builder for constructing a [`ConfigRegistry`].

use crate::changes::ChangeLog;
use crate::core::{ConfigRegistry, MonitorSettings};
use crate::monitor::MonitorContext;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// Default capacity of each configuration's change-event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Builder for a [`ConfigRegistry`].
///
/// The settings given here seed every configuration registered afterwards;
/// individual entries can override them at registration or at runtime.
///
/// # Examples
///
/// ```rust
/// use confmon::prelude::*;
/// use std::time::Duration;
///
/// let registry = ConfigRegistry::builder()
///     .with_poll_interval(Duration::from_millis(500))
///     .with_retry_interval(Duration::from_secs(5))
///     .with_change_tracking(true)
///     .with_log_capacity(1_000)
///     .build();
/// ```
pub struct RegistryBuilder {
    settings: MonitorSettings,
    log_capacity: Option<usize>,
    channel_capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

impl RegistryBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: MonitorSettings::default(),
            log_capacity: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Delay between two change checks (default 1s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    /// Back-off after a failed change check (default 10s).
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.settings.retry_interval = interval;
        self
    }

    /// Record field-level diffs of every reload in the change log (default off).
    pub fn with_change_tracking(mut self, enabled: bool) -> Self {
        self.settings.track_changes = enabled;
        self
    }

    /// Use these settings as the default for new entries.
    pub fn with_settings(mut self, settings: MonitorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Keep at most `capacity` change records per configuration.
    ///
    /// The log is unbounded unless this is set.
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = Some(capacity);
        self
    }

    /// Buffer size of each configuration's change-event channel (default 64).
    ///
    /// Receivers that fall further behind observe a lag error.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Report polling metrics on the given meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(ConfigMetrics::new(meter));
        self
    }

    /// Build the registry.
    pub fn build(self) -> ConfigRegistry {
        let log = match self.log_capacity {
            Some(capacity) => ChangeLog::with_capacity(capacity),
            None => ChangeLog::new(),
        };

        #[allow(unused_mut)]
        let mut context = MonitorContext::new(log);
        #[cfg(feature = "metrics")]
        {
            context.metrics = self.metrics;
        }

        ConfigRegistry::from_parts(context, self.settings, self.channel_capacity)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = RegistryBuilder::new();

        assert_eq!(builder.settings, MonitorSettings::default());
        assert_eq!(builder.log_capacity, None);
        assert_eq!(builder.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_builder_accumulates_settings() {
        let builder = RegistryBuilder::new()
            .with_poll_interval(Duration::from_millis(250))
            .with_retry_interval(Duration::from_secs(2))
            .with_change_tracking(true)
            .with_log_capacity(10)
            .with_channel_capacity(0);

        assert_eq!(builder.settings.poll_interval, Duration::from_millis(250));
        assert_eq!(builder.settings.retry_interval, Duration::from_secs(2));
        assert!(builder.settings.track_changes);
        assert_eq!(builder.log_capacity, Some(10));
        assert_eq!(builder.channel_capacity, 1);
    }

    #[test]
    fn test_build_applies_log_capacity() {
        let registry = RegistryBuilder::new().with_log_capacity(5).build();
        assert_eq!(registry.change_log().capacity(), Some(5));
    }
}
