//! Monitoring metrics backed by OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
use std::time::Instant;

/// Metrics collector shared by every monitor of a registry.
///
/// # Examples
///
/// ```rust,no_run
/// use confmon::metrics::ConfigMetrics;
/// use opentelemetry::global;
/// use std::time::Instant;
///
/// let metrics = ConfigMetrics::new(global::meter("confmon"));
///
/// let started = Instant::now();
/// // ... reload ...
/// metrics.record_reload_success(started, "app", 2);
/// ```
#[derive(Clone)]
pub struct ConfigMetrics {
    polls: Counter<u64>,
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    changes_recorded: Counter<u64>,
    active_monitors: UpDownCounter<i64>,
}

impl ConfigMetrics {
    /// Create the instruments on the provided meter.
    pub fn new(meter: Meter) -> Self {
        let polls = meter
            .u64_counter("confmon.poll.ticks")
            .with_description("Number of change checks performed")
            .build();

        let reload_success = meter
            .u64_counter("confmon.reload.success")
            .with_description("Number of reloads triggered by a changed fingerprint")
            .build();

        let reload_failures = meter
            .u64_counter("confmon.reload.failures")
            .with_description("Number of failed change checks")
            .build();

        let reload_duration = meter
            .f64_histogram("confmon.reload.duration")
            .with_description("Duration of change checks that reloaded or failed, in seconds")
            .with_unit("s")
            .build();

        let changes_recorded = meter
            .u64_counter("confmon.changes.recorded")
            .with_description("Number of change records appended to the change log")
            .build();

        let active_monitors = meter
            .i64_up_down_counter("confmon.monitors.active")
            .with_description("Number of running change monitors")
            .build();

        Self {
            polls,
            reload_success,
            reload_failures,
            reload_duration,
            changes_recorded,
            active_monitors,
        }
    }

    /// Record one change check.
    pub fn record_poll(&self, config_name: &str) {
        self.polls.add(1, &attributes(config_name));
    }

    /// Record a reload that committed a new generation.
    ///
    /// `changes` is the number of change records the reload produced.
    pub fn record_reload_success(&self, started: Instant, config_name: &str, changes: usize) {
        let attrs = attributes(config_name);
        self.reload_success.add(1, &attrs);
        self.reload_duration
            .record(started.elapsed().as_secs_f64(), &attrs);
        if changes > 0 {
            self.changes_recorded.add(changes as u64, &attrs);
        }
    }

    /// Record a change check that failed.
    pub fn record_reload_failure(&self, started: Instant, config_name: &str) {
        let attrs = attributes(config_name);
        self.reload_failures.add(1, &attrs);
        self.reload_duration
            .record(started.elapsed().as_secs_f64(), &attrs);
    }

    /// A monitor task started.
    pub fn monitor_started(&self, config_name: &str) {
        self.active_monitors.add(1, &attributes(config_name));
    }

    /// A monitor task exited.
    pub fn monitor_stopped(&self, config_name: &str) {
        self.active_monitors.add(-1, &attributes(config_name));
    }
}

fn attributes(config_name: &str) -> [KeyValue; 1] {
    [KeyValue::new("config", config_name.to_string())]
}
