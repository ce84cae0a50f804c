//! OpenTelemetry instruments for change monitoring.
//!
//! Tracks, per configuration (`config` attribute):
//! - Poll ticks
//! - Reload successes and failures, with duration
//! - Change records produced by tracked reloads
//! - Active monitors
//!
//! # Examples
//!
//! ```rust,no_run
//! use confmon::prelude::*;
//! use opentelemetry::global;
//!
//! let registry = ConfigRegistry::builder()
//!     .with_metrics(global::meter("my-app"))
//!     .build();
//! ```

mod config_metrics;

pub use config_metrics::ConfigMetrics;
