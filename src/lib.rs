//! # confmon
//!
//! Polling configuration monitor with typed hot-reloads and field-level change
//! tracking.
//!
//! ## Overview
//!
//! `confmon` keeps named configuration files loaded into typed values and
//! watches them for changes without restarting the application:
//! - One background monitor per configuration, polling a content fingerprint
//! - Lock-free typed reads using `arc-swap`
//! - Structural diffs of every reload recorded in a shared change log
//! - Change events over broadcast channels and callbacks
//! - JSON, YAML, TOML, XML and INI files, each behind a feature flag
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confmon::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct ServerConfig {
//!     port: u16,
//!     workers: usize,
//! }
//!
//! # async fn example() -> confmon::error::Result<()> {
//! let registry = ConfigRegistry::builder()
//!     .with_poll_interval(Duration::from_secs(2))
//!     .with_change_tracking(true)
//!     .build();
//!
//! // Loads config/server.toml
//! let config = registry
//!     .add_config::<ServerConfig>("server", "config", ".toml")
//!     .await?;
//! registry.start_monitoring("server").await?;
//!
//! // Zero-cost reads, always the latest generation
//! println!("Port: {}", config.get().port);
//!
//! // Persist a new value; the monitor is paused around the write
//! registry
//!     .update_config("server", &ServerConfig { port: 9090, workers: 8 })
//!     .await?;
//!
//! for record in registry.changes("server") {
//!     println!("{}: {:?} -> {:?}", record.field(), record.old_value(), record.new_value());
//! }
//!
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! confmon = { version = "0.1", default-features = false, features = ["yaml", "metrics"] }
//! ```
//!
//! `json`, `yaml`, `toml`, `xml` and `ini` are enabled by default through
//! `all-formats`. `metrics` adds OpenTelemetry instruments.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod changes;
pub mod core;
pub mod error;
pub mod formats;
pub mod monitor;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::changes::{ChangeKind, ChangeRecord};
    pub use crate::core::{ConfigHandle, ConfigRegistry, MonitorSettings, RegistryBuilder};
    pub use crate::error::{ConfigError, Result};
    pub use crate::formats::FormatTag;
    pub use crate::monitor::{ChangeEvent, ChangeReason, ReloadOrigin};
}
