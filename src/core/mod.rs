//! Core registry types.

mod builder;
mod config_handle;
mod entry;
mod registry;

pub use builder::{DEFAULT_CHANNEL_CAPACITY, RegistryBuilder};
pub use config_handle::ConfigHandle;
pub use entry::{DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_INTERVAL, Generation, MonitorSettings};
pub use registry::ConfigRegistry;

pub(crate) use entry::ConfigEntry;
