//! Typed, lock-free view of a registered configuration.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// The application-facing handle to one configuration's typed value.
///
/// The registry owns the write side: only a reload pass of the entry (poll,
/// load or update) replaces the value, and it does so while holding the
/// entry's lock. Reads go through `arc-swap` and never block.
///
/// # Examples
///
/// ```rust,no_run
/// use confmon::prelude::*;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// # async fn example() -> Result<()> {
/// let registry = ConfigRegistry::new();
/// let config = registry
///     .add_config::<AppConfig>("app", "config", ".yaml")
///     .await?;
///
/// // Zero-cost read
/// let cfg = config.get();
/// println!("Port: {}", cfg.port);
/// # Ok(())
/// # }
/// ```
pub struct ConfigHandle<T> {
    name: Arc<str>,
    current: Arc<ArcSwap<T>>,
}

impl<T> ConfigHandle<T> {
    /// Create a standalone handle with an initial value.
    ///
    /// Handles obtained from a registry are kept up to date by its monitors;
    /// a standalone handle never changes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use confmon::core::ConfigHandle;
    ///
    /// let config = ConfigHandle::new("answer", 42);
    /// assert_eq!(*config.get(), 42);
    /// ```
    pub fn new(name: impl Into<Arc<str>>, initial: T) -> Self {
        Self {
            name: name.into(),
            current: Arc::new(ArcSwap::new(Arc::new(initial))),
        }
    }

    /// Get a reference-counted handle to the current value.
    ///
    /// The returned `Arc` is a consistent snapshot; later reloads do not
    /// mutate it.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Name the configuration was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically replace the value.
    pub(crate) fn store(&self, value: T) {
        self.current.store(Arc::new(value));
    }
}

impl<T> Clone for ConfigHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("name", &self.name)
            .field("current", &self.get())
            .finish()
    }
}
