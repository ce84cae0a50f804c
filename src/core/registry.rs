//! The configuration registry: named entries, their monitors and the change log.

use crate::changes::{ChangeLog, ChangeRecord};
use crate::core::{ConfigEntry, ConfigHandle, Generation, MonitorSettings, RegistryBuilder};
use crate::error::{ConfigError, Result};
use crate::formats::FormatTag;
use crate::monitor::{
    ChangeEvent, MonitorContext, ReloadOrigin, SubscriptionHandle, write_file,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// Owner of every registered configuration.
///
/// A registry maps configuration names to files, keeps each file's typed
/// value current through an optional background monitor, and collects
/// field-level change records in a shared [`ChangeLog`].
///
/// Dropping the registry cancels every running monitor; [`shutdown`] also
/// waits for them to exit.
///
/// [`shutdown`]: ConfigRegistry::shutdown
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
/// let registry = ConfigRegistry::builder().with_change_tracking(true).build();
///
/// // Reads config/app.yaml
/// let config = registry.add_config::<AppConfig>("app", "config", ".yaml").await?;
/// registry.start_monitoring("app").await?;
///
/// let mut changes = registry.changes_channel("app")?;
/// while let Ok(event) = changes.recv().await {
///     println!("{} now on port {}", event.config_name, config.get().port);
///     for record in registry.changes("app") {
///         println!("  {:?} {}", record.kind(), record.field());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigRegistry {
    entries: RwLock<HashMap<String, Arc<ConfigEntry>>>,
    context: Arc<MonitorContext>,
    defaults: MonitorSettings,
    channel_capacity: usize,
    /// Serializes monitor lifecycle changes with the update path
    lifecycle: Mutex<()>,
}

impl ConfigRegistry {
    /// Create a registry with default settings.
    pub fn new() -> Self {
        RegistryBuilder::new().build()
    }

    /// Create a builder for a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(
        context: MonitorContext,
        defaults: MonitorSettings,
        channel_capacity: usize,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            context: Arc::new(context),
            defaults,
            channel_capacity,
            lifecycle: Mutex::new(()),
        }
    }

    // ---- Registration ----

    /// Register the file `dir/<name><tag>` under `name` and load it into `T`.
    ///
    /// `tag` is a format tag such as `.json`, `.yaml`, `.yml`, `.xml`,
    /// `.toml`, `.ini` or a managed variant like `.mk.json`; matching is
    /// case-insensitive and the leading dot is optional.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::AlreadyExists`] if `name` is taken
    /// - [`ConfigError::UnsupportedFormat`] / [`ConfigError::FeatureNotEnabled`]
    ///   if no codec handles `tag`
    /// - [`ConfigError::Io`] / [`ConfigError::Format`] if the initial load fails
    pub async fn add_config<T>(
        &self,
        name: &str,
        dir: impl AsRef<Path>,
        tag: &str,
    ) -> Result<ConfigHandle<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.add_config_with(name, dir, tag, self.defaults.clone())
            .await
    }

    /// Like [`add_config`](Self::add_config), with per-entry monitor settings.
    pub async fn add_config_with<T>(
        &self,
        name: &str,
        dir: impl AsRef<Path>,
        tag: &str,
        settings: MonitorSettings,
    ) -> Result<ConfigHandle<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let format = FormatTag::parse(tag)?;
        let suffix = if tag.starts_with('.') {
            tag.to_string()
        } else {
            format!(".{}", tag)
        };
        let path = dir.as_ref().join(format!("{}{}", name, suffix));
        self.register(name, path, format, settings).await
    }

    /// Register a file, deriving the name and format tag from its file name.
    ///
    /// `app.yaml` registers `app` as YAML, `app.mk.json` registers `app` as
    /// managed JSON.
    pub async fn add_config_file<T>(
        &self,
        dir: impl AsRef<Path>,
        file_name: &str,
    ) -> Result<ConfigHandle<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let (name, tag) = FormatTag::split_file_name(file_name)?;
        self.add_config(&name, dir, &tag).await
    }

    async fn register<T>(
        &self,
        name: &str,
        path: PathBuf,
        format: FormatTag,
        settings: MonitorSettings,
    ) -> Result<ConfigHandle<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        format.ensure_enabled()?;
        if self.entries.read().contains_key(name) {
            return Err(ConfigError::AlreadyExists(name.to_string()));
        }

        let (entry, handle) =
            ConfigEntry::open::<T>(name, path, format, settings, self.channel_capacity).await?;

        // Re-check: another registration may have won while the file was read
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(ConfigError::AlreadyExists(name.to_string()));
        }
        info!(config = %name, path = ?entry.path(), format = %format, "Configuration registered");
        entries.insert(name.to_string(), Arc::new(entry));

        Ok(handle)
    }

    /// Typed handle of a registered configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] for an unknown name, [`ConfigError::TypeMismatch`]
    /// if `T` is not the type the configuration was registered with.
    pub fn get<T: 'static>(&self, name: &str) -> Result<ConfigHandle<T>> {
        self.entry(name)?.handle::<T>()
    }

    /// Names of every registered configuration, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    fn entry(&self, name: &str) -> Result<Arc<ConfigEntry>> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    fn all_entries(&self) -> Vec<Arc<ConfigEntry>> {
        self.entries.read().values().cloned().collect()
    }

    // ---- Loading ----

    /// Re-read a configuration from its file into its typed handle.
    ///
    /// Publishes a change event if the content differs from the last loaded
    /// generation.
    pub async fn load_config(&self, name: &str) -> Result<()> {
        let entry = self.entry(name)?;
        entry.refresh(&self.context, ReloadOrigin::Load).await?;
        debug!(config = %name, "Configuration loaded");
        Ok(())
    }

    /// Re-read every configuration.
    ///
    /// All entries are attempted; the failures are returned by name.
    pub async fn load_all(&self) -> Vec<(String, ConfigError)> {
        let mut failures = Vec::new();
        for entry in self.all_entries() {
            if let Err(e) = entry.refresh(&self.context, ReloadOrigin::Load).await {
                warn!(config = %entry.name(), "Failed to load configuration: {}", e);
                failures.push((entry.name().to_string(), e));
            }
        }
        failures
    }

    // ---- Monitoring control ----

    /// Start the background change monitor of a configuration.
    ///
    /// Starting a running monitor is a no-op.
    pub async fn start_monitoring(&self, name: &str) -> Result<()> {
        let entry = self.entry(name)?;
        let _guard = self.lifecycle.lock().await;
        if entry.start(&self.context).await {
            info!(config = %name, "Change monitoring enabled");
        }
        Ok(())
    }

    /// Stop the monitor of a configuration and wait for it to exit.
    ///
    /// Unknown names and idle entries are ignored.
    pub async fn stop_monitoring(&self, name: &str) {
        let Ok(entry) = self.entry(name) else {
            return;
        };
        let _guard = self.lifecycle.lock().await;
        entry.stop().await;
    }

    /// Start the monitor of every registered configuration.
    pub async fn start_all_monitoring(&self) {
        let _guard = self.lifecycle.lock().await;
        for entry in self.all_entries() {
            if entry.start(&self.context).await {
                info!(config = %entry.name(), "Change monitoring enabled");
            }
        }
    }

    /// Stop every monitor and wait for all of them to exit.
    pub async fn stop_all_monitoring(&self) {
        let _guard = self.lifecycle.lock().await;
        for entry in self.all_entries() {
            entry.stop().await;
        }
    }

    /// Stop and join every monitor, then release the registry.
    pub async fn shutdown(self) {
        self.stop_all_monitoring().await;
        info!("Configuration registry shut down");
    }

    /// Whether the monitor of `name` is running. `false` for unknown names.
    pub fn is_monitoring(&self, name: &str) -> bool {
        self.entry(name).is_ok_and(|entry| entry.is_monitoring())
    }

    // ---- Update ----

    /// Persist a new value for a configuration.
    ///
    /// The monitor is stopped and joined before the file is written, the
    /// written file is reloaded into the typed handle (diffed, logged and
    /// notified as a change with origin [`ReloadOrigin::Update`]), and the
    /// monitor is restarted if it was running. Updates are serialized with
    /// each other and with monitor start/stop.
    pub async fn update_config<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let entry = self.entry(name)?;
        let _guard = self.lifecycle.lock().await;

        let was_running = entry.stop().await;
        let result = self.write_and_reload(&entry, value).await;
        if was_running {
            entry.start(&self.context).await;
        }

        match &result {
            Ok(()) => info!(config = %name, "Configuration updated"),
            Err(e) => warn!(config = %name, "Configuration update failed: {}", e),
        }
        result
    }

    async fn write_and_reload<T: Serialize>(&self, entry: &ConfigEntry, value: &T) -> Result<()> {
        let bytes = entry.format().encode(value)?;
        write_file(entry.path(), &bytes).await?;
        entry.refresh(&self.context, ReloadOrigin::Update).await?;
        Ok(())
    }

    // ---- Settings ----

    /// Current monitor settings of a configuration.
    pub fn settings(&self, name: &str) -> Result<MonitorSettings> {
        Ok(self.entry(name)?.settings())
    }

    /// Enable or disable change tracking for one configuration.
    ///
    /// Takes effect from the next reload.
    pub fn set_change_tracking(&self, name: &str, enabled: bool) -> Result<()> {
        self.entry(name)?
            .update_settings(|s| s.track_changes = enabled);
        Ok(())
    }

    /// Enable or disable change tracking for every configuration.
    pub fn set_all_change_tracking(&self, enabled: bool) {
        for entry in self.all_entries() {
            entry.update_settings(|s| s.track_changes = enabled);
        }
    }

    /// Change the poll interval of one configuration.
    ///
    /// A running monitor picks it up after its current sleep.
    pub fn set_poll_interval(&self, name: &str, interval: Duration) -> Result<()> {
        self.entry(name)?
            .update_settings(|s| s.poll_interval = interval);
        Ok(())
    }

    /// Change the failure back-off of one configuration.
    pub fn set_retry_interval(&self, name: &str, interval: Duration) -> Result<()> {
        self.entry(name)?
            .update_settings(|s| s.retry_interval = interval);
        Ok(())
    }

    // ---- Change inspection ----

    /// The shared change log.
    pub fn change_log(&self) -> &ChangeLog {
        &self.context.log
    }

    /// Every change record logged for `name`, oldest first.
    pub fn changes(&self, name: &str) -> Vec<ChangeRecord> {
        self.context.log.retrieve(name)
    }

    /// Every configuration's change records.
    pub fn all_changes(&self) -> HashMap<String, Vec<ChangeRecord>> {
        self.context.log.all()
    }

    /// Drop the change records of one configuration.
    pub fn clear_changes(&self, name: &str) {
        self.context.log.clear(name);
    }

    /// Drop every change record.
    pub fn clear_all_changes(&self) {
        self.context.log.clear_all();
    }

    /// A receiver for the change events of one configuration.
    ///
    /// Only events published after this call are received.
    pub fn changes_channel(&self, name: &str) -> Result<broadcast::Receiver<ChangeEvent>> {
        Ok(self.entry(name)?.subscribe_channel())
    }

    /// Run `callback` for every change event of one configuration.
    pub fn subscribe<F>(&self, name: &str, callback: F) -> Result<SubscriptionHandle>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        Ok(self.entry(name)?.subscribe(callback))
    }

    /// Run `callback` for every change event of every configuration.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.context.subscribers.subscribe(callback)
    }

    // ---- Introspection ----

    /// Fingerprint of the last loaded generation.
    pub async fn fingerprint(&self, name: &str) -> Result<String> {
        Ok(self.entry(name)?.generation().await.fingerprint().to_string())
    }

    /// Fingerprint and snapshot of the last loaded generation, read together.
    pub async fn current_generation(&self, name: &str) -> Result<Generation> {
        Ok(self.entry(name)?.generation().await)
    }

    /// Number of change checks the monitor of `name` has completed.
    pub fn poll_count(&self, name: &str) -> Result<u64> {
        Ok(self.entry(name)?.poll_count())
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfigRegistry {
    fn drop(&mut self) {
        self.context.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct App {
        port: u16,
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.json"), r#"{"port": 8080}"#).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_add_config_builds_path_from_tag() {
        let dir = setup();
        let registry = ConfigRegistry::new();

        let handle = registry
            .add_config::<App>("app", dir.path(), "json")
            .await
            .unwrap();
        assert_eq!(handle.get().port, 8080);
        assert_eq!(registry.names(), vec!["app"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_fails() {
        let dir = setup();
        let registry = ConfigRegistry::new();
        registry
            .add_config::<App>("app", dir.path(), ".json")
            .await
            .unwrap();

        let err = registry
            .add_config::<App>("app", dir.path(), ".json")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(name) if name == "app"));
    }

    #[tokio::test]
    async fn test_unknown_tag_fails() {
        let dir = setup();
        let registry = ConfigRegistry::new();

        let err = registry
            .add_config::<App>("app", dir.path(), ".properties")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
        assert!(registry.names().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails_registration() {
        let dir = TempDir::new().unwrap();
        let registry = ConfigRegistry::new();

        let err = registry
            .add_config::<App>("app", dir.path(), ".json")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(!registry.contains("app"));
    }

    #[tokio::test]
    async fn test_unknown_name_operations() {
        let registry = ConfigRegistry::new();

        assert!(matches!(
            registry.start_monitoring("nope").await,
            Err(ConfigError::NotFound(_))
        ));
        assert!(matches!(
            registry.load_config("nope").await,
            Err(ConfigError::NotFound(_))
        ));
        assert!(registry.get::<App>("nope").is_err());
        assert!(registry.changes_channel("nope").is_err());

        // Stop on unknown names is a no-op
        registry.stop_monitoring("nope").await;
        assert!(!registry.is_monitoring("nope"));
        assert!(registry.changes("nope").is_empty());
    }

    #[tokio::test]
    async fn test_settings_mutators() {
        let dir = setup();
        let registry = ConfigRegistry::builder()
            .with_poll_interval(Duration::from_secs(3))
            .build();
        registry
            .add_config::<App>("app", dir.path(), ".json")
            .await
            .unwrap();

        assert_eq!(
            registry.settings("app").unwrap().poll_interval,
            Duration::from_secs(3)
        );

        registry.set_change_tracking("app", true).unwrap();
        registry
            .set_poll_interval("app", Duration::from_millis(20))
            .unwrap();
        registry
            .set_retry_interval("app", Duration::from_millis(40))
            .unwrap();

        let settings = registry.settings("app").unwrap();
        assert!(settings.track_changes);
        assert_eq!(settings.poll_interval, Duration::from_millis(20));
        assert_eq!(settings.retry_interval, Duration::from_millis(40));

        registry.set_all_change_tracking(false);
        assert!(!registry.settings("app").unwrap().track_changes);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_joins() {
        let dir = setup();
        let registry = ConfigRegistry::builder()
            .with_poll_interval(Duration::from_millis(10))
            .build();
        registry
            .add_config::<App>("app", dir.path(), ".json")
            .await
            .unwrap();

        registry.start_monitoring("app").await.unwrap();
        registry.start_monitoring("app").await.unwrap();
        assert!(registry.is_monitoring("app"));

        registry.stop_monitoring("app").await;
        assert!(!registry.is_monitoring("app"));
        registry.stop_monitoring("app").await;
        assert!(!registry.is_monitoring("app"));
    }
}
