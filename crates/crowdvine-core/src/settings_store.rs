//! Settings store trait
//!
//! The `SettingsStore` trait abstracts the hosted configuration service that
//! holds runtime-adjustable storefront values such as the few-left stock
//! threshold. File-backed and in-memory implementations exist; the hosted
//! database is reached through the same contract.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::{Error, Result};

/// Key under which the few-left stock threshold is stored
pub const FEW_LEFT_THRESHOLD_KEY: &str = "few_left_threshold";

/// Type alias for settings change streams
pub type SettingsChangeStream<'a> = BoxStream<'a, Result<SettingsChange>>;

/// Settings change notification
#[derive(Debug, Clone)]
pub struct SettingsChange {
    /// Timestamp of the change
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Settings version after the change
    pub version: u32,
}

/// Settings store trait
///
/// Implementations:
/// - `InMemorySettingsStore`: fixed values seeded from server configuration
/// - `FileSettingsStore`: YAML/TOML settings file with change watching
///
/// # Example
/// ```no_run
/// # use crowdvine_core::settings_store::SettingsStore;
/// # async fn example(store: &dyn SettingsStore) -> crowdvine_core::Result<()> {
/// let threshold = store.get_setting("few_left_threshold").await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Get a single setting
    ///
    /// # Returns
    /// `Ok(None)` if the key is not set. Errors mean the store itself
    /// failed and are passed to the caller unchanged.
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Get all settings as a JSON object
    async fn get_all(&self) -> Result<serde_json::Value>;

    /// Watch for settings changes
    ///
    /// Stores without change notification return a stream that never yields.
    async fn watch_changes(&self) -> Result<SettingsChangeStream<'_>> {
        Ok(Box::pin(stream::pending()))
    }

    /// Short name used in logs and readiness output
    fn name(&self) -> &'static str;
}

/// Settings store holding a fixed map, used when no settings source is
/// configured and in tests.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a few-left threshold
    pub fn with_few_left_threshold(threshold: u32) -> Self {
        let store = Self::new();
        store.set(FEW_LEFT_THRESHOLD_KEY, serde_json::json!(threshold));
        store
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut values = match self.values.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.insert(key.into(), value);
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let values = self
            .values
            .read()
            .map_err(|e| Error::Internal(format!("Settings lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    async fn get_all(&self) -> Result<serde_json::Value> {
        let values = self
            .values
            .read()
            .map_err(|e| Error::Internal(format!("Settings lock poisoned: {}", e)))?;
        Ok(serde_json::Value::Object(
            values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
