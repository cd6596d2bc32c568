//! File-based SettingsStore implementation

use async_trait::async_trait;
use futures::stream;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crowdvine_core::{
    Error, Result,
    settings_store::{SettingsChange, SettingsChangeStream, SettingsStore},
};

/// File-backed settings store
///
/// The file is re-read on every lookup, so edits take effect without a
/// restart. `watch_changes` reports modifications as they happen.
#[derive(Debug)]
pub struct FileSettingsStore {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Bumped each time the watcher sees the file change
    version: Arc<AtomicU32>,
}

impl FileSettingsStore {
    /// Create a new file-based settings store
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if the file doesn't exist
    /// - `Error::Config` if the file isn't a valid YAML/TOML object
    pub async fn new(settings_path: impl Into<PathBuf>) -> Result<Self> {
        let settings_path = expand_home(settings_path.into())?;

        if !settings_path.exists() {
            return Err(Error::ConfigNotFound);
        }

        let store = Self {
            settings_path,
            version: Arc::new(AtomicU32::new(1)),
        };

        // Fail at startup rather than on the first request
        store.read_settings_file()?;

        info!("Initialized FileSettingsStore for {:?}", store.settings_path);

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Read and parse the settings file
    fn read_settings_file(&self) -> Result<serde_json::Value> {
        let contents = std::fs::read_to_string(&self.settings_path).map_err(|e| {
            error!("Failed to read settings file: {}", e);
            Error::Io(e)
        })?;

        let settings: serde_json::Value =
            if self.settings_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
                    error!("Failed to parse TOML settings: {}", e);
                    Error::Config(format!("Invalid TOML: {}", e))
                })?;
                serde_json::to_value(toml_value).map_err(|e| {
                    error!("Failed to convert TOML to JSON: {}", e);
                    Error::Config(format!("TOML conversion error: {}", e))
                })?
            } else if contents.trim().is_empty() {
                serde_json::Value::Object(serde_json::Map::new())
            } else {
                serde_yaml::from_str(&contents).map_err(|e| {
                    error!("Failed to parse YAML settings: {}", e);
                    Error::Config(format!("Invalid YAML: {}", e))
                })?
            };

        if !settings.is_object() {
            return Err(Error::ConfigValidation(format!(
                "Settings file {} must contain a mapping at the top level",
                self.settings_path.display()
            )));
        }

        debug!("Successfully read settings file");
        Ok(settings)
    }
}

fn expand_home(path: PathBuf) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?
            .join(rest)),
        Err(_) => Ok(path),
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let settings = self.read_settings_file()?;
        Ok(settings.get(key).cloned())
    }

    async fn get_all(&self) -> Result<serde_json::Value> {
        self.read_settings_file()
    }

    async fn watch_changes(&self) -> Result<SettingsChangeStream<'_>> {
        let (tx, rx) = mpsc::channel(100);

        let settings_path = self.settings_path.clone();
        let version = self.version.clone();

        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            // std::result::Result: our Result alias takes one parameter
            let mut watcher = match RecommendedWatcher::new(
                move |res: std::result::Result<Event, notify::Error>| {
                    if let Err(e) = notify_tx.send(res) {
                        error!("Failed to send file watch event: {}", e);
                    }
                },
                notify::Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&settings_path, RecursiveMode::NonRecursive) {
                error!("Failed to watch settings file: {}", e);
                return;
            }

            info!("Watching settings file for changes: {:?}", settings_path);

            while let Ok(event_result) = notify_rx.recv() {
                match event_result {
                    Ok(event) => {
                        if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            let change = SettingsChange {
                                timestamp: chrono::Utc::now(),
                                version: version.fetch_add(1, Ordering::SeqCst) + 1,
                            };

                            if tx.blocking_send(Ok(change)).is_err() {
                                debug!("Settings change stream closed, stopping watcher");
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("File watch error: {}", e);
                        if tx
                            .blocking_send(Err(Error::Internal(format!("File watch error: {}", e))))
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
