//! Settings change watcher
//!
//! Follows the settings store's change stream for the life of the server,
//! logging each reload and the threshold now in effect.

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::app::AppState;

/// Spawn a task that follows settings changes until the stream ends
pub fn spawn_settings_watcher(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let store = state.settings_store().clone();
        let mut changes = match store.watch_changes().await {
            Ok(changes) => changes,
            Err(e) => {
                warn!("Settings changes will not be watched: {}", e);
                return;
            }
        };

        while let Some(change) = changes.next().await {
            match change {
                Ok(change) => {
                    state.metrics().record_settings_reload();
                    let policy = state.stock_policy().await;
                    info!(
                        "🔄 Settings changed (version {}), few-left threshold is {}",
                        change.version, policy.few_left_threshold
                    );
                }
                Err(e) => warn!("Settings watch error: {}", e),
            }
        }

        info!("Settings change stream ended");
    })
}
