//! Core application state with dependency-injected stores
//!
//! `AppState` holds the tenant resolver and the settings and content store
//! trait objects. The same handlers run against file-backed, in-memory or
//! hosted implementations of those stores.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crowdvine_config_file::FileSettingsStore;
use crowdvine_core::{
    ContentStore, CookieSpec, FeatureToggles, InMemorySettingsStore, Result, SettingsStore,
    StockDisplayPolicy, TenantResolver,
};
use crowdvine_ingress::TenantLayerState;
use crowdvine_observability::{Metrics, ReadinessChecker, StoreStatus};

use crate::config::ServerConfig;

/// Application state shared by all handlers
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use crowdvine_core::{InMemoryContentStore, InMemorySettingsStore};
/// # use crowdvine_server::{app::AppState, config::ServerConfig};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::default();
/// let state = AppState::new(
///     &config,
///     Arc::new(InMemorySettingsStore::with_few_left_threshold(3)),
///     Arc::new(InMemoryContentStore::new()),
/// )?;
///
/// let policy = state.stock_policy().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Shared tenant decision
    resolver: Arc<TenantResolver>,

    /// Runtime settings (file-backed or in-memory)
    settings_store: Arc<dyn SettingsStore>,

    /// Tenant-specific assets
    content_store: Arc<dyn ContentStore>,

    features: Arc<FeatureToggles>,

    metrics: Arc<Metrics>,

    cart_cookie: CookieSpec,
    access_cookie: CookieSpec,

    /// Threshold used when the settings store has none
    few_left_fallback: u32,
}

impl AppState {
    /// Create a new application state
    ///
    /// # Errors
    /// `Error::Internal` if the metrics registry can't be built
    pub fn new(
        config: &ServerConfig,
        settings_store: Arc<dyn SettingsStore>,
        content_store: Arc<dyn ContentStore>,
    ) -> Result<Self> {
        let metrics = Metrics::new().map_err(|e| {
            crowdvine_core::Error::Internal(format!("Failed to create metrics: {}", e))
        })?;

        Ok(Self {
            resolver: Arc::new(TenantResolver::new(config.tenancy.clone())),
            settings_store,
            content_store,
            features: Arc::new(config.features.clone()),
            metrics: Arc::new(metrics),
            cart_cookie: CookieSpec::cart_id().with_secure(config.cookies.secure),
            access_cookie: CookieSpec::access_granted().with_secure(config.cookies.secure),
            few_left_fallback: config.stock.few_left_threshold,
        })
    }

    /// Build the state from configuration, opening the configured stores
    ///
    /// # Errors
    /// Configuration errors from the settings file; these are fatal at startup.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let settings_store: Arc<dyn SettingsStore> = match &config.settings.file {
            Some(path) => {
                let store = FileSettingsStore::new(path).await?;
                info!(
                    "📁 Loading storefront settings from: {}",
                    store.path().display()
                );
                Arc::new(store)
            }
            None => {
                info!(
                    "📁 No settings file configured, few-left threshold fixed at {}",
                    config.stock.few_left_threshold
                );
                Arc::new(InMemorySettingsStore::with_few_left_threshold(
                    config.stock.few_left_threshold,
                ))
            }
        };

        let content_store = config.content_store();
        info!("🖼  {} content assets configured", content_store.len());

        Self::new(config, settings_store, Arc::new(content_store))
    }

    pub fn resolver(&self) -> &Arc<TenantResolver> {
        &self.resolver
    }

    pub fn settings_store(&self) -> &Arc<dyn SettingsStore> {
        &self.settings_store
    }

    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.content_store
    }

    pub fn features(&self) -> &FeatureToggles {
        &self.features
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn cart_cookie(&self) -> &CookieSpec {
        &self.cart_cookie
    }

    pub fn access_cookie(&self) -> &CookieSpec {
        &self.access_cookie
    }

    /// Current stock display policy; never fails
    pub async fn stock_policy(&self) -> StockDisplayPolicy {
        StockDisplayPolicy::load(self.settings_store.as_ref(), self.few_left_fallback).await
    }

    /// State for the tenant extraction middleware
    pub fn tenant_layer(&self) -> TenantLayerState {
        TenantLayerState::new(self.resolver.clone()).with_metrics(self.metrics.clone())
    }

    /// Readiness checker probing this state's stores
    pub fn readiness_checker(&self) -> Arc<dyn ReadinessChecker> {
        Arc::new(StoreReadiness {
            settings_store: self.settings_store.clone(),
        })
    }
}

/// Readiness probe for the settings store
struct StoreReadiness {
    settings_store: Arc<dyn SettingsStore>,
}

#[async_trait]
impl ReadinessChecker for StoreReadiness {
    async fn check(&self) -> Vec<StoreStatus> {
        let name = format!("settings:{}", self.settings_store.name());
        match self.settings_store.get_all().await {
            Ok(_) => vec![StoreStatus::ready(name)],
            Err(e) => vec![StoreStatus::unavailable(name, e.to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdvine_core::InMemoryContentStore;
    use crowdvine_core::Tenant;

    fn state(config: &ServerConfig, threshold: Option<u32>) -> AppState {
        let settings = match threshold {
            Some(t) => InMemorySettingsStore::with_few_left_threshold(t),
            None => InMemorySettingsStore::new(),
        };
        AppState::new(
            config,
            Arc::new(settings),
            Arc::new(InMemoryContentStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_stock_policy_from_settings() {
        let config = ServerConfig::default();
        assert_eq!(state(&config, Some(2)).stock_policy().await.few_left_threshold, 2);
    }

    #[tokio::test]
    async fn test_stock_policy_falls_back_to_config() {
        let mut config = ServerConfig::default();
        config.stock.few_left_threshold = 11;
        assert_eq!(state(&config, None).stock_policy().await.few_left_threshold, 11);
    }

    #[test]
    fn test_resolver_uses_config() {
        let mut config = ServerConfig::default();
        config.tenancy.local_override = true;
        let state = state(&config, None);
        assert_eq!(state.resolver().resolve(Some("localhost")), Tenant::B2b);
    }

    #[test]
    fn test_secure_cookies_from_config() {
        let mut config = ServerConfig::default();
        config.cookies.secure = true;
        let state = state(&config, None);
        assert!(state.cart_cookie().secure);
        assert!(state.access_cookie().secure);
    }

    #[tokio::test]
    async fn test_from_config_missing_settings_file_is_fatal() {
        let mut config = ServerConfig::default();
        config.settings.file = Some("/nonexistent/settings.yaml".to_string());
        let err = AppState::from_config(&config).await.err().unwrap();
        assert!(err.is_fatal_configuration());
    }

    #[tokio::test]
    async fn test_readiness_reports_settings_store() {
        let state = state(&ServerConfig::default(), Some(5));
        let statuses = state.readiness_checker().check().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "settings:memory");
        assert!(statuses[0].ready);
    }
}
