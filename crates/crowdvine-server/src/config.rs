use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

use crowdvine_core::{
    Error, FeatureToggles, InMemoryContentStore, Result, TenancyConfig,
    stock::DEFAULT_FEW_LEFT_THRESHOLD,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub tenancy: TenancyConfig,

    #[serde(default)]
    pub stock: StockConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub features: FeatureToggles,

    #[serde(default)]
    pub cookies: CookieConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Used when the settings store has no usable threshold
    #[serde(default = "default_few_left_threshold")]
    pub few_left_threshold: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// YAML/TOML settings file; in-memory settings when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Assets by content key, e.g. `header_logo_dirtywine`
    #[serde(default)]
    pub assets: BTreeMap<String, AssetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Add `Secure` to every cookie the server writes
    #[serde(default = "default_false")]
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tenancy: TenancyConfig::default(),
            stock: StockConfig::default(),
            settings: SettingsConfig::default(),
            content: ContentConfig::default(),
            features: FeatureToggles::default(),
            cookies: CookieConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            few_left_threshold: default_few_left_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {}", e)))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {}", e)))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    ///
    /// Returns warnings for values that were present but unusable; they are
    /// logged once tracing is up.
    pub fn merge_env(&mut self) -> Vec<String> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`merge_env`](Self::merge_env) with an explicit variable source
    pub fn merge_env_from<F>(&mut self, var: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(val) = var("CROWDVINE_LOCAL_TENANT_OVERRIDE") {
            match parse_bool(&val) {
                Some(enabled) => self.tenancy.local_override = enabled,
                None => warnings.push(format!(
                    "Invalid CROWDVINE_LOCAL_TENANT_OVERRIDE '{}', keeping {}",
                    val, self.tenancy.local_override
                )),
            }
        }

        if let Some(val) = var("CROWDVINE_FEW_LEFT_THRESHOLD") {
            match val.trim().parse::<u32>() {
                Ok(threshold) => self.stock.few_left_threshold = threshold,
                Err(_) => warnings.push(format!(
                    "Invalid CROWDVINE_FEW_LEFT_THRESHOLD '{}', keeping {}",
                    val, self.stock.few_left_threshold
                )),
            }
        }

        if let Some(val) = var("CROWDVINE_SETTINGS_FILE") {
            self.settings.file = Some(val);
        }

        if let Some(val) = var("CROWDVINE_SECURE_COOKIES") {
            match parse_bool(&val) {
                Some(secure) => self.cookies.secure = secure,
                None => warnings.push(format!("Invalid CROWDVINE_SECURE_COOKIES '{}'", val)),
            }
        }

        if let Some(val) = var("CROWDVINE_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(val) = var("CROWDVINE_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warnings.push(format!("Invalid CROWDVINE_PORT '{}'", val)),
            }
        }

        if let Some(val) = var("CROWDVINE_HOST") {
            self.host = val;
        }

        warnings
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::ConfigValidation("host must not be empty".to_string()));
        }

        if self.port == 0 {
            return Err(Error::ConfigValidation("port must be non-zero".to_string()));
        }

        for (key, asset) in &self.content.assets {
            if key.trim().is_empty() {
                return Err(Error::ConfigValidation(
                    "content asset keys must not be empty".to_string(),
                ));
            }
            if asset.url.trim().is_empty() {
                return Err(Error::ConfigValidation(format!(
                    "content asset '{}' has an empty url",
                    key
                )));
            }
        }

        if let Some(file) = &self.settings.file
            && file.trim().is_empty()
        {
            return Err(Error::ConfigValidation(
                "settings.file must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve `host:port` to the address to listen on
    ///
    /// `host` may be an IP literal or a name such as `localhost`.
    pub async fn socket_addr(&self) -> Result<SocketAddr> {
        let target = format!("{}:{}", self.host, self.port);
        tokio::net::lookup_host(&target)
            .await
            .map_err(|e| Error::Config(format!("Cannot resolve listen address {}: {}", target, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("No address found for {}", target)))
    }

    /// Content store holding the configured assets
    pub fn content_store(&self) -> InMemoryContentStore {
        let mut store = InMemoryContentStore::new();
        for (key, asset) in &self.content.assets {
            store.insert(key.as_str().into(), asset.url.clone(), asset.alt.clone());
        }
        store
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_few_left_threshold() -> u32 {
    DEFAULT_FEW_LEFT_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
