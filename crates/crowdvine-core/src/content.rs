//! Tenant-scoped content keys and the content store collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::tenant::{Tenant, TenantResolver};
use crate::{Error, Result};

/// Base keys for the logo assets each storefront renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSlot {
    HeaderLogo,
    FooterLogo,
    AlternativeLogo,
}

impl LogoSlot {
    pub const ALL: [LogoSlot; 3] = [
        LogoSlot::HeaderLogo,
        LogoSlot::FooterLogo,
        LogoSlot::AlternativeLogo,
    ];

    pub fn base_key(&self) -> &'static str {
        match self {
            LogoSlot::HeaderLogo => "header_logo",
            LogoSlot::FooterLogo => "footer_logo",
            LogoSlot::AlternativeLogo => "alternative_logo",
        }
    }
}

impl fmt::Display for LogoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_key())
    }
}

impl FromStr for LogoSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LogoSlot::ALL
            .into_iter()
            .find(|slot| slot.base_key() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown content slot: {}", s)))
    }
}

/// Lookup token for a tenant-specific asset, e.g. `header_logo_dirtywine`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn for_tenant(slot: LogoSlot, tenant: Tenant) -> Self {
        Self(format!("{}_{}", slot.base_key(), tenant.content_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TenantResolver {
    /// Content key for `slot` on the storefront served at `host`.
    ///
    /// Goes through [`TenantResolver::resolve`], so a host that resolves to
    /// B2B always gets the `_dirtywine` variant.
    pub fn content_key(&self, slot: LogoSlot, host: Option<&str>) -> ContentKey {
        ContentKey::for_tenant(slot, self.resolve(host))
    }
}

/// Reference to a rendered asset held by the content service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub key: ContentKey,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Content store collaborator
///
/// Returns `Ok(None)` when the key is not configured; errors are reserved
/// for failures of the service itself and are passed through unchanged.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn lookup(&self, key: &ContentKey) -> Result<Option<AssetRef>>;
}

/// Content store backed by a fixed map, built from configuration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    assets: HashMap<ContentKey, AssetRef>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, key: impl Into<ContentKey>, url: impl Into<String>) -> Self {
        self.insert(key.into(), url.into(), None);
        self
    }

    pub fn insert(&mut self, key: ContentKey, url: String, alt: Option<String>) {
        self.assets
            .insert(key.clone(), AssetRef { key, url, alt });
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn lookup(&self, key: &ContentKey) -> Result<Option<AssetRef>> {
        Ok(self.assets.get(key).cloned())
    }
}
