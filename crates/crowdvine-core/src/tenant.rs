//! Tenant types and host-based tenant resolution
//!
//! One deployment serves two storefronts. The storefront being served is a
//! pure function of the request host and the deployment's `TenancyConfig`,
//! so every tenant-aware provider goes through the same `TenantResolver`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Host fragment that identifies the B2B storefront
pub const B2B_HOST_MARKER: &str = "dirtywine.se";

/// Loopback hosts eligible for the local-development override
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Storefront identity served for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenant {
    /// Dirtywine, the trade storefront
    B2b,
    /// Pact Wines, the consumer storefront
    #[default]
    B2c,
}

impl Tenant {
    pub const ALL: [Tenant; 2] = [Tenant::B2b, Tenant::B2c];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tenant::B2b => "b2b",
            Tenant::B2c => "b2c",
        }
    }

    /// Brand shown to customers of this storefront
    pub fn brand_name(&self) -> &'static str {
        match self {
            Tenant::B2b => "Dirtywine",
            Tenant::B2c => "Pact Wines",
        }
    }

    /// Suffix appended to base content keys for this storefront
    pub fn content_suffix(&self) -> &'static str {
        match self {
            Tenant::B2b => "dirtywine",
            Tenant::B2c => "pact",
        }
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "b2b" => Ok(Tenant::B2b),
            "b2c" => Ok(Tenant::B2c),
            other => Err(Error::InvalidRequest(format!("Unknown tenant: {}", other))),
        }
    }
}

/// Deployment-wide tenancy settings, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Serve the B2B storefront on `localhost` / `127.0.0.1`
    #[serde(default)]
    pub local_override: bool,
}

/// Lower-case the host and drop everything from the first `:` onwards.
pub fn normalize_host(host: &str) -> String {
    let lowered = host.trim().to_ascii_lowercase();
    match lowered.split_once(':') {
        Some((name, _port)) => name.to_string(),
        None => lowered,
    }
}

/// Maps request hosts to tenants.
///
/// Resolution is total: every input, including a missing host, yields a
/// tenant. The resolver holds only an immutable config snapshot and can be
/// shared across threads freely.
///
/// # Example
/// ```
/// # use crowdvine_core::tenant::{TenancyConfig, Tenant, TenantResolver};
/// let resolver = TenantResolver::new(TenancyConfig::default());
/// assert_eq!(resolver.resolve(Some("www.DirtyWine.se:443")), Tenant::B2b);
/// assert_eq!(resolver.resolve(Some("pactwines.com")), Tenant::B2c);
/// assert_eq!(resolver.resolve(None), Tenant::B2c);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TenantResolver {
    config: TenancyConfig,
}

impl TenantResolver {
    pub fn new(config: TenancyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    /// Resolve the tenant for a possibly absent host header value.
    pub fn resolve(&self, host: Option<&str>) -> Tenant {
        let Some(host) = host else {
            return Tenant::B2c;
        };

        let host = normalize_host(host);

        if host.contains(B2B_HOST_MARKER) {
            return Tenant::B2b;
        }

        if self.config.local_override && LOCAL_HOSTS.contains(&host.as_str()) {
            return Tenant::B2b;
        }

        Tenant::B2c
    }
}
