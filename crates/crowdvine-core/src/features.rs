//! Per-tenant feature toggles

use serde::{Deserialize, Serialize};

use crate::tenant::Tenant;

/// Toggles that change storefront behaviour for one tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFeatures {
    /// Render "Few left" / "Sold out" badges on product cards
    pub show_stock_badges: bool,

    /// Show consumer prices with VAT included
    pub prices_include_vat: bool,

    /// Hide the catalogue until the visitor holds the access cookie
    pub require_access_grant: bool,
}

impl TenantFeatures {
    pub fn b2b_defaults() -> Self {
        Self {
            show_stock_badges: true,
            prices_include_vat: false,
            require_access_grant: true,
        }
    }

    pub fn b2c_defaults() -> Self {
        Self {
            show_stock_badges: true,
            prices_include_vat: true,
            require_access_grant: false,
        }
    }

    pub fn defaults_for(tenant: Tenant) -> Self {
        match tenant {
            Tenant::B2b => Self::b2b_defaults(),
            Tenant::B2c => Self::b2c_defaults(),
        }
    }
}

/// Feature toggles for every tenant
///
/// Toggles left out of a tenant's config block keep that tenant's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FeatureTogglesConfig")]
pub struct FeatureToggles {
    pub b2b: TenantFeatures,
    pub b2c: TenantFeatures,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            b2b: TenantFeatures::b2b_defaults(),
            b2c: TenantFeatures::b2c_defaults(),
        }
    }
}

impl FeatureToggles {
    pub fn for_tenant(&self, tenant: Tenant) -> &TenantFeatures {
        match tenant {
            Tenant::B2b => &self.b2b,
            Tenant::B2c => &self.b2c,
        }
    }
}

/// Feature toggles as written in configuration
#[derive(Debug, Default, Deserialize)]
struct FeatureTogglesConfig {
    #[serde(default)]
    b2b: TenantFeaturesConfig,
    #[serde(default)]
    b2c: TenantFeaturesConfig,
}

#[derive(Debug, Default, Deserialize)]
struct TenantFeaturesConfig {
    show_stock_badges: Option<bool>,
    prices_include_vat: Option<bool>,
    require_access_grant: Option<bool>,
}

impl TenantFeaturesConfig {
    fn resolve(self, tenant: Tenant) -> TenantFeatures {
        let defaults = TenantFeatures::defaults_for(tenant);
        TenantFeatures {
            show_stock_badges: self.show_stock_badges.unwrap_or(defaults.show_stock_badges),
            prices_include_vat: self.prices_include_vat.unwrap_or(defaults.prices_include_vat),
            require_access_grant: self
                .require_access_grant
                .unwrap_or(defaults.require_access_grant),
        }
    }
}

impl From<FeatureTogglesConfig> for FeatureToggles {
    fn from(config: FeatureTogglesConfig) -> Self {
        Self {
            b2b: config.b2b.resolve(Tenant::B2b),
            b2c: config.b2c.resolve(Tenant::B2c),
        }
    }
}
