//! Crowdvine Core Types and Traits
//!
//! This crate provides the storefront edge's domain layer:
//! - Tenant resolution from the request host
//! - Tenant-scoped content keys, stock display policy and feature toggles
//! - Request-scoped cookie jar with set-if-absent identifier issuance
//! - Collaborator traits for the settings and content services
//! - Core error types

pub mod content;
pub mod cookies;
pub mod error;
pub mod features;
pub mod settings_store;
pub mod stock;
pub mod tenant;

pub use content::{AssetRef, ContentKey, ContentStore, InMemoryContentStore, LogoSlot};
pub use cookies::{CookieJar, CookieSpec, SameSite};
pub use error::{Error, Result};
pub use features::{FeatureToggles, TenantFeatures};
pub use settings_store::{InMemorySettingsStore, SettingsStore};
pub use stock::{StockBadge, StockDisplayPolicy};
pub use tenant::{TenancyConfig, Tenant, TenantResolver};
