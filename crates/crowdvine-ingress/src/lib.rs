//! Crowdvine Ingress
//!
//! Request entry for the storefront edge:
//! - Request context and security header middleware
//! - Tenant extraction middleware and `ResolvedTenant` extractor
//! - Cookie jar extractor and `Set-Cookie` response writer
//! - HTTP mapping of core errors

pub mod cookies;
pub mod middleware;
pub mod tenant;
pub mod types;

pub use cookies::{CookieWrites, RequestCookies};
pub use tenant::{ResolvedTenant, TenantLayerState, tenant_middleware};
pub use types::{ApiError, ApiResult, RequestId, RequestMetadata};
