//! Tenant extraction
//!
//! `tenant_middleware` resolves the tenant once per request from the host
//! and stores it as a request extension. Handlers take `ResolvedTenant` as an
//! extractor instead of re-reading the host.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, Uri, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crowdvine_core::{Tenant, TenantResolver};
use crowdvine_observability::Metrics;

use crate::types::ApiError;

/// Response header naming the tenant that served the request
pub const TENANT_HEADER: &str = "x-crowdvine-tenant";

/// Tenant decision for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub tenant: Tenant,
    /// Host as received, before normalisation
    pub host: Option<String>,
}

impl ResolvedTenant {
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

/// State for `tenant_middleware`
#[derive(Clone)]
pub struct TenantLayerState {
    pub resolver: Arc<TenantResolver>,
    pub metrics: Option<Arc<Metrics>>,
}

impl TenantLayerState {
    pub fn new(resolver: Arc<TenantResolver>) -> Self {
        Self {
            resolver,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Host of the request: the `Host` header, else the URI authority
/// (HTTP/2 requests carry it as `:authority`).
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
}

/// Middleware that resolves the tenant and tags the response with it
pub async fn tenant_middleware(
    State(state): State<TenantLayerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let host = request_host(req.headers(), req.uri());
    let tenant = state.resolver.resolve(host.as_deref());

    debug!(tenant = %tenant, host = ?host, "Resolved tenant");
    if let Some(metrics) = &state.metrics {
        metrics.record_tenant(tenant.as_str());
    }

    req.extensions_mut().insert(ResolvedTenant { tenant, host });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(TENANT_HEADER, HeaderValue::from_static(tenant.as_str()));
    response
}

impl<S> FromRequestParts<S> for ResolvedTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedTenant>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("tenant middleware is not installed".to_string()))
    }
}
