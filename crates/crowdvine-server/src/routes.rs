//! Storefront API routes

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{MatchedPath, Path, Query, Request, State, rejection::QueryRejection},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crowdvine_core::{
    AssetRef, ContentKey, LogoSlot, StockBadge, Tenant, TenantFeatures,
    cookies::{
        ACCESS_GRANTED_COOKIE, ACCESS_GRANTED_VALUE, ensure_access_granted, get_or_create_cart_id,
    },
};
use crowdvine_ingress::{
    ApiError, ApiResult, CookieWrites, RequestCookies, ResolvedTenant,
    middleware::{request_context_middleware, security_headers_middleware},
    tenant_middleware,
};
use crowdvine_observability::{HealthState, health_router, metrics::LookupOutcome};

use crate::app::AppState;

/// Build the full router: storefront API plus health endpoints
pub fn router(state: AppState) -> Router {
    let health = health_router(HealthState::with_readiness_checker(
        state.metrics().clone(),
        state.readiness_checker(),
    ));

    let api = Router::new()
        .route("/api/storefront", get(storefront))
        .route("/api/content/{slot}", get(content))
        .route("/api/stock/policy", get(stock_policy))
        .route("/api/stock/badge", get(stock_badge))
        .route("/api/cart", post(cart))
        .route("/api/access", post(access))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            request_duration_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.tenant_layer(),
            tenant_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(health)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn request_duration_middleware(
    State(state): State<AppState>,
    matched: MatchedPath,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(req).await;
    state
        .metrics()
        .record_request_duration(matched.as_str(), started.elapsed().as_secs_f64());
    response
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorefrontResponse {
    pub tenant: Tenant,
    pub brand: String,
    /// Content key per logo slot
    pub logos: BTreeMap<String, ContentKey>,
    pub features: TenantFeatures,
    pub access_granted: bool,
    /// False while the tenant requires an access grant the visitor lacks
    pub catalogue_visible: bool,
}

async fn storefront(
    State(state): State<AppState>,
    resolved: ResolvedTenant,
    RequestCookies(jar): RequestCookies,
) -> Json<StorefrontResponse> {
    let tenant = resolved.tenant;
    let features = *state.features().for_tenant(tenant);

    let logos = LogoSlot::ALL
        .into_iter()
        .map(|slot| (slot.base_key().to_string(), ContentKey::for_tenant(slot, tenant)))
        .collect();

    let access_granted = jar.get(ACCESS_GRANTED_COOKIE) == Some(ACCESS_GRANTED_VALUE);

    Json(StorefrontResponse {
        tenant,
        brand: tenant.brand_name().to_string(),
        logos,
        features,
        access_granted,
        catalogue_visible: !features.require_access_grant || access_granted,
    })
}

async fn content(
    State(state): State<AppState>,
    resolved: ResolvedTenant,
    Path(slot): Path<String>,
) -> ApiResult<Json<AssetRef>> {
    let slot: LogoSlot = slot.parse()?;
    let key = ContentKey::for_tenant(slot, resolved.tenant);
    let tenant = resolved.tenant.as_str();

    match state.content_store().lookup(&key).await {
        Ok(Some(asset)) => {
            state.metrics().record_content_lookup(tenant, LookupOutcome::Hit);
            Ok(Json(asset))
        }
        Ok(None) => {
            debug!("No asset configured for {}", key);
            state.metrics().record_content_lookup(tenant, LookupOutcome::Miss);
            Err(ApiError::NotFound(key.to_string()))
        }
        Err(e) => {
            state.metrics().record_content_lookup(tenant, LookupOutcome::Error);
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockPolicyResponse {
    pub few_left_threshold: u32,
}

async fn stock_policy(State(state): State<AppState>) -> Json<StockPolicyResponse> {
    let policy = state.stock_policy().await;
    Json(StockPolicyResponse {
        few_left_threshold: policy.few_left_threshold,
    })
}

#[derive(Debug, Deserialize)]
struct BadgeQuery {
    available: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockBadgeResponse {
    pub available: i64,
    pub few_left_threshold: u32,
    pub badge: StockBadge,
    pub label: String,
    /// Whether this tenant renders the badge at all
    pub visible: bool,
}

async fn stock_badge(
    State(state): State<AppState>,
    resolved: ResolvedTenant,
    query: Result<Query<BadgeQuery>, QueryRejection>,
) -> ApiResult<Json<StockBadgeResponse>> {
    let Query(query) = query?;
    let policy = state.stock_policy().await;
    let badge = policy.classify(query.available);

    Ok(Json(StockBadgeResponse {
        available: query.available,
        few_left_threshold: policy.few_left_threshold,
        badge,
        label: badge.label().to_string(),
        visible: state.features().for_tenant(resolved.tenant).show_stock_badges,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart_id: String,
    /// True when this request issued the id
    pub created: bool,
}

async fn cart(
    State(state): State<AppState>,
    RequestCookies(mut jar): RequestCookies,
) -> impl IntoResponse {
    let (cart_id, created) = get_or_create_cart_id(&mut jar, state.cart_cookie());
    if created {
        info!("🛒 Issued new cart id");
        state.metrics().record_cookie_issued(state.cart_cookie().name);
    }

    (CookieWrites(jar), Json(CartResponse { cart_id, created }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub granted: bool,
    pub created: bool,
}

async fn access(
    State(state): State<AppState>,
    resolved: ResolvedTenant,
    RequestCookies(mut jar): RequestCookies,
) -> impl IntoResponse {
    let created = ensure_access_granted(&mut jar, state.access_cookie());
    if created {
        info!("🔑 Granted storefront access on {}", resolved.tenant);
        state.metrics().record_cookie_issued(state.access_cookie().name);
    }

    (
        CookieWrites(jar),
        Json(AccessResponse {
            granted: true,
            created,
        }),
    )
}
