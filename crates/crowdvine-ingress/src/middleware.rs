//! Shared ingress middleware

use crate::types::{RequestId, RequestMetadata};
use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request id that is reused
const MAX_CLIENT_REQUEST_ID_LEN: usize = 128;

/// Extension key for request metadata
#[derive(Clone)]
pub struct RequestMetadataExt(pub RequestMetadata);

/// Middleware to attach request metadata and echo the request id
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let mut metadata = RequestMetadata::new();

    if let Some(id) = headers.get(REQUEST_ID_HEADER)
        && let Ok(id) = id.to_str()
        && !id.is_empty()
        && id.len() <= MAX_CLIENT_REQUEST_ID_LEN
    {
        metadata = metadata.with_request_id(RequestId::from_string(id.to_string()));
    }

    if let Some(host) = headers.get(header::HOST)
        && let Ok(host) = host.to_str()
    {
        metadata = metadata.with_host(host);
    }

    if let Some(user_agent) = headers.get(header::USER_AGENT)
        && let Ok(ua) = user_agent.to_str()
    {
        metadata = metadata.with_user_agent(ua);
    }

    let request_id = metadata.request_id.clone();
    debug!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        "Handling request"
    );

    req.extensions_mut().insert(RequestMetadataExt(metadata));

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Middleware to add security headers
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
