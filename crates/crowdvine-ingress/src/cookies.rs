//! Cookie jar extraction and `Set-Cookie` emission
//!
//! Handlers take `RequestCookies` to get a jar for the request, run the
//! set-if-absent operations from `crowdvine_core::cookies` on it, and return
//! the jar wrapped in `CookieWrites` so pending writes become headers.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};

use crowdvine_core::CookieJar;

use crate::types::ApiError;

/// Request cookies as a mutable, request-scoped jar
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(pub CookieJar);

impl<S> FromRequestParts<S> for RequestCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(CookieJar::from_headers(&parts.headers)))
    }
}

/// Response part appending one `Set-Cookie` header per pending write
#[derive(Debug, Clone)]
pub struct CookieWrites(pub CookieJar);

impl IntoResponseParts for CookieWrites {
    type Error = ApiError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if !self.0.has_pending() {
            return Ok(res);
        }
        for value in self.0.set_cookie_headers()? {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use crowdvine_core::CookieSpec;
    use crowdvine_core::cookies::{CART_ID_COOKIE, get_or_create_cart_id};
    use tower::ServiceExt;

    async fn cart_handler(RequestCookies(mut jar): RequestCookies) -> impl IntoResponse {
        let (id, _) = get_or_create_cart_id(&mut jar, &CookieSpec::cart_id());
        (CookieWrites(jar), id)
    }

    fn app() -> Router {
        Router::new().route("/cart", post(cart_handler))
    }

    #[tokio::test]
    async fn test_new_cart_sets_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with(&format!("{}=", CART_ID_COOKIE)));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
    }

    #[tokio::test]
    async fn test_existing_cart_no_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart")
                    .header(header::COOKIE, "cv_cart_id=abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc123");
    }
}
