//! Request-scoped cookie jar and identifier issuance
//!
//! A `CookieJar` is built from the request's `Cookie` headers and records
//! every cookie written while handling the request. Reads see pending writes,
//! so issuing an identifier twice within one request returns the same value.
//! The pending writes are turned into `Set-Cookie` headers on the way out.

use http::{HeaderMap, HeaderValue, header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::{Error, Result};

/// Cart identifier cookie name
pub const CART_ID_COOKIE: &str = "cv_cart_id";

/// Access-granted marker cookie name
pub const ACCESS_GRANTED_COOKIE: &str = "cv_access_granted";

/// Value stored in the access-granted cookie
pub const ACCESS_GRANTED_VALUE: &str = "true";

const DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes a cookie is written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: &'static str,
    pub max_age: Duration,
    pub path: &'static str,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
}

impl CookieSpec {
    /// Site-wide, HTTP-only, same-site lax cookie
    pub const fn site_wide(name: &'static str, max_age: Duration) -> Self {
        Self {
            name,
            max_age,
            path: "/",
            http_only: true,
            same_site: SameSite::Lax,
            secure: false,
        }
    }

    /// Cart identifier cookie, 90 days
    pub const fn cart_id() -> Self {
        Self::site_wide(CART_ID_COOKIE, Duration::from_secs(90 * DAY))
    }

    /// Access-granted marker cookie, 1 year
    pub const fn access_granted() -> Self {
        Self::site_wide(ACCESS_GRANTED_COOKIE, Duration::from_secs(365 * DAY))
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// A cookie written during the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub spec: CookieSpec,
    pub value: String,
}

impl SetCookie {
    /// Render as a `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Max-Age={}; Path={}",
            self.spec.name,
            self.value,
            self.spec.max_age.as_secs(),
            self.spec.path
        );
        if self.spec.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str(&format!("; SameSite={}", self.spec.same_site));
        if self.spec.secure {
            out.push_str("; Secure");
        }
        out
    }
}

/// Cookies of one request/response cycle.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    pending: Vec<SetCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from the request's `Cookie` headers.
    ///
    /// Malformed pairs are skipped; when a name repeats the first value wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut incoming = HashMap::new();

        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                if let Some((name, val)) = pair.trim().split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    incoming
                        .entry(name.to_string())
                        .or_insert_with(|| val.trim().trim_matches('"').to_string());
                }
            }
        }

        Self {
            incoming,
            pending: Vec::new(),
        }
    }

    /// Seed a jar with a single cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.incoming.insert(name.into(), value.into());
        self
    }

    /// Current value of a cookie, including writes made in this request
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pending
            .iter()
            .rev()
            .find(|c| c.spec.name == name)
            .map(|c| c.value.as_str())
            .or_else(|| self.incoming.get(name).map(String::as_str))
    }

    /// Return the cookie's value if present and non-empty, otherwise write
    /// the value produced by `make` and return it.
    ///
    /// The flag is `true` when a write happened.
    pub fn get_or_insert_with<F>(&mut self, spec: &CookieSpec, make: F) -> (String, bool)
    where
        F: FnOnce() -> String,
    {
        if let Some(existing) = self.get(spec.name)
            && !existing.is_empty()
        {
            return (existing.to_string(), false);
        }

        let value = make();
        self.pending.push(SetCookie {
            spec: spec.clone(),
            value: value.clone(),
        });
        (value, true)
    }

    /// Cookies written during this request
    pub fn pending(&self) -> &[SetCookie] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// `Set-Cookie` header values for every pending write
    pub fn set_cookie_headers(&self) -> Result<Vec<HeaderValue>> {
        self.pending
            .iter()
            .map(|c| {
                HeaderValue::from_str(&c.header_value()).map_err(|e| {
                    Error::Internal(format!("Invalid Set-Cookie value for {}: {}", c.spec.name, e))
                })
            })
            .collect()
    }
}

/// Return the visitor's cart id, issuing a new one if the jar has none.
pub fn get_or_create_cart_id(jar: &mut CookieJar, spec: &CookieSpec) -> (String, bool) {
    jar.get_or_insert_with(spec, || Uuid::new_v4().to_string())
}

/// Mark the visitor as granted access. Returns `true` if the cookie was
/// written by this call.
pub fn ensure_access_granted(jar: &mut CookieJar, spec: &CookieSpec) -> bool {
    let (_, created) = jar.get_or_insert_with(spec, || ACCESS_GRANTED_VALUE.to_string());
    created
}
