//! Integration tests for Session Cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p session-cart-integration-tests
//! ```
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`;
//! no server or external store is needed.
//!
//! # Test Categories
//!
//! - `core_store` - Cart rules through the in-memory adapter
//! - `storefront_cart` - JSON API in session and cookie mode

use std::collections::BTreeMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use session_cart_storefront::{app, config::StorefrontConfig, state::AppState};
use tower::ServiceExt;
use tower_sessions::cookie::Cookie;

/// A browser-like client for the storefront router.
///
/// Cookies set by responses are replayed on later requests; removal
/// cookies drop the stored value.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    jar: BTreeMap<String, String>,
}

/// Response with its body parsed as JSON (or kept as a JSON string when it
/// is plain text).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// All `Set-Cookie` headers on the response.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(ToString::to_string)
            .collect()
    }
}

impl TestClient {
    /// Client for a storefront configured from `vars` (defaults elsewhere).
    ///
    /// # Panics
    ///
    /// Panics if the variables do not form a valid configuration.
    #[must_use]
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Invalid test configuration");
        Self::new(config)
    }

    /// Client for a storefront with `config`.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self {
            router: app(AppState::new(config)),
            jar: BTreeMap::new(),
        }
    }

    /// Another visitor of the same storefront, with no cookies.
    #[must_use]
    pub fn fresh_visitor(&self) -> Self {
        Self {
            router: self.router.clone(),
            jar: BTreeMap::new(),
        }
    }

    /// Stored cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(String::as_str)
    }

    /// Store a cookie as if a response had set it.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.jar.insert(name.to_string(), value.to_string());
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if !self.jar.is_empty() {
            let cookies = self
                .jar
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(header::COOKIE, cookies);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        let response = TestResponse {
            status,
            headers,
            body,
        };
        self.store_cookies(&response);
        response
    }

    fn store_cookies(&mut self, response: &TestResponse) {
        for header in response.set_cookies() {
            let Ok(cookie) = Cookie::parse(header) else {
                continue;
            };
            let expired = cookie
                .max_age()
                .is_some_and(|age| age.is_zero() || age.is_negative());
            if expired {
                self.jar.remove(cookie.name());
            } else {
                self.jar
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }
}

/// Percent-encode a blob the way the cookie adapter stores it.
#[must_use]
pub fn encode_cookie_value(blob: &str) -> String {
    urlencoding::encode(blob).into_owned()
}
