//! Carts kept in a browser cookie.
//!
//! The cookie is named after the store key and holds the percent-encoded
//! blob. Reads come from the request's `Cookie` headers; the staged write
//! becomes a single `Set-Cookie` header on the response.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use session_cart_core::{PersistenceAdapter, PersistenceError, StoreKey};
use tower_sessions::cookie::{Cookie, SameSite, time};

use super::staged::{PendingWrite, StagedBlob};

/// Largest `name=value` pair browsers reliably keep.
pub const MAX_COOKIE_BYTES: usize = 4096;

/// Adapter over the cart cookie.
#[derive(Debug, Clone)]
pub struct CookieAdapter {
    staged: StagedBlob,
    secure: bool,
}

impl CookieAdapter {
    /// Read the cart cookie for `key` from request headers.
    ///
    /// `secure` marks written cookies `Secure`.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, key: StoreKey, secure: bool) -> Self {
        let loaded = read_cookie(headers, key.as_str());
        Self {
            staged: StagedBlob::new(key, loaded),
            secure,
        }
    }

    /// Build the `Set-Cookie` header for the staged write.
    ///
    /// Returns `None` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Backend` if the cookie is not a valid header.
    pub fn into_set_cookie(self) -> Result<Option<HeaderValue>, PersistenceError> {
        let name = self.staged.key().as_str().to_owned();
        let secure = self.secure;

        let cookie = match self.staged.into_pending() {
            None => return Ok(None),
            Some(PendingWrite::Save { blob, ttl }) => {
                let mut builder = Cookie::build((name, urlencoding::encode(&blob).into_owned()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(secure);
                if let Some(ttl) = ttl {
                    builder = builder.max_age(time::Duration::seconds(
                        i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
                    ));
                }
                builder.build()
            }
            Some(PendingWrite::Delete) => {
                let mut cookie = Cookie::build((name, ""))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(secure)
                    .build();
                cookie.make_removal();
                cookie
            }
        };

        HeaderValue::from_str(&cookie.to_string())
            .map(Some)
            .map_err(|e| PersistenceError::Backend(format!("invalid cart cookie: {e}")))
    }
}

impl PersistenceAdapter for CookieAdapter {
    fn load(&self, key: &StoreKey) -> Result<Option<String>, PersistenceError> {
        self.staged.check_key(key)?;
        Ok(self.staged.current().map(ToOwned::to_owned))
    }

    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> Result<(), PersistenceError> {
        self.staged.check_key(key)?;

        let size = key.as_str().len() + 1 + urlencoding::encode(blob).len();
        if size > MAX_COOKIE_BYTES {
            return Err(PersistenceError::BlobTooLarge {
                size,
                limit: MAX_COOKIE_BYTES,
            });
        }

        self.staged.stage_save(blob, ttl);
        Ok(())
    }

    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError> {
        self.staged.check_key(key)?;
        self.staged.stage_delete();
        Ok(())
    }
}

/// Find the cookie called `name` and percent-decode its value.
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .and_then(|cookie| match urlencoding::decode(cookie.value()) {
            Ok(value) => Some(value.into_owned()),
            Err(e) => {
                tracing::warn!(cookie = name, "Ignoring undecodable cart cookie: {e}");
                None
            }
        })
}
