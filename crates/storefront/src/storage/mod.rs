//! Persistence adapters for carts served over HTTP.
//!
//! # Backends
//!
//! - [`SessionAdapter`] - blob lives in the tower-sessions session
//! - [`CookieAdapter`] - blob lives in its own cookie
//!
//! Both stage writes for the duration of a request; [`CartBackend::commit`]
//! flushes them once the cart operation has finished.

pub mod cookie;
pub mod session;
pub mod staged;

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use session_cart_core::{PersistenceAdapter, PersistenceError, StorageMode, StoreKey};
use tower_sessions::Session;

pub use cookie::{CookieAdapter, MAX_COOKIE_BYTES};
pub use session::SessionAdapter;
pub use staged::{PendingWrite, StagedBlob};

use crate::error::Result;
use crate::state::AppState;

/// The adapter selected by the configured storage mode.
#[derive(Debug, Clone)]
pub enum CartBackend {
    Session(SessionAdapter),
    Cookie(CookieAdapter),
}

impl CartBackend {
    /// Open the backend for the current request.
    pub async fn open(state: &AppState, session: &Session, headers: &HeaderMap) -> Self {
        let key = state.store_key().clone();
        match state.config().cart.storage() {
            StorageMode::Session => Self::Session(SessionAdapter::load(session, key).await),
            StorageMode::Cookie => Self::Cookie(CookieAdapter::from_headers(
                headers,
                key,
                state.config().is_secure(),
            )),
        }
    }

    /// Flush staged writes.
    ///
    /// Returns the `Set-Cookie` header the response must carry, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or cookie encoding fails.
    pub async fn commit(self, session: &Session) -> Result<Option<HeaderValue>> {
        match self {
            Self::Session(adapter) => {
                adapter.commit(session).await?;
                Ok(None)
            }
            Self::Cookie(adapter) => Ok(adapter.into_set_cookie()?),
        }
    }
}

impl PersistenceAdapter for CartBackend {
    fn load(&self, key: &StoreKey) -> std::result::Result<Option<String>, PersistenceError> {
        match self {
            Self::Session(adapter) => adapter.load(key),
            Self::Cookie(adapter) => adapter.load(key),
        }
    }

    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> std::result::Result<(), PersistenceError> {
        match self {
            Self::Session(adapter) => adapter.save(key, blob, ttl),
            Self::Cookie(adapter) => adapter.save(key, blob, ttl),
        }
    }

    fn delete(&mut self, key: &StoreKey) -> std::result::Result<(), PersistenceError> {
        match self {
            Self::Session(adapter) => adapter.delete(key),
            Self::Cookie(adapter) => adapter.delete(key),
        }
    }
}
