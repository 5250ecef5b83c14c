//! Application state shared across handlers.

use std::sync::Arc;

use session_cart_core::StoreKey;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: StorefrontConfig,
    store_key: StoreKey,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The store key is derived once from the configured base URL.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let store_key = config.store_key();
        tracing::debug!(key = %store_key, "Derived cart store key");

        Self {
            inner: Arc::new(AppStateInner { config, store_key }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Key carts are persisted under.
    #[must_use]
    pub fn store_key(&self) -> &StoreKey {
        &self.inner.store_key
    }
}
