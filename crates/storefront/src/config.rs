//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL; its host name keys the cart (default: http://localhost:3000)
//! - `CART_MAX_ITEM` - Advisory line limit, 0 for unlimited (default: 0)
//! - `CART_ITEM_MAX_QUANTITY` - Per-line quantity cap (default: 200000)
//! - `CART_USE_COOKIE` - Keep carts in a cookie instead of the session (default: false)

use std::net::{IpAddr, SocketAddr};

use session_cart_core::{CartConfig, DEFAULT_ITEM_MAX_QUANTITY, StoreKey};
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Cart limits and storage mode
    pub cart: CartConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(&lookup, "STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default(&lookup, "STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = Url::parse(&get_env_or_default(
            &lookup,
            "STOREFRONT_BASE_URL",
            "http://localhost:3000",
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string()))?;

        let cart_max_item = parse_u64(&lookup, "CART_MAX_ITEM", 0)?;
        let item_max_quantity =
            parse_u64(&lookup, "CART_ITEM_MAX_QUANTITY", DEFAULT_ITEM_MAX_QUANTITY)?;
        let use_cookie = lookup("CART_USE_COOKIE")
            .map(|value| {
                parse_bool(&value).ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "CART_USE_COOKIE".to_string(),
                        format!("expected a boolean, got '{value}'"),
                    )
                })
            })
            .transpose()?
            .unwrap_or(false);

        let cart = CartConfig::default()
            .with_cart_max_item(cart_max_item)
            .with_item_max_quantity(item_max_quantity)
            .with_use_cookie(use_cookie);

        Ok(Self {
            host,
            port,
            base_url,
            cart,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Key carts are stored under, derived from the base URL's host name.
    #[must_use]
    pub fn store_key(&self) -> StoreKey {
        StoreKey::for_host(self.base_url.host_str())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional unsigned integer variable.
fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a boolean flag.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
