//! Cart configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-line quantity cap.
pub const DEFAULT_ITEM_MAX_QUANTITY: u64 = 200_000;

/// Lifetime of the cart cookie (7 days).
pub const COOKIE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Where the host keeps the persisted blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Server-side session entry. Saved without a TTL.
    #[default]
    Session,
    /// Client cookie. Saved with [`COOKIE_TTL`], expired on destroy.
    Cookie,
}

impl StorageMode {
    /// TTL to request from the adapter when saving.
    #[must_use]
    pub const fn ttl(self) -> Option<Duration> {
        match self {
            Self::Session => None,
            Self::Cookie => Some(COOKIE_TTL),
        }
    }
}

/// Cart limits and storage mode.
///
/// ## Examples
///
/// ```
/// use session_cart_core::{CartConfig, StorageMode};
///
/// let config = CartConfig::default()
///     .with_item_max_quantity(10)
///     .with_storage(StorageMode::Cookie);
/// assert_eq!(config.item_max_quantity(), 10);
/// assert_eq!(config.cart_max_item(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartConfig {
    cart_max_item: u64,
    item_max_quantity: u64,
    storage: StorageMode,
}

impl CartConfig {
    /// Maximum number of lines. `0` means unlimited.
    ///
    /// Advisory: exceeding it is logged, never rejected.
    #[must_use]
    pub const fn cart_max_item(&self) -> u64 {
        self.cart_max_item
    }

    /// Maximum quantity of a single line.
    #[must_use]
    pub const fn item_max_quantity(&self) -> u64 {
        self.item_max_quantity
    }

    /// Configured storage mode.
    #[must_use]
    pub const fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Set the advisory line limit.
    #[must_use]
    pub const fn with_cart_max_item(mut self, cart_max_item: u64) -> Self {
        self.cart_max_item = cart_max_item;
        self
    }

    /// Set the per-line quantity cap. A cap of `0` is raised to `1`.
    #[must_use]
    pub fn with_item_max_quantity(mut self, item_max_quantity: u64) -> Self {
        if item_max_quantity == 0 {
            tracing::warn!("item_max_quantity of 0 raised to 1");
        }
        self.item_max_quantity = item_max_quantity.max(1);
        self
    }

    /// Set the storage mode.
    #[must_use]
    pub const fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Select cookie storage when `use_cookie` is set, session otherwise.
    #[must_use]
    pub const fn with_use_cookie(self, use_cookie: bool) -> Self {
        self.with_storage(if use_cookie {
            StorageMode::Cookie
        } else {
            StorageMode::Session
        })
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            cart_max_item: 0,
            item_max_quantity: DEFAULT_ITEM_MAX_QUANTITY,
            storage: StorageMode::Session,
        }
    }
}
