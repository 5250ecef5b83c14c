//! Store key derivation.
//!
//! The blob is stored under a key derived from the serving host, so carts of
//! different deployments sharing a cookie domain or session store do not
//! collide.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Discriminator used when no host is known.
pub const FALLBACK_DISCRIMINATOR: &str = "session-cart";

/// Suffix appended to every store key.
pub const KEY_SUFFIX: &str = "_cart";

const TOKEN_LEN: usize = 32;

/// Key under which a cart blob is persisted.
///
/// ## Examples
///
/// ```
/// use session_cart_core::StoreKey;
///
/// let key = StoreKey::for_host(Some("shop.example.com"));
/// assert!(key.as_str().ends_with("_cart"));
/// assert_eq!(key, StoreKey::for_host(Some("shop.example.com")));
/// assert_eq!(StoreKey::for_host(None), StoreKey::for_host(Some("  ")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);

impl StoreKey {
    /// Derive the key for a host, falling back to [`FALLBACK_DISCRIMINATOR`]
    /// when the host is absent or blank.
    #[must_use]
    pub fn for_host(host: Option<&str>) -> Self {
        let discriminator = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(FALLBACK_DISCRIMINATOR);

        let mut token = hex::encode(Sha256::digest(discriminator.as_bytes()));
        token.truncate(TOKEN_LEN);
        token.push_str(KEY_SUFFIX);
        Self(token)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let key = StoreKey::for_host(Some("localhost"));
        assert_eq!(key.as_str().len(), TOKEN_LEN + KEY_SUFFIX.len());
        assert!(
            key.as_str()
                .trim_end_matches(KEY_SUFFIX)
                .bytes()
                .all(|b| b.is_ascii_hexdigit())
        );
    }

    #[test]
    fn test_hosts_do_not_collide() {
        assert_ne!(
            StoreKey::for_host(Some("a.example.com")),
            StoreKey::for_host(Some("b.example.com"))
        );
    }

    #[test]
    fn test_fallback_discriminator() {
        assert_eq!(
            StoreKey::for_host(None),
            StoreKey::for_host(Some(FALLBACK_DISCRIMINATOR))
        );
        assert_eq!(StoreKey::for_host(Some("")), StoreKey::for_host(None));
    }
}
