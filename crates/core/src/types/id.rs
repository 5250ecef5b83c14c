//! Product identifiers.
//!
//! A cart groups lines by the product identifier the host hands in. The
//! identifier is opaque: any string is accepted, including the empty one,
//! and it is stored verbatim as the key of the persisted blob.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a product in the cart.
///
/// ## Examples
///
/// ```
/// use session_cart_core::ProductId;
///
/// let id = ProductId::from("shirt");
/// assert_eq!(id.as_str(), "shirt");
/// assert_eq!(id.to_string(), "shirt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for ProductId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&Self> for ProductId {
    fn from(id: &Self) -> Self {
        id.clone()
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ProductId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProductId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
