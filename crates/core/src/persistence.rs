//! Persistence boundary.
//!
//! The cart never touches cookies or sessions itself. The host hands it a
//! [`PersistenceAdapter`] that stores one text blob per [`StoreKey`]; the cart
//! reads it once on open and writes it after every mutation.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::key::StoreKey;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Reading or writing the underlying storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob does not fit the backend.
    #[error("cart blob of {size} bytes exceeds the {limit} byte limit")]
    BlobTooLarge {
        /// Encoded blob size.
        size: usize,
        /// Maximum the backend accepts.
        limit: usize,
    },
}

/// Key/value storage for the persisted cart blob.
///
/// Carts are owned by a single request, so writes take `&mut self`.
pub trait PersistenceAdapter {
    /// Read the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, key: &StoreKey) -> Result<Option<String>, PersistenceError>;

    /// Store `blob` under `key`, replacing any previous value.
    ///
    /// `ttl` is set for storage that expires (cookies) and `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> Result<(), PersistenceError>;

    /// Remove the entry stored under `key`. Removing a missing entry is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError>;
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for &mut A {
    fn load(&self, key: &StoreKey) -> Result<Option<String>, PersistenceError> {
        (**self).load(key)
    }

    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> Result<(), PersistenceError> {
        (**self).save(key, blob, ttl)
    }

    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError> {
        (**self).delete(key)
    }
}

/// A blob held by [`MemoryAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// The serialized cart.
    pub blob: String,
    /// TTL requested on the last save.
    pub ttl: Option<Duration>,
}

/// In-memory adapter.
///
/// Useful for tests and for hosts that keep carts in their own state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    entries: HashMap<StoreKey, StoredBlob>,
}

impl MemoryAdapter {
    /// Create an empty adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter holding `blob` under `key`.
    #[must_use]
    pub fn with_blob(key: &StoreKey, blob: impl Into<String>) -> Self {
        let mut adapter = Self::new();
        adapter.entries.insert(
            key.clone(),
            StoredBlob {
                blob: blob.into(),
                ttl: None,
            },
        );
        adapter
    }

    /// Inspect the entry stored under `key`.
    #[must_use]
    pub fn entry(&self, key: &StoreKey) -> Option<&StoredBlob> {
        self.entries.get(key)
    }

    /// Returns `true` if an entry exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &StoreKey) -> bool {
        self.entries.contains_key(key)
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load(&self, key: &StoreKey) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).map(|entry| entry.blob.clone()))
    }

    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> Result<(), PersistenceError> {
        self.entries.insert(
            key.clone(),
            StoredBlob {
                blob: blob.to_owned(),
                ttl,
            },
        );
        Ok(())
    }

    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}
