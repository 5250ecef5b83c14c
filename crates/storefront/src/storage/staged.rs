//! Write staging for request-scoped adapters.
//!
//! Sessions are read and written asynchronously and cookies can only be set
//! on the response, while the cart persists synchronously. Adapters stage the
//! blob here during the request and flush the final state once.

use std::time::Duration;

use session_cart_core::{PersistenceError, StoreKey};

/// Write waiting to be flushed to the real backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// Store the blob.
    Save {
        /// The serialized cart.
        blob: String,
        /// Requested TTL.
        ttl: Option<Duration>,
    },
    /// Remove the entry.
    Delete,
}

/// Blob loaded at the start of a request plus the latest staged write.
#[derive(Debug, Clone)]
pub struct StagedBlob {
    key: StoreKey,
    loaded: Option<String>,
    pending: Option<PendingWrite>,
}

impl StagedBlob {
    /// Stage on top of the blob currently stored under `key`.
    #[must_use]
    pub const fn new(key: StoreKey, loaded: Option<String>) -> Self {
        Self {
            key,
            loaded,
            pending: None,
        }
    }

    /// Key this blob belongs to.
    #[must_use]
    pub const fn key(&self) -> &StoreKey {
        &self.key
    }

    /// The blob as it would read after flushing.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        match &self.pending {
            Some(PendingWrite::Save { blob, .. }) => Some(blob),
            Some(PendingWrite::Delete) => None,
            None => self.loaded.as_deref(),
        }
    }

    /// Stage a save, replacing any earlier staged write.
    pub fn stage_save(&mut self, blob: &str, ttl: Option<Duration>) {
        self.pending = Some(PendingWrite::Save {
            blob: blob.to_owned(),
            ttl,
        });
    }

    /// Stage a delete, replacing any earlier staged write.
    pub fn stage_delete(&mut self) {
        self.pending = Some(PendingWrite::Delete);
    }

    /// The staged write, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingWrite> {
        self.pending.as_ref()
    }

    /// Consume the stage and return the write to flush.
    #[must_use]
    pub fn into_pending(self) -> Option<PendingWrite> {
        self.pending
    }

    /// Reject keys other than the one this stage was opened for.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Backend` on a key mismatch.
    pub fn check_key(&self, key: &StoreKey) -> Result<(), PersistenceError> {
        if key == &self.key {
            Ok(())
        } else {
            Err(PersistenceError::Backend(format!(
                "adapter opened for {} was asked for {key}",
                self.key
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_reflects_latest_write() {
        let key = StoreKey::for_host(None);
        let mut staged = StagedBlob::new(key, Some("{}".to_string()));
        assert_eq!(staged.current(), Some("{}"));

        staged.stage_save(r#"{"a":[]}"#, None);
        assert_eq!(staged.current(), Some(r#"{"a":[]}"#));

        staged.stage_delete();
        assert_eq!(staged.current(), None);
        assert_eq!(staged.into_pending(), Some(PendingWrite::Delete));
    }

    #[test]
    fn test_untouched_stage_has_nothing_to_flush() {
        let staged = StagedBlob::new(StoreKey::for_host(None), None);
        assert!(staged.pending().is_none());
        assert!(staged.into_pending().is_none());
    }

    #[test]
    fn test_check_key() {
        let staged = StagedBlob::new(StoreKey::for_host(Some("a")), None);
        assert!(staged.check_key(&StoreKey::for_host(Some("a"))).is_ok());
        assert!(staged.check_key(&StoreKey::for_host(Some("b"))).is_err());
    }
}
