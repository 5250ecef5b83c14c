//! Carts kept in the server-side session.

use std::time::Duration;

use session_cart_core::{PersistenceAdapter, PersistenceError, StoreKey};
use tower_sessions::Session;

use super::staged::{PendingWrite, StagedBlob};

/// Adapter over a `tower_sessions::Session`.
///
/// The blob is read once when the adapter is opened. Writes are staged and
/// applied to the session by [`SessionAdapter::commit`].
#[derive(Debug, Clone)]
pub struct SessionAdapter {
    staged: StagedBlob,
}

impl SessionAdapter {
    /// Read the blob stored under `key` in `session`.
    ///
    /// A session that cannot be read opens as empty.
    pub async fn load(session: &Session, key: StoreKey) -> Self {
        let loaded = match session.get::<String>(key.as_str()).await {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(%key, "Failed to read cart from session: {e}");
                None
            }
        };

        Self {
            staged: StagedBlob::new(key, loaded),
        }
    }

    /// Apply the staged write to `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the change.
    pub async fn commit(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        let key = self.staged.key().clone();
        match self.staged.into_pending() {
            Some(PendingWrite::Save { blob, .. }) => {
                session.insert(key.as_str(), blob).await?;
            }
            Some(PendingWrite::Delete) => {
                session.remove::<String>(key.as_str()).await?;
            }
            None => {}
        }
        Ok(())
    }
}

impl PersistenceAdapter for SessionAdapter {
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
        self.staged.stage_save(blob, ttl);
        Ok(())
    }

    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError> {
        self.staged.check_key(key)?;
        self.staged.stage_delete();
        Ok(())
    }
}
