//! Carts kept as files.
//!
//! Each store key maps to `<dir>/<key>.json`. Writes go to a temporary file
//! that is renamed over the target, so a crash never leaves half a blob.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use session_cart_core::{PersistenceAdapter, PersistenceError, StoreKey};

/// Adapter storing one blob file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    dir: PathBuf,
}

impl FileAdapter {
    /// Store carts under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory carts are stored in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File the blob for `key` is stored in.
    #[must_use]
    pub fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PersistenceAdapter for FileAdapter {
    fn load(&self, key: &StoreKey) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(
        &mut self,
        key: &StoreKey,
        blob: &str,
        ttl: Option<Duration>,
    ) -> Result<(), PersistenceError> {
        if ttl.is_some() {
            tracing::debug!(%key, "File storage does not expire, ignoring TTL");
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), bytes = blob.len(), "Saved cart");
        Ok(())
    }

    fn delete(&mut self, key: &StoreKey) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
