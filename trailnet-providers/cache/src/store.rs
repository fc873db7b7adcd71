//! Key to bytes artifact storage with atomic publication.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tempfile::NamedTempFile;

use crate::errors::StoreError;

/// Storage for cached artifacts keyed by path.
///
/// `publish` must be atomic: a concurrent or later `load` observes either
/// the previous contents or the complete new contents.
pub trait ArtifactStore {
    /// Returns the artifact stored under `key`, or `None` when absent.
    ///
    /// # Errors
    /// Returns [`StoreError::Read`] when the artifact exists but cannot be read.
    fn load(&self, key: &Path) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the artifact stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the artifact cannot be written.
    fn publish(&self, key: &Path, bytes: &[u8]) -> Result<(), StoreError>;

    /// Removes the artifact stored under `key`; absent keys are not an error.
    ///
    /// # Errors
    /// Returns [`StoreError::Retract`] when an existing artifact cannot be
    /// removed.
    fn retract(&self, key: &Path) -> Result<(), StoreError>;
}

/// Stores artifacts as files, publishing through a temporary sibling that is
/// renamed into place.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsArtifactStore;

impl ArtifactStore for FsArtifactStore {
    fn load(&self, key: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(key) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_path_buf(),
                source,
            }),
        }
    }

    fn publish(&self, key: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let stage = |source: io::Error| StoreError::Stage {
            key: key.to_path_buf(),
            source,
        };
        let parent = match key.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent).map_err(stage)?;
        staged.write_all(bytes).map_err(stage)?;
        staged.as_file().sync_all().map_err(stage)?;
        staged.persist(key).map_err(|err| StoreError::Persist {
            key: key.to_path_buf(),
            source: err.error,
        })?;
        Ok(())
    }

    fn retract(&self, key: &Path) -> Result<(), StoreError> {
        match fs::remove_file(key) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(StoreError::Retract {
                key: key.to_path_buf(),
                source: err,
            }),
            _ => Ok(()),
        }
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    /// Drops the artifact under `key`, returning whether it existed.
    pub fn remove(&self, key: &Path) -> bool {
        self.lock().remove(key).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        self.artifacts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load(&self, key: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn publish(&self, key: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(key.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn retract(&self, key: &Path) -> Result<(), StoreError> {
        self.remove(key);
        Ok(())
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for &S {
    fn load(&self, key: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn publish(&self, key: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).publish(key, bytes)
    }

    fn retract(&self, key: &Path) -> Result<(), StoreError> {
        (**self).retract(key)
    }
}
