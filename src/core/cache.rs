// src/core/cache.rs

use crate::constants::HASH_TRUNCATE_LENGTH;
use anyhow::{Context, Result};
use log::debug;
use std::{
    any::Any,
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::SystemTime,
};

/// Represents the validation metadata for a cache entry.
/// This layered approach allows for fast checks before resorting to hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValidationData {
    pub timestamp: SystemTime,
    pub file_size: u64,
    pub content_hash: String,
}

impl CacheValidationData {
    /// Two snapshots describe the same content when size and hash agree.
    /// The timestamp alone never invalidates an entry (touching a file is not a change).
    pub fn same_content(&self, other: &Self) -> bool {
        self.file_size == other.file_size && self.content_hash == other.content_hash
    }
}

/// Calculates the validation metadata for a given file path.
///
/// This function implements a multi-layered validation strategy for performance:
/// 1. Timestamp (modified time)
/// 2. File size
/// 3. Content Hash (blake3)
///
/// # Errors
/// Returns an I/O error if the file cannot be read or its metadata cannot be accessed.
pub fn calculate_validation_data(path: &Path) -> Result<CacheValidationData> {
    debug!("Calculating validation data for '{}'", path.display());

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for file '{}'", path.display()))?;

    let timestamp = metadata.modified()?;
    let file_size = metadata.len();

    let content = fs::read(path)
        .with_context(|| format!("Failed to read content of file '{}'", path.display()))?;

    let hash = blake3::hash(&content);
    let digest: &[u8] = hash.as_bytes();
    let content_hash = hex::encode(digest.get(..HASH_TRUNCATE_LENGTH).unwrap_or(digest));

    debug!(
        "Validation data for '{}': size={}, hash={}",
        path.display(),
        file_size,
        content_hash
    );

    Ok(CacheValidationData {
        timestamp,
        file_size,
        content_hash,
    })
}

/// A checksum that is `None` when the file does not exist (yet).
fn checksum_or_sentinel(path: &Path) -> Option<CacheValidationData> {
    calculate_validation_data(path).ok()
}

struct CachedModel {
    model: Rc<dyn Any>,
    validation: Option<CacheValidationData>,
}

/// Previously loaded models keyed by normalized absolute path.
///
/// Entries hold shared handles, so a hit hands out the very same instance that was
/// registered. The cache lives exactly as long as one top-level load or save call.
#[derive(Default)]
pub struct FileModelCache {
    entries: HashMap<PathBuf, CachedModel>,
}

impl fmt::Debug for FileModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("FileModelCache")
            .field("entries", &keys)
            .finish()
    }
}

impl FileModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `model` under `path` together with a checksum of the file's current bytes.
    /// Registering a path twice replaces the previous entry.
    pub fn register_model<T: Any>(&mut self, path: &Path, model: Rc<T>) {
        let validation = checksum_or_sentinel(path);
        let model: Rc<dyn Any> = model;
        if self
            .entries
            .insert(path.to_path_buf(), CachedModel { model, validation })
            .is_some()
        {
            debug!("Replaced cache entry for '{}'", path.display());
        }
    }

    /// Returns the cached instance for `path`, or `None` when there is no entry of type `T`.
    pub fn retrieve_model<T: Any>(&self, path: &Path) -> Option<Rc<T>> {
        let entry = self.entries.get(path)?;
        Rc::clone(&entry.model).downcast::<T>().ok()
    }

    /// Recomputes the checksum of `path` and compares it to the one stored at registration.
    /// A path without an entry counts as changed.
    pub fn has_changed(&self, path: &Path) -> bool {
        let Some(entry) = self.entries.get(path) else {
            return true;
        };
        match (&entry.validation, checksum_or_sentinel(path)) {
            (None, None) => false,
            (Some(stored), Some(current)) => !stored.same_content(&current),
            _ => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
