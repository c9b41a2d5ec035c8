//! Index Cache
//!
//! Bounded LRU cache of built indexes, keyed by file identity. A file that
//! has been modified since it was indexed gets a new key and is indexed
//! again; the stale entry ages out.

use std::fs::{self, File};
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use log::debug;
use lru::LruCache;

use super::offset::{IndexOptions, OffsetIndex};
use crate::error::{QcmlError, Result};

/// Identity of an indexed file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl CacheKey {
    /// Compute the key of a file from its canonical path and metadata
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        Ok(Self {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Thread-safe LRU cache of shared indexes
pub struct IndexCache {
    inner: Mutex<LruCache<CacheKey, Arc<OffsetIndex>>>,
    options: IndexOptions,
}

impl IndexCache {
    /// Create a cache holding at most `capacity` indexes (at least one)
    pub fn new(capacity: usize) -> Self {
        Self::with_options(capacity, IndexOptions::default())
    }

    /// Create a cache that builds missing indexes with `options`
    pub fn with_options(capacity: usize, options: IndexOptions) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            options,
        }
    }

    /// Return the cached index for `path`, building it on a miss
    ///
    /// The lock is not held while building, so two threads missing on the
    /// same file may both build; the later insert wins and both results are
    /// equal.
    pub fn get_or_build(&self, path: impl AsRef<Path>) -> Result<Arc<OffsetIndex>> {
        let key = CacheKey::for_path(path)?;

        if let Some(index) = self.lock()?.get(&key) {
            debug!("Index cache hit for {}", key.path.display());
            return Ok(Arc::clone(index));
        }

        debug!("Index cache miss for {}", key.path.display());
        let file = BufReader::new(File::open(&key.path)?);
        let index = Arc::new(OffsetIndex::build_with(file, &self.options)?);
        self.lock()?.put(key, Arc::clone(&index));
        Ok(index)
    }

    /// Number of cached indexes
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Drop every cached index
    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<CacheKey, Arc<OffsetIndex>>>> {
        self.inner.lock().map_err(|_| QcmlError::LockPoisoned)
    }
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
