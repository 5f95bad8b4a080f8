//! Raw string key-value backends.

use crate::StorageError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A synchronous, process-external string key-value store
///
/// Implementations may fail on any call; callers above this layer decide
/// whether a failure is fatal.
pub trait KeyValueBackend: Send + Sync {
    /// Fetch the raw value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or full.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting an absent key succeeds
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

impl MemoryInner {
    fn usage_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

/// In-memory backend
///
/// Clones share one map, the way several tabs of one origin share a
/// browser's storage. Used for session-scoped storage and in tests.
///
/// Usage is counted as key bytes plus value bytes.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty, unbounded backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                entries: HashMap::new(),
                quota: None,
                available: true,
            })),
        }
    }

    /// Create an empty backend that rejects writes beyond `bytes`
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        let backend = Self::new();
        backend.lock().quota = Some(bytes);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enable or disable the backend; a disabled backend fails every call
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Store a raw string, bypassing quota and availability checks
    ///
    /// Useful for seeding values another instance wrote, including invalid JSON.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().entries.insert(key.into(), value.into());
    }

    /// Read a raw string, bypassing availability checks
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Bytes currently in use
    #[must_use]
    pub fn usage(&self) -> usize {
        self.lock().usage_without("")
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.lock();
        if !inner.available {
            return Err(StorageError::Unavailable);
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if !inner.available {
            return Err(StorageError::Unavailable);
        }
        if let Some(capacity) = inner.quota {
            let needed = inner.usage_without(key) + key.len() + value.len();
            if needed > capacity {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    capacity,
                });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if !inner.available {
            return Err(StorageError::Unavailable);
        }
        inner.entries.remove(key);
        Ok(())
    }
}
