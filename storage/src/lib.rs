//! # Railbook Storage
//!
//! Durable key-value persistence for Railbook application state.
//!
//! Layers, bottom up:
//!
//! - [`KeyValueBackend`]: raw strings in a process-external store
//!   ([`MemoryBackend`], [`FileBackend`])
//! - [`DurableStorage`]: JSON encoding with explicit `Result`s
//! - [`PersistedValue`]: one key mirrored in memory, seeded once, written
//!   best-effort; absorbed failures go to a [`DiagnosticsSink`]
//!
//! ## Example
//!
//! ```ignore
//! use railbook_storage::{DurableStorage, FileBackend};
//!
//! let storage = DurableStorage::new(FileBackend::new(".railbook/storage.json"));
//! let theme = storage.persisted("theme", String::from("light"));
//! theme.set(String::from("dark"));
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

mod backend;
mod diagnostics;
mod error;
mod file;
mod persisted;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics};
pub use error::{Operation, PersistenceFailure, StorageError};
pub use file::FileBackend;
pub use persisted::{PersistedValue, WriteOutcome};

/// JSON codec over a [`KeyValueBackend`], plus the sink for absorbed failures
///
/// Cheap to clone; clones share the backend and the sink.
#[derive(Clone)]
pub struct DurableStorage {
    backend: Arc<dyn KeyValueBackend>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl fmt::Debug for DurableStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurableStorage").finish_non_exhaustive()
    }
}

impl DurableStorage {
    /// Wrap `backend`, logging absorbed failures through [`TracingDiagnostics`]
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self::from_parts(Arc::new(backend), Arc::new(TracingDiagnostics))
    }

    /// Build from shared parts
    #[must_use]
    pub fn from_parts(backend: Arc<dyn KeyValueBackend>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self { backend, diagnostics }
    }

    /// Replace the diagnostics sink
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The underlying backend
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    /// Load and decode the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored text is not valid
    /// JSON for `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backend rejects the write.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }

    /// Delete `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)
    }

    /// Create a [`PersistedValue`] for `key`, reading the store once
    pub fn persisted<T>(&self, key: impl Into<String>, initial: T) -> PersistedValue<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        PersistedValue::new(self.clone(), key, initial)
    }

    /// Hand an absorbed failure to the diagnostics sink
    pub fn report(&self, key: &str, operation: Operation, error: StorageError) {
        self.diagnostics.record(&PersistenceFailure {
            key: key.to_string(),
            operation,
            error,
        });
    }
}
