//! Error types for durable storage.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`KeyValueBackend`](crate::KeyValueBackend) or the JSON codec
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend is disabled or cannot be reached
    #[error("Storage backend unavailable")]
    Unavailable,

    /// Writing the value would exceed the backend's capacity
    #[error("Quota exceeded writing '{key}': {needed} bytes needed, capacity is {capacity}")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Total bytes the backend would hold after the write
        needed: usize,
        /// Backend capacity in bytes
        capacity: usize,
    },

    /// A value could not be encoded to, or decoded from, JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage file exists but is not a JSON object of strings
    #[error("Corrupt storage file {}: {reason}", path.display())]
    Corrupt {
        /// Path of the storage file
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

/// Which adapter operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Reading the persisted value at construction
    Read,
    /// Persisting a new value
    Write,
    /// Deleting the key
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Remove => "remove",
        })
    }
}

/// A persistence failure that was absorbed instead of surfaced to callers
#[derive(Debug)]
pub struct PersistenceFailure {
    /// Key the operation targeted
    pub key: String,
    /// Operation that failed
    pub operation: Operation,
    /// Underlying error
    pub error: StorageError,
}

impl fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of '{}' failed: {}", self.operation, self.key, self.error)
    }
}
