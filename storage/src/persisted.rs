//! Scoped persisted values: one in-memory mirror per instance, best-effort
//! durable writes.

use crate::{DurableStorage, Operation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{PoisonError, RwLock};

/// Result of a write against a [`PersistedValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The in-memory value changed and the durable store accepted it
    Persisted,
    /// The in-memory value changed but the durable store rejected it
    MemoryOnly,
}

impl WriteOutcome {
    /// Whether the durable store accepted the write
    #[must_use]
    pub const fn is_persisted(self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// A value mirrored to one key of a [`DurableStorage`]
///
/// The durable store is read exactly once, in [`PersistedValue::new`]. From
/// then on every read comes from the in-memory mirror, so writes made through
/// other instances (or other processes) are not observed. Writes always update
/// the mirror; persisting is best-effort and failures are reported to the
/// storage's diagnostics sink, never returned as errors.
///
/// # Example
///
/// ```ignore
/// let counter = storage.persisted("counter", Counter { count: 1 });
/// counter.update(|prev| Counter { count: prev.count + 1 });
/// assert_eq!(counter.get().count, 2);
/// ```
#[derive(Debug)]
pub struct PersistedValue<T> {
    key: String,
    initial: T,
    current: RwLock<T>,
    storage: DurableStorage,
}

impl<T> PersistedValue<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Seed a mirror for `key` from the durable store
    ///
    /// A missing key, an unreadable store, or a value that does not decode as
    /// `T` all yield `initial`.
    pub fn new(storage: DurableStorage, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let current = match storage.load::<T>(&key) {
            Ok(Some(value)) => value,
            Ok(None) => initial.clone(),
            Err(error) => {
                storage.report(&key, Operation::Read, error);
                initial.clone()
            },
        };

        Self {
            key,
            initial,
            current: RwLock::new(current),
            storage,
        }
    }

    /// Key this value is stored under
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value used when nothing valid is persisted
    #[must_use]
    pub const fn initial(&self) -> &T {
        &self.initial
    }

    /// Clone the current value
    #[must_use]
    pub fn get(&self) -> T {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }

    /// Replace the value
    pub fn set(&self, value: T) -> WriteOutcome {
        self.update(move |_| value)
    }

    /// Replace the value with `f(previous)`
    ///
    /// The previous value is the mirror's, not a fresh read of the store.
    /// Concurrent updates through the same instance are serialized.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> WriteOutcome {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(&current);
        let outcome = self.persist(&next);
        *current = next;
        outcome
    }

    /// Delete the key and reset the mirror to the initial value
    ///
    /// The mirror is reset even when the delete fails.
    pub fn remove(&self) -> WriteOutcome {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = self.initial.clone();

        match self.storage.delete(&self.key) {
            Ok(()) => WriteOutcome::Persisted,
            Err(error) => {
                self.storage.report(&self.key, Operation::Remove, error);
                WriteOutcome::MemoryOnly
            },
        }
    }

    fn persist(&self, value: &T) -> WriteOutcome {
        match self.storage.save(&self.key, value) {
            Ok(()) => WriteOutcome::Persisted,
            Err(error) => {
                self.storage.report(&self.key, Operation::Write, error);
                WriteOutcome::MemoryOnly
            },
        }
    }
}
