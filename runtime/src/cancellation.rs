//! Registry of pending cancellable effects.
//!
//! Each entry maps an [`EffectId`] to the abort handle of the task running
//! that effect, tagged with a generation number. The generation makes the
//! registry safe against id reuse: a task may only deliver its action, and
//! may only deregister itself, while it still owns the current generation
//! for its id.

use railbook_core::effect::EffectId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;

/// Proof of ownership handed to a cancellable task
///
/// A gate is *current* while the registry entry for its id still carries the
/// same generation. Cancellation or replacement invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    id: EffectId,
    generation: u64,
}

impl Gate {
    /// The effect id this gate belongs to
    #[must_use]
    pub const fn id(&self) -> &EffectId {
        &self.id
    }

    /// Generation assigned when the effect was registered
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct Inner {
    next_generation: u64,
    entries: HashMap<EffectId, Entry>,
}

/// Shared map from effect id to the task currently running that effect
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl CancellationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means another thread panicked mid-update of a
    // plain map; the map itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the future built by `make` and register it under `id`
    ///
    /// The registry lock is held while spawning, so the task cannot observe
    /// the registry before its own entry exists. Any task already registered
    /// under `id` is aborted.
    ///
    /// Returns `true` if an earlier pending effect was replaced.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime (from `tokio::spawn`).
    pub fn spawn<F, Fut>(&self, id: EffectId, make: F) -> bool
    where
        F: FnOnce(Gate) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;

        let task = tokio::spawn(make(Gate {
            id: id.clone(),
            generation,
        }));

        let previous = inner.entries.insert(
            id,
            Entry {
                generation,
                handle: task.abort_handle(),
            },
        );

        previous.is_some_and(|entry| {
            entry.handle.abort();
            true
        })
    }

    /// Cancel the pending effect registered under `id`
    ///
    /// Returns `true` if an effect was pending.
    pub fn cancel(&self, id: &EffectId) -> bool {
        let removed = self.lock().entries.remove(id);
        removed.is_some_and(|entry| {
            entry.handle.abort();
            true
        })
    }

    /// Cancel every pending effect, returning how many were pending
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.lock().entries.drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.handle.abort();
        }
        drained.len()
    }

    /// Whether `gate` still owns its id
    #[must_use]
    pub fn is_current(&self, gate: &Gate) -> bool {
        self.lock()
            .entries
            .get(&gate.id)
            .is_some_and(|entry| entry.generation == gate.generation)
    }

    /// Deregister a finished task
    ///
    /// Only removes the entry if it still belongs to `gate`; a newer effect
    /// registered under the same id is left untouched.
    pub fn complete(&self, gate: &Gate) -> bool {
        let mut inner = self.lock();
        let owned = inner
            .entries
            .get(&gate.id)
            .is_some_and(|entry| entry.generation == gate.generation);
        if owned {
            inner.entries.remove(&gate.id);
        }
        owned
    }

    /// Whether an effect is pending under `id`
    #[must_use]
    pub fn contains(&self, id: &EffectId) -> bool {
        self.lock().entries.contains_key(id)
    }

    /// Ids of all pending effects, sorted
    #[must_use]
    pub fn pending(&self) -> Vec<EffectId> {
        let mut ids: Vec<EffectId> = self.lock().entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of pending effects
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no effect is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_task() {
        let registry = CancellationRegistry::new();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        registry.spawn(EffectId::new("t"), move |_gate| async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
        });

        assert!(registry.contains(&EffectId::new("t")));
        assert!(registry.cancel(&EffectId::new("t")));
        assert!(!registry.cancel(&EffectId::new("t")));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fired.load(Ordering::SeqCst));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_invalidates_old_gate() {
        let registry = CancellationRegistry::new();
        let id = EffectId::new("same");

        let (tx, rx) = tokio::sync::oneshot::channel();
        let replaced = registry.spawn(id.clone(), move |gate| async move {
            let _ = tx.send(gate);
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert!(!replaced);
        let old_gate = rx.await.unwrap_or_else(|_| unreachable!("task sends its gate"));

        let replaced = registry.spawn(id.clone(), |_gate| async {});
        assert!(replaced);

        assert!(!registry.is_current(&old_gate));
        // The stale gate must not deregister the newer entry.
        assert!(!registry.complete(&old_gate));
        assert_eq!(registry.pending(), vec![id]);
    }

    #[tokio::test]
    async fn test_complete_removes_own_entry() {
        let registry = CancellationRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        registry.spawn(EffectId::new("done"), move |gate| async move {
            let _ = tx.send(gate);
        });
        let gate = rx.await.unwrap_or_else(|_| unreachable!("task sends its gate"));

        assert!(registry.is_current(&gate));
        assert!(registry.complete(&gate));
        assert!(!registry.is_current(&gate));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let registry = CancellationRegistry::new();
        for name in ["a", "b", "c"] {
            registry.spawn(EffectId::new(name), |_gate| std::future::pending::<()>());
        }
        assert_eq!(registry.pending().len(), 3);
        assert_eq!(registry.cancel_all(), 3);
        assert!(registry.is_empty());
    }
}
