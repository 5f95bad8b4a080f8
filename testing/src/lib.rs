//! # Railbook Testing
//!
//! Testing utilities and helpers for the Railbook stores.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A recording diagnostics sink for persistence failures
//! - Test helpers for replaying reducers and building storage
//! - Assertion helpers for reducers and their effects
//!
//! ## Example
//!
//! ```ignore
//! use railbook_testing::{SequentialIdGenerator, helpers::memory_storage};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_notification_expires() -> Result<(), AppError> {
//!     let (_backend, storage, _diagnostics) = memory_storage();
//!     let ids = Arc::new(SequentialIdGenerator::new("n"));
//!     let ui = UiStore::open(&storage, document, ids, UiStoreConfig::default()).await?;
//!
//!     ui.add_notification("saved", NotificationOptions::default()).await?;
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     assert!(ui.snapshot().await.notifications.is_empty());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use railbook_core::environment::{Clock, IdGenerator};


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use railbook_storage::{DiagnosticsSink, Operation, PersistenceFailure};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use railbook_testing::mocks::FixedClock;
    /// use railbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `"<prefix>-1"`, `"<prefix>-2"`, ...
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose first id is `"<prefix>-1"`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            format!("{}-{n}", self.prefix)
        }
    }

    /// Hands out a scripted list of ids, then falls back to a sequence
    ///
    /// Scripting the same id twice simulates an id collision.
    #[derive(Debug)]
    pub struct ScriptedIdGenerator {
        script: Mutex<VecDeque<String>>,
        fallback: SequentialIdGenerator,
    }

    impl ScriptedIdGenerator {
        /// Create a generator that returns `ids` in order
        pub fn new<I, S>(ids: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                script: Mutex::new(ids.into_iter().map(Into::into).collect()),
                fallback: SequentialIdGenerator::new("scripted"),
            }
        }
    }

    impl IdGenerator for ScriptedIdGenerator {
        fn next_id(&self) -> String {
            let scripted = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            scripted.unwrap_or_else(|| self.fallback.next_id())
        }
    }

    /// One failure captured by [`RecordingDiagnostics`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedFailure {
        /// Key the operation targeted
        pub key: String,
        /// Operation that failed
        pub operation: Operation,
        /// Rendered error
        pub message: String,
    }

    /// Diagnostics sink that keeps every failure for later assertions
    ///
    /// Clones share the same record.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDiagnostics {
        failures: Arc<Mutex<Vec<RecordedFailure>>>,
    }

    impl RecordingDiagnostics {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every failure recorded so far
        #[must_use]
        pub fn failures(&self) -> Vec<RecordedFailure> {
            self.failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Failures recorded for `key`
        #[must_use]
        pub fn failures_for(&self, key: &str) -> Vec<RecordedFailure> {
            self.failures()
                .into_iter()
                .filter(|failure| failure.key == key)
                .collect()
        }

        /// Whether nothing has been recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
        }
    }

    impl DiagnosticsSink for RecordingDiagnostics {
        fn record(&self, failure: &PersistenceFailure) {
            self.failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedFailure {
                    key: failure.key.clone(),
                    operation: failure.operation,
                    message: failure.error.to_string(),
                });
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use crate::mocks::RecordingDiagnostics;
    use railbook_core::reducer::Reducer;
    use railbook_storage::{DurableStorage, MemoryBackend};
    use std::sync::Arc;

    /// Reduce `actions` in order starting from `initial`, discarding effects
    pub fn replay<R, I>(reducer: &R, env: &R::Environment, initial: R::State, actions: I) -> R::State
    where
        R: Reducer,
        I: IntoIterator<Item = R::Action>,
    {
        let mut state = initial;
        for action in actions {
            let _ = reducer.reduce(&mut state, action, env);
        }
        state
    }

    /// In-memory storage wired to a recording sink
    ///
    /// Returns the backend (to inspect or break it), the storage, and the
    /// recorder.
    #[must_use]
    pub fn memory_storage() -> (MemoryBackend, DurableStorage, RecordingDiagnostics) {
        let backend = MemoryBackend::new();
        let diagnostics = RecordingDiagnostics::new();
        let storage = DurableStorage::new(backend.clone()).with_diagnostics(Arc::new(diagnostics.clone()));
        (backend, storage, diagnostics)
    }
}

// Re-export commonly used items
pub use mocks::{
    FixedClock, RecordingDiagnostics, ScriptedIdGenerator, SequentialIdGenerator, test_clock,
};
