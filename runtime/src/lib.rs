//! # Railbook Runtime
//!
//! Runtime implementation for the Railbook client state architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling for the application stores.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Cancellation registry**: Tracks pending cancellable effects (timers) by id
//! - **Change notification**: A revision counter bumped after every reduced action
//!
//! ## Example
//!
//! ```ignore
//! use railbook_runtime::Store;
//!
//! let store = Store::new(UiState::default(), UiReducer, environment);
//!
//! // Send an action
//! store.send(UiAction::SetTheme(Theme::Dark)).await?;
//!
//! // Read state
//! let theme = store.state(|s| s.theme).await;
//! ```

use railbook_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Registry of pending cancellable effects
pub mod cancellation;

/// Metric descriptions for the store runtime
pub mod metrics;

use cancellation::{CancellationRegistry, Gate};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects spawned by an action
        #[error("Timeout waiting for effects to complete")]
        Timeout,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(2));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started by
/// that action. Effects produced by feedback actions are not tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Whether every tracked effect has finished
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.effects.load(Ordering::SeqCst) == 0
    }

    /// Wait for all effects to complete
    ///
    /// Cancelled effects count as complete.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs on completion, on panic, and when the task is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

const fn effect_kind<A>(effect: &Effect<A>) -> &'static str {
    match effect {
        Effect::None => "none",
        Effect::Parallel(_) => "parallel",
        Effect::Sequential(_) => "sequential",
        Effect::Delay { .. } => "delay",
        Effect::Future(_) => "future",
        Effect::Cancellable { .. } => "cancellable",
        Effect::Cancel(_) => "cancel",
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Gate, Ordering, Reducer,
        RwLock, StoreConfig, StoreError, effect_kind,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::{broadcast, watch};

    type BoxedRun = Pin<Box<dyn Future<Output = ()> + Send>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Every action is reduced while holding the state write lock, so
    /// reductions are serialized and each one sees the result of the previous.
    /// After each reduction the store bumps its revision counter (see
    /// [`Store::subscribe`]) and broadcasts the action (see
    /// [`Store::subscribe_actions`]).
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        cancellations: CancellationRegistry,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        revision: Arc<watch::Sender<u64>>,
        action_broadcast: broadcast::Sender<A>,
        config: StoreConfig,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                cancellations: CancellationRegistry::new(),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                revision: Arc::new(revision),
                action_broadcast,
                config,
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Notifies subscribers
        /// 4. Executes returned effects before releasing the lock;
        ///    `Effect::Cancel` takes effect immediately, everything else is
        ///    spawned and only runs once the lock is released
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, None).await
        }

        /// Internal send implementation
        ///
        /// `gate` is set for actions produced by a cancellable effect; such
        /// actions are dropped if the effect was cancelled or replaced before
        /// the state lock was acquired.
        async fn send_internal(&self, action: A, gate: Option<Gate>) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            {
                let mut state = self.state.write().await;

                if let Some(gate) = &gate {
                    if !self.cancellations.is_current(gate) {
                        tracing::debug!(effect_id = %gate.id(), "Dropping action from cancelled effect");
                        return Ok(EffectHandle::completed());
                    }
                }

                let observed = action.clone();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
                let _ = self.action_broadcast.send(observed);

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Still under the state lock: cancellations and registrations
                // are ordered with the reduction that produced them.
                for effect in effects {
                    self.execute_effect_internal(effect, &tracking);
                }
            }

            Ok(handle)
        }

        /// Dispatch one effect returned by the reducer
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: &EffectTracking) {
            metrics::counter!("store.effects.executed", "type" => effect_kind(&effect)).increment(1);

            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Cancel(id) => self.cancel_effect(&id),
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.execute_effect_internal(effect, tracking);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    self.spawn_cancellable(id, *effect, Some(tracking.clone()));
                },
                effect => self.spawn_effect(effect, tracking.clone()),
            }
        }

        fn cancel_effect(&self, id: &EffectId) {
            if self.cancellations.cancel(id) {
                tracing::debug!(effect_id = %id, "Cancelled pending effect");
                metrics::counter!("store.effects.cancelled").increment(1);
            }
        }

        fn spawn_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);

            let guard = DecrementGuard(tracking);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let run = self.run_effect(effect, None);

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                run.await;
            });
        }

        fn spawn_cancellable(&self, id: EffectId, effect: Effect<A>, tracking: Option<EffectTracking>) {
            if let Some(tracking) = &tracking {
                tracking.increment();
            }
            self.pending_effects.fetch_add(1, Ordering::SeqCst);

            // Guards are built outside the task so an abort before the first
            // poll still releases them.
            let guard = tracking.map(DecrementGuard);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let store = self.clone();

            let replaced = self.cancellations.spawn(id.clone(), move |gate| async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                store.run_effect(effect, Some(gate.clone())).await;
                store.cancellations.complete(&gate);
            });

            if replaced {
                tracing::debug!(effect_id = %id, "Replaced pending effect with same id");
                metrics::counter!("store.effects.cancelled").increment(1);
            }
        }

        /// Build the future that runs `effect` to completion
        ///
        /// Actions produced along the way are fed back through the store,
        /// gated by `gate` when running inside a cancellable effect.
        fn run_effect(&self, effect: Effect<A>, gate: Option<Gate>) -> BoxedRun {
            let store = self.clone();
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Cancel(id) => store.cancel_effect(&id),
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            store.feed_back(action, gate).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay elapsed after {:?}", duration);
                        store.feed_back(*action, gate).await;
                    },
                    Effect::Parallel(effects) => {
                        let runs: Vec<BoxedRun> = effects
                            .into_iter()
                            .map(|effect| store.run_effect(effect, gate.clone()))
                            .collect();
                        futures::future::join_all(runs).await;
                    },
                    Effect::Sequential(effects) => {
                        let count = effects.len();
                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!("Executing sequential effect {} of {}", idx + 1, count);
                            store.run_effect(effect, gate.clone()).await;
                        }
                    },
                    Effect::Cancellable { id, effect } => store.spawn_cancellable(id, *effect, None),
                }
            })
        }

        async fn feed_back(&self, action: A, gate: Option<Gate>) {
            tracing::trace!("Effect produced an action, sending to store");
            if let Err(error) = self.send_internal(action, gate).await {
                tracing::debug!(%error, "Dropped action produced by effect");
            }
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.notifications.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Clone the current state
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state.read().await.clone()
        }

        /// Subscribe to state changes
        ///
        /// The receiver observes a revision number that increases after every
        /// reduced action, including actions produced by effects.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Current revision number
        #[must_use]
        pub fn revision(&self) -> u64 {
            *self.revision.borrow()
        }

        /// Subscribe to every action reduced by this store
        ///
        /// Receivers only see actions sent after they subscribed. Slow
        /// receivers may observe [`broadcast::error::RecvError::Lagged`].
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Ids of pending cancellable effects, sorted
        #[must_use]
        pub fn pending_cancellables(&self) -> Vec<EffectId> {
            self.cancellations.pending()
        }

        /// Whether a cancellable effect is pending under `id`
        #[must_use]
        pub fn is_pending(&self, id: &EffectId) -> bool {
            self.cancellations.contains(id)
        }

        /// Number of effects still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Whether shutdown has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Gracefully shut down the store
        ///
        /// 1. Stops accepting new actions
        /// 2. Cancels every pending cancellable effect
        /// 3. Waits for the remaining effects to complete
        ///
        /// Calling it again after a successful shutdown returns `Ok(())`.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let cancelled = self.cancellations.cancel_all();
            if cancelled > 0 {
                tracing::debug!(cancelled, "Cancelled pending effects");
                metrics::counter!("store.effects.cancelled").increment(cancelled as u64);
            }

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout: {} effects still running", pending);
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                cancellations: self.cancellations.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                revision: Arc::clone(&self.revision),
                action_broadcast: self.action_broadcast.clone(),
                config: self.config.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
