//! # Railbook Core
//!
//! Core traits and types for the Railbook client state architecture.
//!
//! This crate provides the fundamental abstractions the application stores are
//! built from: pure reducers over closed action enums, effect descriptions
//! returned from those reducers, and injectable environment traits.
//!
//! ## Core Concepts
//!
//! - **State**: The record owned by one store (UI settings, booking workflow)
//! - **Action**: Every possible transition, as a closed enum
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (timers, async work, cancellation)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```ignore
//! use railbook_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct PanelState {
//!     open: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum PanelAction {
//!     Toggle,
//! }
//!
//! impl Reducer for PanelReducer {
//!     type State = PanelState;
//!     type Action = PanelAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut PanelState,
//!         action: PanelAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<PanelAction>; 4]> {
//!         match action {
//!             PanelAction::Toggle => state.open = !state.open,
//!         }
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Declarative macros for building effects
mod effect_macros;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state record this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for MenuReducer {
    ///     type State = MenuState;
    ///     type Action = MenuAction;
    ///     type Environment = MenuEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut MenuState,
    ///         action: MenuAction,
    ///         env: &MenuEnvironment,
    ///     ) -> SmallVec<[Effect<MenuAction>; 4]> {
    ///         match action {
    ///             MenuAction::Open => {
    ///                 state.open = true;
    ///                 SmallVec::new()
    ///             }
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed by the runtime
        ///
        /// It must never panic and must not perform I/O.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), composable, and cancellable by id.
pub mod effect {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier for a cancellable effect
    ///
    /// At most one cancellable effect per id is pending at a time in a store.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct EffectId(String);

    impl EffectId {
        /// Create an effect id from any string-like value
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Borrow the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts, auto-expiry)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` so that it can later be cancelled with [`Effect::Cancel`]
        ///
        /// Registering an id that is still pending cancels the earlier effect.
        Cancellable {
            /// Identifier used to cancel the effect
            id: EffectId,
            /// The wrapped effect
            effect: Box<Effect<Action>>,
        },

        /// Cancel the pending cancellable effect with this id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All sources of nondeterminism (time, identifiers) are abstracted behind
/// traits and injected, so tests can construct fully deterministic stores.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of unique identifiers for entities created by a store
    ///
    /// Uniqueness is best-effort: implementations should not hand out the
    /// same id twice within one process lifetime.
    pub trait IdGenerator: Send + Sync {
        /// Produce the next identifier
        fn next_id(&self) -> String;
    }
}
