//! Integration tests for Store change notification and action broadcasting
//!
//! Consumers re-render off the revision channel and observers (diagnostics,
//! tests) follow the action stream.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use railbook_core::{SmallVec, effect::Effect, effect::EffectId, reducer::Reducer, smallvec};
use railbook_runtime::{Store, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start a multi-step load
    StartLoad { id: u64 },
    /// One step of the load finished
    StepCompleted { id: u64, step: u32 },
    /// Load finished (terminal action)
    LoadCompleted { id: u64 },
    /// Simple increment command
    Increment,
    /// Dismissable message with an expiry timer
    Flash { id: u64 },
    /// Timer expiry for a flash message
    FlashExpired { id: u64 },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    counter: u32,
    steps: Vec<u32>,
    flashes: Vec<u64>,
}

struct TestEnvironment;

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::StartLoad { id } => {
                state.steps.clear();
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(TestAction::StepCompleted { id, step: 1 })
                }))]
            },
            TestAction::StepCompleted { id, step } => {
                state.steps.push(step);
                if step < 3 {
                    smallvec![Effect::Future(Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Some(TestAction::StepCompleted { id, step: step + 1 })
                    }))]
                } else {
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(TestAction::LoadCompleted { id })
                    }))]
                }
            },
            TestAction::LoadCompleted { .. } => smallvec![Effect::None],
            TestAction::Increment => {
                state.counter += 1;
                smallvec![Effect::None]
            },
            TestAction::Flash { id } => {
                state.flashes.push(id);
                smallvec![
                    Effect::Delay {
                        duration: Duration::from_millis(500),
                        action: Box::new(TestAction::FlashExpired { id }),
                    }
                    .cancellable(EffectId::new(format!("flash:{id}")))
                ]
            },
            TestAction::FlashExpired { id } => {
                state.flashes.retain(|f| *f != id);
                smallvec![Effect::Cancel(EffectId::new(format!("flash:{id}")))]
            },
        }
    }
}

fn new_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment)
}

// ============================================================================
// Tests
// ============================================================================

/// Subscribers receive the dispatched action followed by every action its
/// effects produce, in reduction order.
#[tokio::test(start_paused = true)]
async fn test_subscribe_actions_streaming() {
    let store = Arc::new(new_store());
    let mut rx = store.subscribe_actions();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = Arc::clone(&received);

    let collector = tokio::spawn(async move {
        // StartLoad, StepCompleted(1,2,3), LoadCompleted
        for _ in 0..5 {
            if let Ok(action) = rx.recv().await {
                received_clone.lock().await.push(action);
            }
        }
    });

    store.send(TestAction::StartLoad { id: 100 }).await.ok();
    collector.await.unwrap();

    let actions = received.lock().await;
    assert_eq!(
        *actions,
        vec![
            TestAction::StartLoad { id: 100 },
            TestAction::StepCompleted { id: 100, step: 1 },
            TestAction::StepCompleted { id: 100, step: 2 },
            TestAction::StepCompleted { id: 100, step: 3 },
            TestAction::LoadCompleted { id: 100 },
        ]
    );
    assert_eq!(store.state(|s| s.steps.clone()).await, vec![1, 2, 3]);
}

/// The revision channel wakes waiters once per reduced action.
#[tokio::test]
async fn test_revision_wakes_subscriber() {
    let store = new_store();
    let mut revisions = store.subscribe();

    let waiter = tokio::spawn(async move {
        revisions.changed().await.unwrap();
        *revisions.borrow_and_update()
    });

    store.send(TestAction::Increment).await.unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("subscriber should be woken")
        .unwrap();
    assert!(seen >= 1);
    assert_eq!(store.revision(), 1);
}

/// Slow subscribers skip old actions without blocking the store.
#[tokio::test]
async fn test_lagging_subscriber() {
    let store = Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(4),
    );

    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        store.send(TestAction::Increment).await.ok();
    }

    let mut received = 0;
    let mut lagged = false;

    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => lagged = true,
            Err(
                tokio::sync::broadcast::error::TryRecvError::Empty
                | tokio::sync::broadcast::error::TryRecvError::Closed,
            ) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert_eq!(received, 4);
    assert_eq!(store.state(|s| s.counter).await, 20);
}

/// Multiple subscribers observe the same stream independently.
#[tokio::test]
async fn test_multiple_independent_subscribers() {
    let store = new_store();

    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();

    store.send(TestAction::Increment).await.ok();
    store.send(TestAction::Increment).await.ok();

    for rx in [&mut rx1, &mut rx2] {
        assert_eq!(rx.try_recv().ok(), Some(TestAction::Increment));
        assert_eq!(rx.try_recv().ok(), Some(TestAction::Increment));
        assert!(rx.try_recv().is_err());
    }
}

/// Timer expiry goes through the same stream as user actions, and an expiry
/// cancelled beforehand never shows up.
#[tokio::test(start_paused = true)]
async fn test_expired_timers_are_broadcast_once() {
    let store = new_store();
    let mut rx = store.subscribe_actions();

    store.send(TestAction::Flash { id: 1 }).await.unwrap();
    store.send(TestAction::Flash { id: 2 }).await.unwrap();
    // Manual dismissal of flash 1 before its timer fires.
    store.send(TestAction::FlashExpired { id: 1 }).await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        seen.push(action);
    }

    assert_eq!(
        seen,
        vec![
            TestAction::Flash { id: 1 },
            TestAction::Flash { id: 2 },
            TestAction::FlashExpired { id: 1 },
            TestAction::FlashExpired { id: 2 },
        ]
    );
    assert!(store.state(|s| s.flashes.is_empty()).await);
    assert!(store.pending_cancellables().is_empty());
}
