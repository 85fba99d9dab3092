//! Integration tests for Store action broadcasting
//!
//! Request-response callers get their result actions straight back from
//! `send_and_collect`; the broadcast carries the same actions to observers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use queue_kiosk_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use queue_kiosk_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Take a number, tagged with a correlation id
    Take { request: u64 },
    /// Number handed out (terminal action)
    Taken { request: u64, number: u32 },
    /// Call a number after a short delay
    CallLater { request: u64 },
    /// Number was called (terminal action)
    Called { request: u64, number: Option<u32> },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    last: u32,
    waiting: Vec<u32>,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
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
            TestAction::Take { request } => {
                state.last += 1;
                state.waiting.push(state.last);
                smallvec![Effect::emit(TestAction::Taken {
                    request,
                    number: state.last,
                })]
            },
            TestAction::CallLater { request } => {
                let number = if state.waiting.is_empty() {
                    None
                } else {
                    Some(state.waiting.remove(0))
                };
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(TestAction::Called { request, number })
                }))]
            },
            TestAction::Taken { .. } | TestAction::Called { .. } => smallvec![Effect::None],
        }
    }
}

fn test_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(64),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_send_and_collect_immediate() {
    let store = test_store();

    let results = store
        .send_and_collect(TestAction::Take { request: 1 })
        .await
        .unwrap();

    assert_eq!(results, vec![TestAction::Taken { request: 1, number: 1 }]);
}

#[tokio::test]
async fn test_send_and_collect_delayed() {
    let store = test_store();
    store.send_and_collect(TestAction::Take { request: 1 }).await.unwrap();

    let results = store
        .send_and_collect(TestAction::CallLater { request: 2 })
        .await
        .unwrap();

    assert_eq!(results, vec![TestAction::Called { request: 2, number: Some(1) }]);
    assert!(store.state(|s| s.waiting.is_empty()).await);
}

#[tokio::test]
async fn test_concurrent_callers_beyond_broadcast_capacity() {
    let store = Arc::new(Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(4),
    ));

    let handles: Vec<_> = (1..=100)
        .map(|request| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send_and_collect(TestAction::Take { request }).await })
        })
        .collect();

    let mut numbers = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        let results = handle.await.expect("task panicked").unwrap();
        match results.as_slice() {
            [TestAction::Taken { request, number }] => {
                assert_eq!(*request, index as u64 + 1);
                numbers.push(*number);
            },
            other => panic!("unexpected results {other:?}"),
        }
    }

    // Every caller got its own number, none duplicated
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=100).collect::<Vec<_>>());
    assert_eq!(store.state(|s| s.last).await, 100);
}

#[tokio::test]
async fn test_observers_see_collected_results() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    store.send_and_collect(TestAction::Take { request: 3 }).await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), TestAction::Taken { request: 3, number: 1 });
}

#[tokio::test]
async fn test_initial_actions_not_broadcast() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(TestAction::Take { request: 7 }).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    // Only the effect-produced result arrives, never the command itself
    assert_eq!(
        rx.try_recv().unwrap(),
        TestAction::Taken { request: 7, number: 1 }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_send_and_collect_after_shutdown() {
    let store = test_store();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = store.send_and_collect(TestAction::Take { request: 1 }).await;

    assert_eq!(result.unwrap_err(), StoreError::ShutdownInProgress);
    assert_eq!(store.state(|s| s.last).await, 0);
}
