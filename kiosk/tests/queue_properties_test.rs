//! Property tests for the ticket-queue state machine.
//!
//! Random sequences of kiosk operations are replayed against
//! `TicketQueueState` and a plain model; the invariants are checked after
//! every step.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use ticket_queue::{
    CounterId, CounterStatus, CounterTransition, ServeOutcome, TicketNumber, TicketQueueState,
    COUNTER_IDS,
};

#[derive(Clone, Debug)]
enum Op {
    Issue,
    SetOnline(CounterId, bool),
    Toggle(CounterId),
    ServeNext(CounterId),
    Complete(CounterId),
}

fn counter_id() -> impl Strategy<Value = CounterId> {
    (1u8..=4).prop_map(CounterId::new)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Issue),
        1 => (counter_id(), any::<bool>()).prop_map(|(id, online)| Op::SetOnline(id, online)),
        1 => counter_id().prop_map(Op::Toggle),
        3 => counter_id().prop_map(Op::ServeNext),
        2 => counter_id().prop_map(Op::Complete),
    ]
}

/// Check the invariants that must hold between any two operations
fn check_invariants(state: &TicketQueueState) {
    let waiting: Vec<TicketNumber> = state.waiting().collect();

    // Queue is strictly increasing, so FIFO by number
    assert!(waiting.windows(2).all(|w| w[0] < w[1]));
    assert!(waiting.iter().all(|t| t.value() >= 1 && t.value() <= state.last_issued()));

    let held: Vec<TicketNumber> = state.counters().filter_map(|c| c.current_ticket()).collect();
    let unique: HashSet<_> = held.iter().copied().collect();
    assert_eq!(unique.len(), held.len(), "a ticket is held by two counters");
    assert!(held.iter().all(|t| !waiting.contains(t)), "a held ticket is still waiting");

    for counter in state.counters() {
        if counter.is_serving() {
            assert!(counter.current_ticket().is_some());
        }
        if !counter.is_online() {
            assert!(!counter.is_serving());
            assert_eq!(counter.current_ticket(), None);
        }
    }
}

proptest! {
    #[test]
    fn issued_tickets_are_one_to_n(n in 0usize..200) {
        let mut state = TicketQueueState::new();
        let issued: Vec<u64> = (0..n).map(|_| state.issue_ticket().value()).collect();

        prop_assert_eq!(issued, (1..=n as u64).collect::<Vec<_>>());
        prop_assert_eq!(state.waiting_len(), n);
        prop_assert_eq!(state.last_issued(), n as u64);
    }

    #[test]
    fn random_operations_preserve_invariants(ops in prop::collection::vec(op(), 0..150)) {
        let mut state = TicketQueueState::new();
        let mut model: VecDeque<TicketNumber> = VecDeque::new();
        let mut ever_called: HashSet<TicketNumber> = HashSet::new();

        for op in ops {
            let before = state.clone();

            match op {
                Op::Issue => {
                    let ticket = state.issue_ticket();
                    prop_assert_eq!(ticket.value(), before.last_issued() + 1);
                    model.push_back(ticket);
                },
                Op::SetOnline(id, online) => {
                    let was = before.counter(id).unwrap().status();
                    let transition = state.set_counter_online(id, online).unwrap();
                    match (was, online) {
                        (CounterStatus::Offline, false) | (CounterStatus::Idle | CounterStatus::Serving { .. }, true) => {
                            prop_assert_eq!(&state, &before);
                        },
                        (CounterStatus::Serving { ticket }, false) => {
                            prop_assert_eq!(
                                transition,
                                CounterTransition::WentOffline { abandoned: Some(ticket) }
                            );
                        },
                        _ => {},
                    }
                    prop_assert_eq!(state.counter(id).unwrap().is_online(), online);
                },
                Op::Toggle(id) => {
                    let was_online = before.counter(id).unwrap().is_online();
                    state.toggle_counter(id).unwrap();
                    prop_assert_eq!(state.counter(id).unwrap().is_online(), !was_online);
                },
                Op::ServeNext(id) => match state.serve_next(id).unwrap() {
                    ServeOutcome::Called { ticket } => {
                        // FIFO: always the model's head
                        prop_assert_eq!(Some(ticket), model.pop_front());
                        prop_assert!(ever_called.insert(ticket), "ticket called twice");
                        prop_assert_eq!(state.now_serving(), Some(ticket));
                        prop_assert_eq!(state.counter(id).unwrap().current_ticket(), Some(ticket));
                    },
                    ServeOutcome::Skipped { .. } => {
                        prop_assert_eq!(&state, &before);
                    },
                },
                Op::Complete(id) => {
                    let finished = state.complete_service(id).unwrap();
                    prop_assert_eq!(finished, before.counter(id).unwrap().current_ticket());
                    prop_assert_eq!(state.now_serving(), before.now_serving());
                    if finished.is_none() {
                        prop_assert_eq!(&state, &before);
                    }
                },
            }

            prop_assert_eq!(state.waiting().collect::<Vec<_>>(), model.iter().copied().collect::<Vec<_>>());
            check_invariants(&state);
        }
    }

    #[test]
    fn offline_never_requeues(serving_counter in counter_id(), queued in 1usize..20) {
        let mut state = TicketQueueState::with_counters(COUNTER_IDS);
        for _ in 0..queued {
            state.issue_ticket();
        }
        let called = state.serve_next(serving_counter).unwrap().ticket().unwrap();

        let transition = state.set_counter_online(serving_counter, false).unwrap();

        prop_assert_eq!(transition, CounterTransition::WentOffline { abandoned: Some(called) });
        prop_assert!(!state.waiting().any(|t| t == called));
        prop_assert_eq!(state.waiting_len(), queued - 1);
    }
}
