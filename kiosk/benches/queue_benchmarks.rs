//! Ticket queue benchmarks
//!
//! - Reducer: one command under the write lock, no runtime
//! - Store: full request/response round trip through `TicketQueueStore`
//!
//! Run with: `cargo bench --bench queue_benchmarks`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use queue_kiosk_core::environment::SystemClock;
use queue_kiosk_core::reducer::Reducer;
use ticket_queue::{
    CounterId, RequestId, TicketQueueAction, TicketQueueEnvironment, TicketQueueReducer,
    TicketQueueState, TicketQueueStore,
};

fn benchmark_state_machine(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_machine");
    group.throughput(Throughput::Elements(1));

    group.bench_function("issue_ticket", |b| {
        let mut state = TicketQueueState::new();
        b.iter(|| black_box(state.issue_ticket()));
    });

    group.bench_function("serve_and_complete", |b| {
        let counter = CounterId::new(1);
        b.iter_batched(
            || {
                let mut state = TicketQueueState::new();
                state.issue_ticket();
                state
            },
            |mut state| {
                black_box(state.serve_next(counter).expect("known counter"));
                black_box(state.complete_service(counter).expect("known counter"));
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_reducer(c: &mut Criterion) {
    let reducer = TicketQueueReducer::<SystemClock>::new();
    let env = TicketQueueEnvironment::new(SystemClock);

    c.bench_function("reducer_issue_ticket", |b| {
        let mut state = TicketQueueState::new();
        b.iter(|| {
            black_box(reducer.reduce(
                &mut state,
                TicketQueueAction::IssueTicket {
                    request: RequestId::new(1),
                },
                &env,
            ))
        });
    });
}

fn benchmark_store_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let kiosk = runtime.block_on(async { TicketQueueStore::new(SystemClock) });

    c.bench_function("store_issue_ticket", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(kiosk.issue_ticket().await.expect("issue ticket"));
        });
    });

    c.bench_function("store_serve_cycle", |b| {
        let counter = CounterId::new(2);
        b.to_async(&runtime).iter(|| async {
            kiosk.issue_ticket().await.expect("issue ticket");
            black_box(kiosk.serve_next(counter).await.expect("serve next"));
            black_box(kiosk.complete_service(counter).await.expect("complete"));
        });
    });
}

criterion_group!(
    benches,
    benchmark_state_machine,
    benchmark_reducer,
    benchmark_store_round_trip
);
criterion_main!(benches);
