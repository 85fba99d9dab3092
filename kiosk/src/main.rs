//! Queue kiosk demo
//!
//! Drives a scripted morning at the kiosk through [`TicketQueueStore`]:
//! customers draw tickets, counters open, call and finish, one counter
//! closes mid-service. Prints the status board as JSON at the end.
//!
//! Run with: cargo run --bin queue-kiosk
//! Settings: `KIOSK_LOG`, `KIOSK_BROADCAST_CAPACITY`, `KIOSK_SHUTDOWN_TIMEOUT_SECS`,
//! `KIOSK_METRICS`

use queue_kiosk_core::environment::SystemClock;
use queue_kiosk_runtime::metrics::MetricsRecorder;
use ticket_queue::{CounterId, CounterTransition, KioskConfig, ServeOutcome, TicketQueueStore};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = KioskConfig::from_env();

    init_tracing(&config);

    info!(
        broadcast_capacity = config.broadcast_capacity,
        shutdown_timeout_secs = config.shutdown_timeout_secs,
        "Starting queue kiosk"
    );

    let recorder = if config.metrics_enabled {
        Some(MetricsRecorder::install()?)
    } else {
        None
    };

    let kiosk = TicketQueueStore::with_config(SystemClock, &config);
    let counter_1 = CounterId::new(1);
    let counter_2 = CounterId::new(2);
    let counter_3 = CounterId::new(3);

    // Morning rush: five customers, issued concurrently
    let mut takers = Vec::new();
    for _ in 0..5 {
        let kiosk = kiosk.clone();
        takers.push(tokio::spawn(async move { kiosk.issue_ticket().await }));
    }
    for taker in takers {
        let ticket = taker.await??;
        info!(%ticket, "Customer took a ticket");
    }

    // Counter 3 stays closed today
    kiosk.set_counter_online(counter_3, false).await?;

    for counter in [counter_1, counter_2, counter_3] {
        match kiosk.serve_next(counter).await? {
            ServeOutcome::Called { ticket } => info!(%counter, %ticket, "Please proceed"),
            ServeOutcome::Skipped { reason } => info!(%counter, %reason, "Nobody called"),
        }
    }

    kiosk.complete_service(counter_1).await?;
    kiosk.serve_next(counter_1).await?;

    // Counter 2 closes while still serving
    if let CounterTransition::WentOffline {
        abandoned: Some(ticket),
    } = kiosk.toggle_counter(counter_2).await?
    {
        warn!(%ticket, "Ticket abandoned at closing counter");
    }

    let board = kiosk.snapshot().await;
    println!("{board}");
    println!("{}", board.to_json()?);

    if let Some(text) = recorder.as_ref().and_then(MetricsRecorder::render) {
        println!("{text}");
    }

    kiosk.shutdown().await?;
    info!("Queue kiosk stopped");

    Ok(())
}

fn init_tracing(config: &KioskConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
