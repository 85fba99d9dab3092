//! # Ticket Queue
//!
//! A queue-ticketing kiosk: customers draw sequential numbers, staff at a
//! fixed set of counters call and serve them in arrival order.
//!
//! # Architecture
//!
//! ```text
//!  customer / staff terminals
//!             │
//!             ▼
//!   ┌───────────────────┐   command + RequestId   ┌──────────────────┐
//!   │ TicketQueueStore  │ ──────────────────────▶ │      Store       │
//!   │    (facade)       │ ◀────────────────────── │ (write-locked)   │
//!   └───────────────────┘   result event          └──────────────────┘
//!                                                          │
//!                                                          ▼
//!                                                 ┌──────────────────┐
//!                                                 │TicketQueueReducer│
//!                                                 │ TicketQueueState │
//!                                                 └──────────────────┘
//! ```
//!
//! - [`types`]: identifiers, counters and the [`TicketQueueState`] state machine
//! - [`queue`]: actions, environment and reducer
//! - [`store`]: [`TicketQueueStore`], the async operation surface
//! - [`board`]: [`QueueSnapshot`], the status board read model
//! - [`config`]: [`KioskConfig`], environment-driven settings
//!
//! # Example
//!
//! ```no_run
//! use queue_kiosk_core::environment::SystemClock;
//! use ticket_queue::{CounterId, TicketQueueStore};
//!
//! # async fn run() -> Result<(), ticket_queue::TicketQueueError> {
//! let kiosk = TicketQueueStore::new(SystemClock);
//! let ticket = kiosk.issue_ticket().await?;
//! let called = kiosk.serve_next(CounterId::new(1)).await?;
//! assert_eq!(called.ticket(), Some(ticket));
//! kiosk.complete_service(CounterId::new(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod queue;
pub mod store;
pub mod types;

pub use board::{CounterView, QueueSnapshot};
pub use config::KioskConfig;
pub use queue::{TicketQueueAction, TicketQueueEnvironment, TicketQueueReducer};
pub use store::{TicketQueueError, TicketQueueStore};
pub use types::{
    Counter, CounterId, CounterStatus, CounterTransition, QueueError, RequestId, ServeOutcome,
    SkipReason, TicketNumber, TicketQueueState, COUNTER_IDS,
};
