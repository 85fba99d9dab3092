//! `TicketQueueStore`: the kiosk's operation surface.
//!
//! Each operation allocates a [`RequestId`], sends the matching command to
//! the runtime [`Store`] and picks the result event carrying that id out of
//! the actions its effects produced. Results come back directly, never via
//! the broadcast, so a caller always learns what its command did.
//! The store's write lock serializes every command, so tickets stay unique
//! and the line stays FIFO no matter how many terminals call in at once.

use crate::board::QueueSnapshot;
use crate::config::KioskConfig;
use crate::queue::{TicketQueueAction, TicketQueueEnvironment, TicketQueueReducer};
use crate::types::{
    CounterId, CounterTransition, QueueError, RequestId, ServeOutcome, TicketNumber,
    TicketQueueState,
};
use queue_kiosk_core::environment::Clock;
use queue_kiosk_runtime::{HealthCheck, Store, StoreError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors returned by [`TicketQueueStore`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketQueueError {
    /// The queue rejected the command
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The runtime could not process the command
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The command produced no result event
    #[error("No result for {0}")]
    MissingResult(RequestId),

    /// A result event of the wrong kind arrived for the request
    #[error("Unexpected result for {request}: {action}")]
    UnexpectedResult {
        /// The request that was answered
        request: RequestId,
        /// Debug rendering of the result
        action: String,
    },
}

/// Result alias for [`TicketQueueStore`] operations
pub type Result<T> = std::result::Result<T, TicketQueueError>;

type QueueStore<C> =
    Store<TicketQueueState, TicketQueueAction, TicketQueueEnvironment<C>, TicketQueueReducer<C>>;

/// Injectable, thread-safe ticket queue
///
/// Cheap to clone; clones share the same queue.
pub struct TicketQueueStore<C: Clock + Clone + 'static> {
    store: QueueStore<C>,
    next_request: Arc<AtomicU64>,
}

impl<C: Clock + Clone + 'static> Clone for TicketQueueStore<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            next_request: Arc::clone(&self.next_request),
        }
    }
}

impl<C: Clock + Clone + 'static> TicketQueueStore<C> {
    /// Fresh kiosk (all counters idle, empty line) with default settings
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self::with_config(clock, &KioskConfig::default())
    }

    /// Fresh kiosk with the given settings
    #[must_use]
    pub fn with_config(clock: C, config: &KioskConfig) -> Self {
        Self::with_state(TicketQueueState::new(), clock, config)
    }

    /// Kiosk starting from an existing state
    #[must_use]
    pub fn with_state(state: TicketQueueState, clock: C, config: &KioskConfig) -> Self {
        let store = Store::with_config(
            state,
            TicketQueueReducer::new(),
            TicketQueueEnvironment::new(clock),
            config.store_config(),
        );

        Self {
            store,
            next_request: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Issue the next ticket and put it at the back of the line
    ///
    /// # Errors
    ///
    /// Returns [`TicketQueueError::Store`] if the store is shutting down.
    pub async fn issue_ticket(&self) -> Result<TicketNumber> {
        let request = self.next_request();
        match self.execute(TicketQueueAction::IssueTicket { request }).await? {
            TicketQueueAction::TicketIssued { ticket, .. } => Ok(ticket),
            other => Err(unexpected(request, &other)),
        }
    }

    /// Open or close a counter
    ///
    /// Closing a counter mid-service drops its ticket; the transition
    /// reports it as `abandoned`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter, or
    /// [`TicketQueueError::Store`] if the store cannot process the command.
    pub async fn set_counter_online(
        &self,
        counter: CounterId,
        online: bool,
    ) -> Result<CounterTransition> {
        let request = self.next_request();
        let action = TicketQueueAction::SetCounterOnline {
            request,
            counter,
            online,
        };
        transition_from(request, self.execute(action).await?)
    }

    /// Flip a counter between open and closed
    ///
    /// # Errors
    ///
    /// Same as [`set_counter_online`](Self::set_counter_online).
    pub async fn toggle_counter(&self, counter: CounterId) -> Result<CounterTransition> {
        let request = self.next_request();
        let action = TicketQueueAction::ToggleCounter { request, counter };
        transition_from(request, self.execute(action).await?)
    }

    /// Call the head of the line to a counter
    ///
    /// An empty line, a closed counter or a busy counter is reported as
    /// [`ServeOutcome::Skipped`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter, or
    /// [`TicketQueueError::Store`] if the store cannot process the command.
    pub async fn serve_next(&self, counter: CounterId) -> Result<ServeOutcome> {
        let request = self.next_request();
        match self.execute(TicketQueueAction::ServeNext { request, counter }).await? {
            TicketQueueAction::TicketCalled { ticket, .. } => Ok(ServeOutcome::Called { ticket }),
            TicketQueueAction::ServeNextSkipped { reason, .. } => {
                Ok(ServeOutcome::Skipped { reason })
            },
            other => Err(unexpected(request, &other)),
        }
    }

    /// Finish with the counter's current customer
    ///
    /// Returns the finished ticket, or `None` if the counter was not serving.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter, or
    /// [`TicketQueueError::Store`] if the store cannot process the command.
    pub async fn complete_service(&self, counter: CounterId) -> Result<Option<TicketNumber>> {
        let request = self.next_request();
        match self
            .execute(TicketQueueAction::CompleteService { request, counter })
            .await?
        {
            TicketQueueAction::ServiceCompleted { ticket, .. } => Ok(Some(ticket)),
            TicketQueueAction::CompletionSkipped { .. } => Ok(None),
            other => Err(unexpected(request, &other)),
        }
    }

    /// Current status board
    pub async fn snapshot(&self) -> QueueSnapshot {
        self.store.state(QueueSnapshot::from_state).await
    }

    /// Read the queue state through a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&TicketQueueState) -> T,
    {
        self.store.state(f).await
    }

    /// Subscribe to every result event
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TicketQueueAction> {
        self.store.subscribe_actions()
    }

    /// Health of the underlying store
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        self.store.health()
    }

    /// Stop accepting operations and wait for in-flight results
    ///
    /// Uses the configured shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if results are still pending
    /// when the timeout expires.
    pub async fn shutdown(&self) -> std::result::Result<(), StoreError> {
        self.store
            .shutdown(self.store.default_shutdown_timeout())
            .await
    }

    fn next_request(&self) -> RequestId {
        RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    #[tracing::instrument(skip(self, action), fields(request = %action.request()))]
    async fn execute(&self, action: TicketQueueAction) -> Result<TicketQueueAction> {
        let request = action.request();
        let result = self
            .store
            .send_and_collect(action)
            .await?
            .into_iter()
            .find(|a| a.answers(request))
            .ok_or(TicketQueueError::MissingResult(request))?;

        match result {
            TicketQueueAction::CounterNotFound { counter, .. } => {
                Err(QueueError::CounterNotFound(counter).into())
            },
            result => Ok(result),
        }
    }
}

fn transition_from(request: RequestId, action: TicketQueueAction) -> Result<CounterTransition> {
    match action {
        TicketQueueAction::CounterWentOnline { .. } => Ok(CounterTransition::WentOnline),
        TicketQueueAction::CounterWentOffline { abandoned, .. } => {
            Ok(CounterTransition::WentOffline { abandoned })
        },
        TicketQueueAction::CounterUnchanged { online, .. } => {
            Ok(CounterTransition::Unchanged { online })
        },
        other => Err(unexpected(request, &other)),
    }
}

fn unexpected(request: RequestId, action: &TicketQueueAction) -> TicketQueueError {
    tracing::error!(%request, ?action, "Result event does not match command");
    TicketQueueError::UnexpectedResult {
        request,
        action: format!("{action:?}"),
    }
}
