//! Ticket-queue reducer.
//!
//! Commands mutate [`TicketQueueState`] synchronously; each one then emits a
//! single result event through an `Effect::Future`. The store broadcasts that
//! event so the caller holding the matching [`RequestId`] can pick it up.
//! Result events are terminal and never touch state.

use crate::types::{
    CounterId, CounterTransition, QueueError, RequestId, ServeOutcome, SkipReason, TicketNumber,
    TicketQueueState,
};
use chrono::{DateTime, Utc};
use queue_kiosk_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Serialize};

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the ticket queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketQueueAction {
    // Commands
    /// A customer draws a ticket
    IssueTicket {
        /// Correlation id
        request: RequestId,
    },

    /// Staff open or close a counter
    SetCounterOnline {
        /// Correlation id
        request: RequestId,
        /// Counter to change
        counter: CounterId,
        /// Requested availability
        online: bool,
    },

    /// Staff flip a counter's availability switch
    ToggleCounter {
        /// Correlation id
        request: RequestId,
        /// Counter to flip
        counter: CounterId,
    },

    /// Staff call the next customer to a counter
    ServeNext {
        /// Correlation id
        request: RequestId,
        /// Calling counter
        counter: CounterId,
    },

    /// Staff finish with the current customer
    CompleteService {
        /// Correlation id
        request: RequestId,
        /// Counter finishing
        counter: CounterId,
    },

    // Events
    /// A ticket was issued and queued
    TicketIssued {
        /// Correlation id
        request: RequestId,
        /// The new ticket
        ticket: TicketNumber,
        /// Queue length after issuing
        waiting: usize,
        /// When it was issued
        issued_at: DateTime<Utc>,
    },

    /// An offline counter opened
    CounterWentOnline {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
        /// When it opened
        at: DateTime<Utc>,
    },

    /// A counter closed
    CounterWentOffline {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
        /// Ticket dropped mid-service, not re-enqueued
        abandoned: Option<TicketNumber>,
        /// When it closed
        at: DateTime<Utc>,
    },

    /// A counter already had the requested availability
    CounterUnchanged {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
        /// Its availability
        online: bool,
    },

    /// A ticket was called to a counter
    TicketCalled {
        /// Correlation id
        request: RequestId,
        /// The calling counter
        counter: CounterId,
        /// The called ticket
        ticket: TicketNumber,
        /// When it was called
        at: DateTime<Utc>,
    },

    /// Serve-next called nobody
    ServeNextSkipped {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
        /// Why nothing happened
        reason: SkipReason,
    },

    /// A counter finished with its ticket
    ServiceCompleted {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
        /// The finished ticket
        ticket: TicketNumber,
        /// When it finished
        at: DateTime<Utc>,
    },

    /// Complete-service on a counter that was not serving
    CompletionSkipped {
        /// Correlation id
        request: RequestId,
        /// The counter
        counter: CounterId,
    },

    /// A command named an unknown counter
    CounterNotFound {
        /// Correlation id
        request: RequestId,
        /// The unknown id
        counter: CounterId,
    },
}

impl TicketQueueAction {
    /// Correlation id carried by every action
    #[must_use]
    pub const fn request(&self) -> RequestId {
        match self {
            Self::IssueTicket { request }
            | Self::SetCounterOnline { request, .. }
            | Self::ToggleCounter { request, .. }
            | Self::ServeNext { request, .. }
            | Self::CompleteService { request, .. }
            | Self::TicketIssued { request, .. }
            | Self::CounterWentOnline { request, .. }
            | Self::CounterWentOffline { request, .. }
            | Self::CounterUnchanged { request, .. }
            | Self::TicketCalled { request, .. }
            | Self::ServeNextSkipped { request, .. }
            | Self::ServiceCompleted { request, .. }
            | Self::CompletionSkipped { request, .. }
            | Self::CounterNotFound { request, .. } => *request,
        }
    }

    /// Whether this is a command (as opposed to a result event)
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::IssueTicket { .. }
                | Self::SetCounterOnline { .. }
                | Self::ToggleCounter { .. }
                | Self::ServeNext { .. }
                | Self::CompleteService { .. }
        )
    }

    /// Whether this is the result event for `request`
    #[must_use]
    pub fn answers(&self, request: RequestId) -> bool {
        !self.is_command() && self.request() == request
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the ticket queue
#[derive(Debug, Clone)]
pub struct TicketQueueEnvironment<C: Clock> {
    /// Clock for event timestamps
    pub clock: C,
}

impl<C: Clock> TicketQueueEnvironment<C> {
    /// Create a new environment with the given clock
    #[must_use]
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the ticket queue
///
/// Generic over the Clock type C to work with any clock implementation.
#[derive(Debug, Clone, Copy)]
pub struct TicketQueueReducer<C> {
    _phantom: std::marker::PhantomData<C>,
}

impl<C> TicketQueueReducer<C> {
    /// Create a new ticket queue reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<C> Default for TicketQueueReducer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TicketQueueReducer<C> {
    fn issue_ticket(
        state: &mut TicketQueueState,
        request: RequestId,
        env: &TicketQueueEnvironment<C>,
    ) -> TicketQueueAction {
        let ticket = state.issue_ticket();
        metrics::counter!("kiosk.tickets.issued").increment(1);
        tracing::info!(%request, %ticket, waiting = state.waiting_len(), "Ticket issued");

        TicketQueueAction::TicketIssued {
            request,
            ticket,
            waiting: state.waiting_len(),
            issued_at: env.clock.now(),
        }
    }

    fn counter_changed(
        request: RequestId,
        counter: CounterId,
        result: Result<CounterTransition, QueueError>,
        env: &TicketQueueEnvironment<C>,
    ) -> TicketQueueAction {
        let transition = match result {
            Ok(transition) => transition,
            Err(error) => return Self::rejected(request, error),
        };

        match transition {
            CounterTransition::WentOnline => {
                tracing::info!(%request, %counter, "Counter online");
                TicketQueueAction::CounterWentOnline {
                    request,
                    counter,
                    at: env.clock.now(),
                }
            },
            CounterTransition::WentOffline { abandoned } => {
                if let Some(ticket) = abandoned {
                    metrics::counter!("kiosk.tickets.abandoned").increment(1);
                    tracing::warn!(
                        %request,
                        %counter,
                        %ticket,
                        "Counter went offline mid-service, ticket dropped"
                    );
                } else {
                    tracing::info!(%request, %counter, "Counter offline");
                }
                TicketQueueAction::CounterWentOffline {
                    request,
                    counter,
                    abandoned,
                    at: env.clock.now(),
                }
            },
            CounterTransition::Unchanged { online } => {
                tracing::debug!(%request, %counter, online, "Counter availability unchanged");
                TicketQueueAction::CounterUnchanged {
                    request,
                    counter,
                    online,
                }
            },
        }
    }

    fn serve_next(
        state: &mut TicketQueueState,
        request: RequestId,
        counter: CounterId,
        env: &TicketQueueEnvironment<C>,
    ) -> TicketQueueAction {
        match state.serve_next(counter) {
            Ok(ServeOutcome::Called { ticket }) => {
                metrics::counter!("kiosk.tickets.called").increment(1);
                tracing::info!(%request, %counter, %ticket, "Ticket called");
                TicketQueueAction::TicketCalled {
                    request,
                    counter,
                    ticket,
                    at: env.clock.now(),
                }
            },
            Ok(ServeOutcome::Skipped { reason }) => {
                tracing::debug!(%request, %counter, %reason, "Nobody called");
                TicketQueueAction::ServeNextSkipped {
                    request,
                    counter,
                    reason,
                }
            },
            Err(error) => Self::rejected(request, error),
        }
    }

    fn complete_service(
        state: &mut TicketQueueState,
        request: RequestId,
        counter: CounterId,
        env: &TicketQueueEnvironment<C>,
    ) -> TicketQueueAction {
        match state.complete_service(counter) {
            Ok(Some(ticket)) => {
                metrics::counter!("kiosk.service.completed").increment(1);
                tracing::info!(%request, %counter, %ticket, "Service completed");
                TicketQueueAction::ServiceCompleted {
                    request,
                    counter,
                    ticket,
                    at: env.clock.now(),
                }
            },
            Ok(None) => {
                tracing::debug!(%request, %counter, "Counter was not serving");
                TicketQueueAction::CompletionSkipped { request, counter }
            },
            Err(error) => Self::rejected(request, error),
        }
    }

    fn rejected(request: RequestId, error: QueueError) -> TicketQueueAction {
        metrics::counter!("kiosk.counter.not_found").increment(1);
        tracing::warn!(%request, %error, "Command rejected");

        match error {
            QueueError::CounterNotFound(counter) => {
                TicketQueueAction::CounterNotFound { request, counter }
            },
        }
    }
}

impl<C: Clock> Reducer for TicketQueueReducer<C> {
    type State = TicketQueueState;
    type Action = TicketQueueAction;
    type Environment = TicketQueueEnvironment<C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let event = match action {
            // ========== Commands ==========
            TicketQueueAction::IssueTicket { request } => Self::issue_ticket(state, request, env),

            TicketQueueAction::SetCounterOnline {
                request,
                counter,
                online,
            } => Self::counter_changed(
                request,
                counter,
                state.set_counter_online(counter, online),
                env,
            ),

            TicketQueueAction::ToggleCounter { request, counter } => {
                Self::counter_changed(request, counter, state.toggle_counter(counter), env)
            },

            TicketQueueAction::ServeNext { request, counter } => {
                Self::serve_next(state, request, counter, env)
            },

            TicketQueueAction::CompleteService { request, counter } => {
                Self::complete_service(state, request, counter, env)
            },

            // ========== Events ==========
            // Already applied when their command was reduced
            TicketQueueAction::TicketIssued { .. }
            | TicketQueueAction::CounterWentOnline { .. }
            | TicketQueueAction::CounterWentOffline { .. }
            | TicketQueueAction::CounterUnchanged { .. }
            | TicketQueueAction::TicketCalled { .. }
            | TicketQueueAction::ServeNextSkipped { .. }
            | TicketQueueAction::ServiceCompleted { .. }
            | TicketQueueAction::CompletionSkipped { .. }
            | TicketQueueAction::CounterNotFound { .. } => return smallvec![Effect::None],
        };

        #[allow(clippy::cast_precision_loss)] // queue lengths stay far below 2^52
        metrics::gauge!("kiosk.queue.length").set(state.waiting_len() as f64);

        smallvec![Effect::emit(event)]
    }
}
