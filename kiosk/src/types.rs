//! Domain types for the queue kiosk.
//!
//! Identifiers, counters, and [`TicketQueueState`], the ticket-queue state
//! machine. The state methods are the only mutators; the reducer in
//! [`crate::queue`] calls them while the store holds its write lock.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Number printed on a customer's ticket
///
/// Issued sequentially from 1, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(u64);

impl TicketNumber {
    /// Wrap a raw ticket number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw number
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a service counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterId(u8);

impl CounterId {
    /// Wrap a raw counter id
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw id
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation id pairing a command with the result action it produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw request id
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw id
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The kiosk's fixed set of counters
pub const COUNTER_IDS: [CounterId; 4] = [
    CounterId::new(1),
    CounterId::new(2),
    CounterId::new(3),
    CounterId::new(4),
];

// ============================================================================
// Counters
// ============================================================================

/// Where a counter is in its lifecycle
///
/// ```text
/// Offline --set online--> Idle --serve next--> Serving
///    ^                     ^  <--complete-------  |
///    +-----set offline-----+----------------------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CounterStatus {
    /// Closed; holds no ticket
    Offline,
    /// Open and waiting to call a ticket
    Idle,
    /// Open and handling a ticket
    Serving {
        /// Ticket being handled
        ticket: TicketNumber,
    },
}

/// A service point that calls and serves tickets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    id: CounterId,
    status: CounterStatus,
}

impl Counter {
    /// A counter that is online and idle
    #[must_use]
    pub const fn idle(id: CounterId) -> Self {
        Self {
            id,
            status: CounterStatus::Idle,
        }
    }

    /// The counter's id
    #[must_use]
    pub const fn id(&self) -> CounterId {
        self.id
    }

    /// The counter's current status
    #[must_use]
    pub const fn status(&self) -> CounterStatus {
        self.status
    }

    /// Whether the counter is open
    #[must_use]
    pub const fn is_online(&self) -> bool {
        !matches!(self.status, CounterStatus::Offline)
    }

    /// Whether the counter is handling a ticket
    #[must_use]
    pub const fn is_serving(&self) -> bool {
        matches!(self.status, CounterStatus::Serving { .. })
    }

    /// The ticket being handled, if any
    #[must_use]
    pub const fn current_ticket(&self) -> Option<TicketNumber> {
        match self.status {
            CounterStatus::Serving { ticket } => Some(ticket),
            CounterStatus::Offline | CounterStatus::Idle => None,
        }
    }
}

// ============================================================================
// Operation outcomes
// ============================================================================

/// Errors from ticket-queue operations
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueError {
    /// The operation named a counter the kiosk doesn't have
    #[error("Counter {0} not found")]
    CounterNotFound(CounterId),
}

/// Result of changing a counter's availability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum CounterTransition {
    /// Offline counter opened and is idle
    WentOnline,
    /// Counter closed
    WentOffline {
        /// Ticket dropped mid-service; it is not put back in the queue
        abandoned: Option<TicketNumber>,
    },
    /// Counter already had the requested availability
    Unchanged {
        /// The availability it kept
        online: bool,
    },
}

/// Why a serve-next request called nobody
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No tickets are waiting
    QueueEmpty,
    /// The counter is closed
    CounterOffline,
    /// The counter is still handling a ticket
    AlreadyServing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueEmpty => write!(f, "queue is empty"),
            Self::CounterOffline => write!(f, "counter is offline"),
            Self::AlreadyServing => write!(f, "counter is already serving"),
        }
    }
}

/// Result of a serve-next request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ServeOutcome {
    /// The head of the queue was assigned to the counter
    Called {
        /// The ticket now being served
        ticket: TicketNumber,
    },
    /// Nothing changed
    Skipped {
        /// Why nothing changed
        reason: SkipReason,
    },
}

impl ServeOutcome {
    /// The called ticket, if one was called
    #[must_use]
    pub const fn ticket(self) -> Option<TicketNumber> {
        match self {
            Self::Called { ticket } => Some(ticket),
            Self::Skipped { .. } => None,
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Ticket-queue state
///
/// Starts with every counter online and idle, an empty queue and no tickets
/// issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQueueState {
    last_issued: u64,
    now_serving: Option<TicketNumber>,
    waiting: VecDeque<TicketNumber>,
    counters: BTreeMap<CounterId, Counter>,
}

impl TicketQueueState {
    /// Fresh state with the kiosk's fixed counters
    #[must_use]
    pub fn new() -> Self {
        Self::with_counters(COUNTER_IDS)
    }

    /// Fresh state with the given counters, all online and idle
    #[must_use]
    pub fn with_counters(ids: impl IntoIterator<Item = CounterId>) -> Self {
        Self {
            last_issued: 0,
            now_serving: None,
            waiting: VecDeque::new(),
            counters: ids.into_iter().map(|id| (id, Counter::idle(id))).collect(),
        }
    }

    /// Highest ticket number issued so far (0 before the first ticket)
    #[must_use]
    pub const fn last_issued(&self) -> u64 {
        self.last_issued
    }

    /// Last ticket assigned to any counter
    ///
    /// Stays put when that service completes; only the next call replaces it.
    #[must_use]
    pub const fn now_serving(&self) -> Option<TicketNumber> {
        self.now_serving
    }

    /// Waiting tickets, oldest first
    pub fn waiting(&self) -> impl ExactSizeIterator<Item = TicketNumber> + '_ {
        self.waiting.iter().copied()
    }

    /// Number of waiting tickets
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Look up a counter
    #[must_use]
    pub fn counter(&self, id: CounterId) -> Option<&Counter> {
        self.counters.get(&id)
    }

    /// All counters, ordered by id
    pub fn counters(&self) -> impl Iterator<Item = &Counter> + '_ {
        self.counters.values()
    }

    /// Draw the next ticket and put it at the back of the queue
    pub fn issue_ticket(&mut self) -> TicketNumber {
        self.last_issued += 1;
        let ticket = TicketNumber(self.last_issued);
        self.waiting.push_back(ticket);
        ticket
    }

    /// Open or close a counter
    ///
    /// Closing a serving counter drops its ticket; the ticket is not
    /// re-enqueued. Requesting the availability a counter already has
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter.
    pub fn set_counter_online(
        &mut self,
        id: CounterId,
        online: bool,
    ) -> Result<CounterTransition, QueueError> {
        let counter = self.counter_mut(id)?;

        let transition = match (counter.status, online) {
            (CounterStatus::Offline, true) => {
                counter.status = CounterStatus::Idle;
                CounterTransition::WentOnline
            },
            (CounterStatus::Idle, false) => {
                counter.status = CounterStatus::Offline;
                CounterTransition::WentOffline { abandoned: None }
            },
            (CounterStatus::Serving { ticket }, false) => {
                counter.status = CounterStatus::Offline;
                CounterTransition::WentOffline {
                    abandoned: Some(ticket),
                }
            },
            (CounterStatus::Offline, false)
            | (CounterStatus::Idle | CounterStatus::Serving { .. }, true) => {
                CounterTransition::Unchanged { online }
            },
        };

        Ok(transition)
    }

    /// Flip a counter's availability
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter.
    pub fn toggle_counter(&mut self, id: CounterId) -> Result<CounterTransition, QueueError> {
        let online = self.counter_mut(id)?.is_online();
        self.set_counter_online(id, !online)
    }

    /// Call the oldest waiting ticket to a counter
    ///
    /// Does nothing when the queue is empty, or the counter is offline or
    /// already serving.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter.
    pub fn serve_next(&mut self, id: CounterId) -> Result<ServeOutcome, QueueError> {
        let counter = self
            .counters
            .get_mut(&id)
            .ok_or(QueueError::CounterNotFound(id))?;

        let reason = match counter.status {
            CounterStatus::Offline => Some(SkipReason::CounterOffline),
            CounterStatus::Serving { .. } => Some(SkipReason::AlreadyServing),
            CounterStatus::Idle => None,
        };
        if let Some(reason) = reason {
            return Ok(ServeOutcome::Skipped { reason });
        }

        let Some(ticket) = self.waiting.pop_front() else {
            return Ok(ServeOutcome::Skipped {
                reason: SkipReason::QueueEmpty,
            });
        };

        counter.status = CounterStatus::Serving { ticket };
        self.now_serving = Some(ticket);

        Ok(ServeOutcome::Called { ticket })
    }

    /// Finish the counter's current service
    ///
    /// Returns the ticket that was finished, or `None` if the counter was not
    /// serving (in which case nothing changes). `now_serving` is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CounterNotFound`] for an unknown counter.
    pub fn complete_service(&mut self, id: CounterId) -> Result<Option<TicketNumber>, QueueError> {
        let counter = self.counter_mut(id)?;

        let CounterStatus::Serving { ticket } = counter.status else {
            return Ok(None);
        };
        counter.status = CounterStatus::Idle;

        Ok(Some(ticket))
    }

    fn counter_mut(&mut self, id: CounterId) -> Result<&mut Counter, QueueError> {
        self.counters
            .get_mut(&id)
            .ok_or(QueueError::CounterNotFound(id))
    }
}

impl Default for TicketQueueState {
    fn default() -> Self {
        Self::new()
    }
}
