//! Status board read model.
//!
//! [`QueueSnapshot`] is what the kiosk screens render: the last issued
//! number, the number now being served, the waiting line and every counter.

use crate::types::{CounterId, TicketNumber, TicketQueueState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One counter as shown on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterView {
    /// Counter id
    pub id: CounterId,
    /// Whether staff have the counter open
    pub online: bool,
    /// Ticket at the counter, if any
    pub current_ticket: Option<TicketNumber>,
    /// Whether the counter is handling a customer
    pub serving: bool,
}

/// Point-in-time view of the whole queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Highest ticket number issued so far (0 before the first)
    pub last_issued: u64,
    /// Last ticket called to any counter
    pub now_serving: Option<TicketNumber>,
    /// Waiting tickets, oldest first
    pub waiting: Vec<TicketNumber>,
    /// Counters in id order
    pub counters: Vec<CounterView>,
}

impl QueueSnapshot {
    /// Capture the board from queue state
    #[must_use]
    pub fn from_state(state: &TicketQueueState) -> Self {
        Self {
            last_issued: state.last_issued(),
            now_serving: state.now_serving(),
            waiting: state.waiting().collect(),
            counters: state
                .counters()
                .map(|counter| CounterView {
                    id: counter.id(),
                    online: counter.is_online(),
                    current_ticket: counter.current_ticket(),
                    serving: counter.is_serving(),
                })
                .collect(),
        }
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of open counters
    #[must_use]
    pub fn online_counters(&self) -> usize {
        self.counters.iter().filter(|c| c.online).count()
    }
}

impl From<&TicketQueueState> for QueueSnapshot {
    fn from(state: &TicketQueueState) -> Self {
        Self::from_state(state)
    }
}

impl fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.now_serving {
            Some(ticket) => writeln!(f, "Now serving: {ticket}")?,
            None => writeln!(f, "Now serving: -")?,
        }
        writeln!(f, "Last issued: {}", self.last_issued)?;

        let waiting: Vec<String> = self.waiting.iter().map(ToString::to_string).collect();
        writeln!(f, "Waiting ({}): [{}]", waiting.len(), waiting.join(", "))?;

        for counter in &self.counters {
            let status = match (counter.online, counter.current_ticket) {
                (false, _) => "offline".to_string(),
                (true, Some(ticket)) => format!("serving {ticket}"),
                (true, None) => "idle".to_string(),
            };
            writeln!(f, "Counter {}: {status}", counter.id)?;
        }
        Ok(())
    }
}
