//! Carries the last-arriving service ticket of one authentication attempt.
//!
//! During sign-up the CAS server may bounce the browser through the service
//! endpoint more than once, delivering a short-lived proxy ticket first and the
//! real service ticket last. Client apps need the service ticket (it is the
//! session index of later logout pushes and doubles as an API access key), so
//! the relay always hands out the most recently written value.
//!
//! Slots are keyed by `AttemptId`, never shared between concurrent sign-ins.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::services::cas::AttemptId;

#[derive(Debug)]
pub struct TicketRelay {
    slots: DashMap<AttemptId, PendingTicket>,
    ttl: Duration,
}

#[derive(Debug)]
struct PendingTicket {
    ticket: String,
    written_at: Instant,
}

impl TicketRelay {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    /// Record `ticket` for `attempt`, replacing any earlier ticket of the same attempt.
    pub fn set(&self, attempt: &AttemptId, ticket: impl Into<String>) {
        self.purge_expired();
        self.slots.insert(
            attempt.clone(),
            PendingTicket {
                ticket: ticket.into(),
                written_at: Instant::now(),
            },
        );
    }

    /// Consume the pending ticket of `attempt`. A second `take` without an
    /// intervening `set` returns `None`.
    pub fn take(&self, attempt: &AttemptId) -> Option<String> {
        let (_, pending) = self.slots.remove(attempt)?;
        if pending.written_at.elapsed() > self.ttl {
            tracing::debug!(attempt = attempt.as_str(), "pending ticket expired");
            return None;
        }
        Some(pending.ticket)
    }

    /// Drop slots older than the TTL (abandoned sign-ins).
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.slots.retain(|_, pending| pending.written_at.elapsed() <= ttl);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
