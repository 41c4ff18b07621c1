//! In-memory local session store.
//!
//! Uses `DashMap` for concurrent access without external locks.
//! Sessions expire after `max_age` (default: 1 day). Expired sessions are
//! dropped when read, and all of them are purged whenever a session is created.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;

use super::store::{LocalSession, LocalSessionId, SessionResult, SessionStore};
use crate::services::cas::CasPrincipal;

pub struct MemorySessionStore {
    sessions: DashMap<LocalSessionId, LocalSession>,
    max_age: Duration,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_max_age(Duration::days(1))
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_age,
        }
    }

    pub fn purge_expired(&self) {
        let now = Utc::now();
        let max_age = self.max_age;
        self.sessions
            .retain(|_, session| now - session.created_at <= max_age);
    }

    /// Number of sessions currently stored (including expired ones not yet purged).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn expired(&self, session: &LocalSession) -> bool {
        Utc::now() - session.created_at > self.max_age
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        principal: CasPrincipal,
        service_ticket: &str,
    ) -> SessionResult<LocalSessionId> {
        self.purge_expired();

        let id = LocalSessionId::generate();
        let session = LocalSession {
            id: id.clone(),
            principal,
            service_ticket: service_ticket.to_string(),
            created_at: Utc::now(),
        };
        self.sessions.insert(id.clone(), session);

        tracing::debug!(session_id = %id, "local session created");
        Ok(id)
    }

    async fn get(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>> {
        let Some(entry) = self.sessions.get(id) else {
            return Ok(None);
        };

        if self.expired(entry.value()) {
            drop(entry); // Release the read lock before removing
            self.sessions.remove(id);
            return Ok(None);
        }

        Ok(Some(entry.value().clone()))
    }

    async fn take(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>> {
        Ok(self.sessions.remove(id).map(|(_, session)| session))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
