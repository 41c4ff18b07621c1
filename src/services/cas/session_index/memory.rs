//! Process-local session index store.
//!
//! Fine for a single instance. With several instances behind a load balancer the
//! CAS logout push can land on a process that never saw the sign-in; use the
//! Valkey backend there.
//!
//! Records expire with the local session they point at. Expired records are
//! purged on every `put`, so signed-in users who never sign out (and never get
//! a logout push) do not accumulate.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::store::{SessionIndexStore, StoreFuture};
use crate::services::cas::SessionIndex;
use crate::services::session::LocalSessionId;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct Record {
    session_id: LocalSessionId,
    registered_at: Instant,
}

#[derive(Debug)]
pub struct MemorySessionIndexStore {
    records: DashMap<SessionIndex, Record>,
    ttl: Duration,
}

impl MemorySessionIndexStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
        }
    }

    /// Drop records older than the TTL.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.records.retain(|_, record| record.registered_at.elapsed() <= ttl);
    }

    /// Number of records currently held (including expired ones not yet purged).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn live(&self, record: &Record) -> bool {
        record.registered_at.elapsed() <= self.ttl
    }
}

impl Default for MemorySessionIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIndexStore for MemorySessionIndexStore {
    fn put<'a>(
        &'a self,
        index: &'a SessionIndex,
        session_id: &'a LocalSessionId,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.purge_expired();
            self.records.insert(
                index.clone(),
                Record {
                    session_id: session_id.clone(),
                    registered_at: Instant::now(),
                },
            );
            Ok(())
        })
    }

    fn get<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>> {
        Box::pin(async move {
            Ok(self
                .records
                .get(index)
                .filter(|record| self.live(record))
                .map(|record| record.session_id.clone()))
        })
    }

    fn delete<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>> {
        // DashMap::remove takes the shard write lock, so exactly one concurrent caller
        // gets `Some`.
        Box::pin(async move {
            Ok(self
                .records
                .remove(index)
                .filter(|(_, record)| self.live(record))
                .map(|(_, record)| record.session_id))
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
