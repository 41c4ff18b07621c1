use std::{sync::Arc, time::Duration};

use crate::services::{
    cache::{CacheClient, CacheError},
    cas::{
        SessionIndex,
        session_index::store::{SessionIndexError, SessionIndexStore, StoreFuture},
    },
    session::LocalSessionId,
};

pub const DEFAULT_PREFIX: &str = "cas:session_index";

/// Valkey-backed session index store (Redis protocol)
///
/// Paired with the Valkey session store, so a CAS logout push can be handled
/// by any instance. Records carry a TTL equal to the local session lifetime; a
/// record outliving its session would only ever resolve to a dead session id.
#[derive(Clone)]
pub struct ValkeySessionIndexStore<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments
    prefix: String,
    ttl: Duration,
}

impl<C: CacheClient> ValkeySessionIndexStore<C> {
    pub fn new(cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, index: &SessionIndex) -> String {
        format!("{}:{}", self.prefix, index.as_str())
    }
}

impl<C: CacheClient> SessionIndexStore for ValkeySessionIndexStore<C> {
    fn put<'a>(
        &'a self,
        index: &'a SessionIndex,
        session_id: &'a LocalSessionId,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            // SET <key> <session_id> EX <ttl>
            self.cache
                .set_with_ttl(&self.key(index), session_id.as_str(), self.ttl)
                .await?;
            Ok(())
        })
    }

    fn get<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>> {
        Box::pin(async move {
            let value = self.cache.get_string(&self.key(index)).await?;
            session_id(value)
        })
    }

    fn delete<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>> {
        Box::pin(async move {
            // GETDEL: read-and-remove in one round trip, single winner across processes.
            let value = self.cache.get_del(&self.key(index)).await?;
            session_id(value)
        })
    }

    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }
}

// Only `put` writes these keys, and never with an empty id.
fn session_id(value: Option<String>) -> Result<Option<LocalSessionId>, SessionIndexError> {
    match value {
        Some(v) if v.is_empty() => {
            Err(CacheError::InvalidValue("empty session id in session index".into()).into())
        }
        other => Ok(other.map(LocalSessionId::new)),
    }
}
