//! Valkey-backed local session store.
//!
//! Sessions are JSON under `{prefix}:{session_id}` with a TTL of the session
//! max age, so every instance sees the same sessions and a CAS logout push
//! handled by one process signs the user out everywhere.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;

use super::store::{LocalSession, LocalSessionId, SessionResult, SessionStore};
use crate::services::cache::CacheClient;
use crate::services::cas::CasPrincipal;

pub const DEFAULT_PREFIX: &str = "cas:session";

#[derive(Clone)]
pub struct ValkeySessionStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
    max_age: Duration,
}

impl<C: CacheClient> ValkeySessionStore<C> {
    pub fn new(cache: Arc<C>, prefix: impl Into<String>, max_age: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            max_age,
        }
    }

    pub fn key(&self, id: &LocalSessionId) -> String {
        format!("{}:{}", self.prefix, id.as_str())
    }
}

fn decode(value: Option<String>) -> SessionResult<Option<LocalSession>> {
    value
        .map(|json| serde_json::from_str::<LocalSession>(&json))
        .transpose()
        .map_err(Into::into)
}

#[async_trait]
impl<C: CacheClient> SessionStore for ValkeySessionStore<C> {
    async fn create(
        &self,
        principal: CasPrincipal,
        service_ticket: &str,
    ) -> SessionResult<LocalSessionId> {
        let id = LocalSessionId::generate();
        let session = LocalSession {
            id: id.clone(),
            principal,
            service_ticket: service_ticket.to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&session)?;
        self.cache
            .set_with_ttl(&self.key(&id), &json, self.max_age)
            .await?;

        tracing::debug!(session_id = %id, "local session created");
        Ok(id)
    }

    // Expiry is the key TTL.
    async fn get(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>> {
        decode(self.cache.get_string(&self.key(id)).await?)
    }

    async fn take(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>> {
        // GETDEL: single winner across processes.
        decode(self.cache.get_del(&self.key(id)).await?)
    }

    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::fake::FakeCache;
    use crate::services::session::store::SessionStoreError;

    fn store(cache: FakeCache) -> ValkeySessionStore<FakeCache> {
        ValkeySessionStore::new(Arc::new(cache), "test:sess", Duration::from_secs(600))
    }

    #[tokio::test]
    async fn create_writes_json_with_max_age_ttl() {
        let cache = FakeCache::default();
        let store = store(cache.clone());

        let id = store
            .create(CasPrincipal::new("alice"), "ST-1")
            .await
            .unwrap();

        let entries = cache.entries.lock().unwrap();
        let (json, ttl) = entries.get(&format!("test:sess:{id}")).unwrap();
        assert_eq!(*ttl, Duration::from_secs(600));
        let session: LocalSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.principal.user, "alice");
        assert_eq!(session.service_ticket, "ST-1");
    }

    #[tokio::test]
    async fn instances_sharing_a_cache_see_each_others_sessions() {
        let cache = FakeCache::default();
        let a = store(cache.clone());
        let b = store(cache);

        let id = a.create(CasPrincipal::new("alice"), "ST-1").await.unwrap();

        assert!(b.get(&id).await.unwrap().is_some());
        assert!(b.destroy_by_id(&id).await.unwrap());
        assert!(a.get(&id).await.unwrap().is_none());
        assert!(!a.destroy_by_id(&id).await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_session_is_an_error() {
        let cache = FakeCache::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert("test:sess:s-1".into(), ("{not json".into(), Duration::from_secs(1)));
        let store = store(cache);

        let err = store
            .get(&LocalSessionId::from("s-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionStoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn backend_failure_surfaces() {
        let store = store(FakeCache::failing());

        let err = store
            .create(CasPrincipal::new("alice"), "ST-1")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionStoreError::Cache(_)));
    }
}
