use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::cache::CacheError;
use crate::services::cas::CasPrincipal;

/// Opaque identifier of a local application session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalSessionId(String);

impl LocalSessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocalSessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A signed-in local session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSession {
    pub id: LocalSessionId,
    pub principal: CasPrincipal,
    // The service ticket this session was created from. Client apps use it as an
    // API access key, and sign-out uses it to drop the session index record.
    pub service_ticket: String,
    pub created_at: DateTime<Utc>,
}

pub type SessionResult<T> = Result<T, SessionStoreError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("stored session is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Local session store.
///
/// The CAS binding needs four things from it: create a session after a ticket
/// is validated, look one up from the cookie, take one out on sign-out, and
/// destroy one by id when the CAS server pushes a logout.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(
        &self,
        principal: CasPrincipal,
        service_ticket: &str,
    ) -> SessionResult<LocalSessionId>;

    // `Ok(None)` when the session does not exist or has expired.
    async fn get(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>>;

    // Remove the session and return it, expired or not. Of several concurrent
    // callers at most one gets `Some`.
    async fn take(&self, id: &LocalSessionId) -> SessionResult<Option<LocalSession>>;

    // `true` only for the caller that actually removed the session.
    // Destroying an unknown or already-destroyed session is not an error.
    async fn destroy_by_id(&self, id: &LocalSessionId) -> SessionResult<bool> {
        Ok(self.take(id).await?.is_some())
    }

    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;
}
