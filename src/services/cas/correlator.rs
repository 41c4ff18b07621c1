//! Ties CAS session indexes to local sessions and tears them down on logout pushes.
//!
//! Sign-in:  validated ticket → local session created → `register(index, session_id)`
//! Sign-out: CAS push → `handle_notification` → claim record → destroy session
//!
//! Claiming removes the record, so of several identical pushes handled at the
//! same time only one reaches the session store.
//!
//! Nothing on the notification path returns an error. The CAS server only needs
//! a successful HTTP acknowledgement, and it retries pushes, so every failure
//! mode here is logged and folded into an `SloOutcome`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::services::cas::session_index::{SessionIndexError, SessionIndexStore};
use crate::services::cas::{SessionIndex, slo_parser};
use crate::services::session::{LocalSessionId, SessionStore};

/// Maps a session index to the key of the local session store.
#[async_trait]
pub trait SessionIndexResolver: Send + Sync {
    async fn resolve(
        &self,
        index: &SessionIndex,
    ) -> Result<Option<LocalSessionId>, SessionIndexError>;

    /// Whether `resolve` removes the record it read. When true, a `Some` is
    /// owned by this caller alone.
    fn claims_record(&self) -> bool {
        false
    }
}

/// Resolves through the session index store (the default), claiming the record.
pub struct StoreResolver {
    store: Arc<dyn SessionIndexStore>,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn SessionIndexStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionIndexResolver for StoreResolver {
    async fn resolve(
        &self,
        index: &SessionIndex,
    ) -> Result<Option<LocalSessionId>, SessionIndexError> {
        self.store.delete(index).await
    }

    fn claims_record(&self) -> bool {
        true
    }
}

/// For session stores keyed by the session index itself.
pub struct IdentityResolver;

#[async_trait]
impl SessionIndexResolver for IdentityResolver {
    async fn resolve(
        &self,
        index: &SessionIndex,
    ) -> Result<Option<LocalSessionId>, SessionIndexError> {
        Ok(Some(LocalSessionId::new(index.as_str())))
    }
}

/// What happened to one logout notification. The transport answers 200 for all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SloOutcome {
    /// Single sign-out is switched off.
    Disabled,
    /// No session index could be read from the payload.
    Ignored,
    /// Nothing registered for the index: duplicate push or already signed out.
    Unknown { index: SessionIndex },
    /// The record was resolved and removed. `destroyed` is false when the local
    /// session was already gone.
    Destroyed {
        index: SessionIndex,
        session_id: LocalSessionId,
        destroyed: bool,
    },
    /// The session index store or the session store failed; the push is
    /// acknowledged anyway.
    StoreUnavailable { index: SessionIndex },
}

pub struct SessionCorrelator {
    enabled: bool,
    store: Arc<dyn SessionIndexStore>,
    resolver: Arc<dyn SessionIndexResolver>,
    sessions: Arc<dyn SessionStore>,
}

impl SessionCorrelator {
    pub fn new(
        enabled: bool,
        store: Arc<dyn SessionIndexStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let resolver = Arc::new(StoreResolver::new(store.clone()));
        Self {
            enabled,
            store,
            resolver,
            sessions,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SessionIndexResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record which local session a validated ticket produced.
    ///
    /// Call only after the local session exists. No-op when single sign-out is off.
    pub async fn register(
        &self,
        index: &SessionIndex,
        session_id: &LocalSessionId,
    ) -> Result<(), SessionIndexError> {
        if !self.enabled {
            return Ok(());
        }

        self.store.put(index, session_id).await?;
        debug!(
            %index,
            %session_id,
            backend = self.store.backend_name(),
            "registered CAS session index"
        );
        Ok(())
    }

    /// Drop the record of a session that is being signed out locally.
    pub async fn unregister(&self, index: &SessionIndex) -> Option<LocalSessionId> {
        if !self.enabled {
            return None;
        }

        match self.store.delete(index).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(%index, error = %err, "failed to remove CAS session index on sign-out");
                None
            }
        }
    }

    /// Process a single-sign-out push from the CAS server.
    pub async fn handle_notification(
        &self,
        content_type: Option<&str>,
        is_post: bool,
        raw_body: &str,
    ) -> SloOutcome {
        if !self.enabled {
            warn!("Ignoring CAS single-sign-out request as feature is not currently enabled.");
            return SloOutcome::Disabled;
        }

        let Some(index) = slo_parser::parse(content_type, is_post, raw_body) else {
            warn!(
                "Ignoring CAS single-sign-out request as no session index could be parsed from the parameters."
            );
            return SloOutcome::Ignored;
        };

        debug!(%index, "Intercepted single-sign-out request for CAS session");

        let session_id = match self.resolver.resolve(&index).await {
            Ok(Some(session_id)) => session_id,
            Ok(None) => {
                debug!(%index, "no local session registered for CAS session index");
                return SloOutcome::Unknown { index };
            }
            Err(err) => {
                warn!(%index, error = %err, "session index lookup failed");
                return SloOutcome::StoreUnavailable { index };
            }
        };

        let destroyed = match self.sessions.destroy_by_id(&session_id).await {
            Ok(destroyed) => destroyed,
            Err(err) => {
                warn!(%session_id, %index, error = %err, "failed to destroy local session");
                // Put the claimed record back so a CAS retry can find the session.
                if self.resolver.claims_record() {
                    if let Err(err) = self.store.put(&index, &session_id).await {
                        warn!(%index, error = %err, "failed to restore CAS session index");
                    }
                }
                return SloOutcome::StoreUnavailable { index };
            }
        };
        if destroyed {
            info!(%session_id, %index, "destroyed local session for CAS single-sign-out");
        } else {
            debug!(%session_id, %index, "local session was already gone");
        }

        // Resolvers that only read leave the record behind; remove it regardless
        // of whether the session was still alive.
        if !self.resolver.claims_record() {
            if let Err(err) = self.store.delete(&index).await {
                warn!(%index, error = %err, "failed to delete CAS session index");
            }
        }

        SloOutcome::Destroyed {
            index,
            session_id,
            destroyed,
        }
    }
}
