use std::{future::Future, pin::Pin};

use crate::services::cache::CacheError;
use crate::services::cas::SessionIndex;
use crate::services::session::LocalSessionId;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionIndexError>> + Send + 'a>>;

/// CAS session index → local session id correlation.
///
/// Absence is a normal outcome on every operation, never an error:
/// - `get`    => `Ok(None)` when nothing is registered
/// - `delete` => `Ok(Some(id))` for the caller that removed the record,
///   `Ok(None)` when it was already gone (duplicate logout push, earlier sign-out)
/// - `Err(_)` => backend failure only
///
/// The store must be visible to every request handler (and, for the Valkey
/// backend, every process), not just the one that registered the record.
pub trait SessionIndexStore: Send + Sync {
    // Register (or replace) the record for `index`. At most one record exists per index.
    fn put<'a>(&'a self, index: &'a SessionIndex, session_id: &'a LocalSessionId)
    -> StoreFuture<'a, ()>;

    fn get<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>>;

    // Remove the record and return what was removed.
    fn delete<'a>(&'a self, index: &'a SessionIndex) -> StoreFuture<'a, Option<LocalSessionId>>;

    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionIndexError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}
