//! String key/value cache seam under the shared session index backend.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Failures talking to the cache.
///
/// Kept apart from `AppError`: sign-in registration fails closed on these,
/// CAS logout pushes only log them.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

/// The three commands session index correlation needs: `SET EX`, `GET`, `GETDEL`.
///
/// Implementations are cloned freely and should hold their connection behind a handle.
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // For log fields.
    fn backend_name(&self) -> &'static str;

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write `value`, replacing any previous one, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Read and remove `key` in one step.
    ///
    /// Of several concurrent callers at most one sees `Some`.
    async fn get_del(&self, key: &str) -> CacheResult<Option<String>>;
}
