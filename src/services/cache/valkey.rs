use std::time::Duration;

use async_trait::async_trait;
use redis::FromRedisValue;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Valkey/Redis cache client over a multiplexed `ConnectionManager`.
///
/// `GETDEL` needs Redis >= 6.2 or any Valkey release.
#[derive(Clone, Debug)]
pub struct ValkeyClient {
    manager: redis::aio::ConnectionManager,
}

impl ValkeyClient {
    // `redis://localhost:6379`, `rediss://...` for TLS
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let manager = redis::Client::open(url)
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        Ok(Self { manager })
    }

    async fn run<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> CacheResult<T> {
        // ConnectionManager clones share one multiplexed connection.
        let mut conn = self.manager.clone();
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.run(redis::cmd("GET").arg(key)).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // EX takes whole seconds; zero would be rejected.
        let seconds = ttl.as_secs().max(1);
        self.run(redis::cmd("SET").arg(key).arg(value).arg("EX").arg(seconds))
            .await
    }

    async fn get_del(&self, key: &str) -> CacheResult<Option<String>> {
        self.run(redis::cmd("GETDEL").arg(key)).await
    }
}
