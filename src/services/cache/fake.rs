//! In-process stand-in for Valkey used by store tests.
//! Records the TTL each key was written with; `fail` turns every call into a connection error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone, Default)]
pub struct FakeCache {
    pub entries: Arc<Mutex<HashMap<String, (String, Duration)>>>,
    pub fail: bool,
}

impl FakeCache {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> CacheResult<()> {
        if self.fail {
            return Err(CacheError::BackendConnection("down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheClient for FakeCache {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn get_del(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).map(|(v, _)| v))
    }
}
