use std::fmt;

use serde::{Deserialize, Serialize};

/// CAS-assigned identifier of one CAS-side login session.
///
/// CAS servers send the service ticket that created the session as the
/// `SessionIndex` of a logout request, so this is usually a `ST-...` string.
/// Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIndex(String);

impl SessionIndex {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionIndex {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of one in-flight authentication attempt (sign-in redirect → ticket return).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptId(String);

impl AttemptId {
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

impl From<&str> for AttemptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
