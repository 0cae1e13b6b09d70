//! Remote keyed store contract.
//!
//! Implementations are already-authenticated clients of the platform's file
//! store. Pagination, retries and token refresh are their business; callers
//! see one call per operation and the original error on failure.

use async_trait::async_trait;
use plantkeep_core::{ContainerId, PlantkeepResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque version of a stored object, used for If-Match writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-tenant container key-value file store.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// All keys in `container` ending with `suffix`, in store order.
    async fn list_keys(&self, container: &ContainerId, suffix: &str) -> PlantkeepResult<Vec<String>>;

    /// Version token of `key`, or `None` if it does not exist.
    async fn exists(&self, container: &ContainerId, key: &str) -> PlantkeepResult<Option<VersionToken>>;

    /// Parsed content of `key`. Fails with `StoreError::NotFound` if absent.
    async fn read(&self, container: &ContainerId, key: &str) -> PlantkeepResult<Value>;

    /// Create or replace `key`. With `if_match`, the write only succeeds when
    /// the stored version equals the token.
    async fn write(
        &self,
        container: &ContainerId,
        key: &str,
        value: &Value,
        if_match: Option<&VersionToken>,
    ) -> PlantkeepResult<()>;

    /// Remove `key`. Fails with `StoreError::NotFound` if absent.
    async fn delete(&self, container: &ContainerId, key: &str) -> PlantkeepResult<()>;
}
