//! In-memory keyed store.
//!
//! Behaves like the remote store (versions, If-Match, NotFound on read and
//! delete) and additionally counts calls per operation and lets tests inject
//! remote failures per operation or per key.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use plantkeep_core::{CacheableObject, ContainerId, PlantkeepResult, StoreError};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::{KeyedStore, VersionToken};

/// Store operation, for call counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListKeys,
    Exists,
    Read,
    Write,
    Delete,
}

impl StoreOp {
    fn name(&self) -> &'static str {
        match self {
            StoreOp::ListKeys => "list",
            StoreOp::Exists => "exists",
            StoreOp::Read => "read",
            StoreOp::Write => "write",
            StoreOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    value: Value,
    version: u64,
}

/// In-memory store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryKeyedStore {
    objects: DashMap<(ContainerId, String), StoredObject>,
    calls: DashMap<StoreOp, usize>,
    /// `(op, None)` fails every call of `op`; `(op, Some(key))` only that key.
    failures: DashSet<(StoreOp, Option<String>)>,
    next_version: AtomicU64,
}

impl InMemoryKeyedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value without counting a call.
    pub fn insert(&self, container: &ContainerId, key: impl Into<String>, value: Value) {
        let version = self.bump_version();
        self.objects
            .insert((container.clone(), key.into()), StoredObject { value, version });
    }

    /// Seed a typed object under its family key without counting a call.
    pub fn insert_object<T: CacheableObject>(
        &self,
        container: &ContainerId,
        id: &str,
        object: &T,
    ) -> PlantkeepResult<()> {
        let key = T::family().key_for(id);
        let value = serde_json::to_value(object).map_err(|e| StoreError::Codec {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.insert(container, key, value);
        Ok(())
    }

    /// Peek at a stored value without counting a call.
    pub fn get(&self, container: &ContainerId, key: &str) -> Option<Value> {
        self.objects
            .get(&(container.clone(), key.to_string()))
            .map(|entry| entry.value.clone())
    }

    /// Remove a value behind the cache's back, without counting a call.
    pub fn remove(&self, container: &ContainerId, key: &str) -> Option<Value> {
        self.objects
            .remove(&(container.clone(), key.to_string()))
            .map(|(_, stored)| stored.value)
    }

    /// Number of stored objects across all containers.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Calls made for `op` since creation or the last reset.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.get(&op).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Make every call of `op` fail until cleared.
    pub fn fail(&self, op: StoreOp) {
        self.failures.insert((op, None));
    }

    /// Make calls of `op` on `key` fail until cleared.
    pub fn fail_key(&self, op: StoreOp, key: impl Into<String>) {
        self.failures.insert((op, Some(key.into())));
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    fn bump_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn record(&self, op: StoreOp, key: Option<&str>) -> PlantkeepResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;

        let failing = self.failures.contains(&(op, None))
            || key.is_some_and(|k| self.failures.contains(&(op, Some(k.to_string()))));
        if failing {
            return Err(StoreError::Remote {
                operation: op.name().to_string(),
                reason: format!("injected failure for {}", key.unwrap_or("*")),
            }
            .into());
        }
        Ok(())
    }

    fn not_found(container: &ContainerId, key: &str) -> StoreError {
        StoreError::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl KeyedStore for InMemoryKeyedStore {
    async fn list_keys(&self, container: &ContainerId, suffix: &str) -> PlantkeepResult<Vec<String>> {
        self.record(StoreOp::ListKeys, None)?;
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| &entry.key().0 == container && entry.key().1.ends_with(suffix))
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, container: &ContainerId, key: &str) -> PlantkeepResult<Option<VersionToken>> {
        self.record(StoreOp::Exists, Some(key))?;
        Ok(self
            .objects
            .get(&(container.clone(), key.to_string()))
            .map(|entry| VersionToken::new(entry.version.to_string())))
    }

    async fn read(&self, container: &ContainerId, key: &str) -> PlantkeepResult<Value> {
        self.record(StoreOp::Read, Some(key))?;
        self.get(container, key)
            .ok_or_else(|| Self::not_found(container, key).into())
    }

    async fn write(
        &self,
        container: &ContainerId,
        key: &str,
        value: &Value,
        if_match: Option<&VersionToken>,
    ) -> PlantkeepResult<()> {
        self.record(StoreOp::Write, Some(key))?;
        let slot = (container.clone(), key.to_string());

        if let Some(token) = if_match {
            let current = self.objects.get(&slot).map(|entry| entry.version.to_string());
            if current.as_deref() != Some(token.as_str()) {
                return Err(StoreError::PreconditionFailed {
                    key: key.to_string(),
                }
                .into());
            }
        }

        let version = self.bump_version();
        self.objects.insert(
            slot,
            StoredObject {
                value: value.clone(),
                version,
            },
        );
        Ok(())
    }

    async fn delete(&self, container: &ContainerId, key: &str) -> PlantkeepResult<()> {
        self.record(StoreOp::Delete, Some(key))?;
        self.objects
            .remove(&(container.clone(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(container, key).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantkeep_core::PlantkeepError;
    use serde_json::json;

    fn container() -> ContainerId {
        ContainerId::new("4711")
    }

    #[tokio::test]
    async fn test_list_filters_by_container_and_suffix() {
        let store = InMemoryKeyedStore::new();
        store.insert(&container(), "b.plant.config.json", json!({}));
        store.insert(&container(), "a.plant.config.json", json!({}));
        store.insert(&container(), "u1.user.config.json", json!({}));
        store.insert(&ContainerId::new("other"), "c.plant.config.json", json!({}));

        let keys = store.list_keys(&container(), ".plant.config.json").await.unwrap();
        assert_eq!(keys, vec!["a.plant.config.json", "b.plant.config.json"]);
        assert_eq!(store.calls(StoreOp::ListKeys), 1);
    }

    #[tokio::test]
    async fn test_read_and_delete_missing_are_not_found() {
        let store = InMemoryKeyedStore::new();
        let read = store.read(&container(), "nope").await;
        assert!(matches!(read, Err(PlantkeepError::Store(StoreError::NotFound { .. }))));
        let delete = store.delete(&container(), "nope").await;
        assert!(matches!(delete, Err(PlantkeepError::Store(StoreError::NotFound { .. }))));
    }

    #[tokio::test]
    async fn test_if_match_write() {
        let store = InMemoryKeyedStore::new();
        store.insert(&container(), "k", json!(1));
        let token = store.exists(&container(), "k").await.unwrap().unwrap();

        store.write(&container(), "k", &json!(2), Some(&token)).await.unwrap();
        assert_eq!(store.get(&container(), "k"), Some(json!(2)));

        let stale = store.write(&container(), "k", &json!(3), Some(&token)).await;
        assert!(matches!(
            stale,
            Err(PlantkeepError::Store(StoreError::PreconditionFailed { .. }))
        ));
        assert_eq!(store.get(&container(), "k"), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryKeyedStore::new();
        store.insert(&container(), "a", json!(1));
        store.insert(&container(), "b", json!(2));

        store.fail_key(StoreOp::Read, "a");
        assert!(store.read(&container(), "a").await.is_err());
        assert!(store.read(&container(), "b").await.is_ok());

        store.fail(StoreOp::Write);
        let err = store.write(&container(), "b", &json!(3), None).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(store.get(&container(), "b"), Some(json!(2)));

        store.clear_failures();
        assert!(store.read(&container(), "a").await.is_ok());
        assert_eq!(store.calls(StoreOp::Read), 3);
    }
}
