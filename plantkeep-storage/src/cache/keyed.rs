//! Keyed write-through cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::try_join_all;
use plantkeep_core::{CacheableObject, ContainerId, ObjectFamily, PlantkeepResult, StoreError};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};

use super::stats::{CacheCounters, CacheStats};
use crate::store::{KeyedStore, VersionToken};

/// Cache of one object family in one container.
///
/// Entries live as long as the cache. See the [module docs](super) for the
/// consistency contract.
pub struct KeyedCache<T: CacheableObject> {
    store: Arc<dyn KeyedStore>,
    container: ContainerId,
    entries: RwLock<HashMap<String, T>>,
    /// Held shared by single-id operations and exclusively by `fetch_all`.
    family_lock: RwLock<()>,
    /// Per-id locks serializing miss, write and delete for the same id.
    /// An entry lives only while some task holds or awaits it.
    slots: DashMap<String, Arc<Mutex<()>>>,
    counters: CacheCounters,
}

impl<T: CacheableObject> KeyedCache<T> {
    pub fn new(store: Arc<dyn KeyedStore>, container: ContainerId) -> Self {
        Self {
            store,
            container,
            entries: RwLock::new(HashMap::new()),
            family_lock: RwLock::new(()),
            slots: DashMap::new(),
            counters: CacheCounters::default(),
        }
    }

    pub fn family(&self) -> ObjectFamily {
        T::family()
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    /// Get one object, reading it from the remote store on a miss.
    ///
    /// Returns `Ok(None)` when the object does not exist remotely. Absence is
    /// not cached: the next call probes the store again.
    pub async fn get_one(&self, id: &str) -> PlantkeepResult<Option<T>> {
        if let Some(value) = self.peek(id).await {
            self.counters.hit();
            return Ok(Some(value));
        }

        let _family = self.family_lock.read().await;
        let _slot = self.lock_slot(id).await;

        // Another task may have hydrated the id while we waited.
        if let Some(value) = self.peek(id).await {
            self.counters.hit();
            return Ok(Some(value));
        }
        self.counters.miss();

        let key = self.key(id);
        if self.store.exists(&self.container, &key).await?.is_none() {
            debug!(container = %self.container, key = %key, "object absent remotely");
            return Ok(None);
        }

        let value = self.read_remote(&key).await?;
        self.entries
            .write()
            .await
            .insert(id.to_string(), value.clone());
        debug!(container = %self.container, key = %key, "object hydrated");
        Ok(Some(value))
    }

    /// Hydrate every object of the family listed remotely.
    ///
    /// Ids already cached are not re-read. Entries missing from the listing
    /// are kept. The returned map is the whole cache after hydration.
    ///
    /// Fails fast: the first remote error aborts the call, but entries
    /// hydrated by sibling reads stay cached.
    pub async fn get_all(&self) -> PlantkeepResult<BTreeMap<String, T>> {
        let ids = self.list_ids().await?;
        {
            let _family = self.family_lock.read().await;
            try_join_all(ids.iter().map(|id| self.hydrate(id))).await?;
        }
        Ok(self.snapshot().await)
    }

    /// Write `value` remotely, then cache it.
    ///
    /// On remote failure the cache keeps whatever it held before.
    pub async fn set_one(&self, id: &str, value: T) -> PlantkeepResult<()> {
        self.write_through(id, value, None).await
    }

    /// Like [`set_one`](Self::set_one), but only when the stored version
    /// still matches `token`.
    pub async fn set_one_if_match(
        &self,
        id: &str,
        value: T,
        token: &VersionToken,
    ) -> PlantkeepResult<()> {
        self.write_through(id, value, Some(token)).await
    }

    /// Delete an object remotely, then drop it from the cache.
    ///
    /// An id that is neither cached nor present remotely is a successful
    /// no-op. On remote failure a cached entry is kept.
    pub async fn delete_one(&self, id: &str) -> PlantkeepResult<()> {
        let key = self.key(id);
        let _family = self.family_lock.read().await;
        let _slot = self.lock_slot(id).await;

        let cached = self.entries.read().await.contains_key(id);
        if !cached {
            if self.store.exists(&self.container, &key).await?.is_none() {
                debug!(container = %self.container, key = %key, "nothing to delete");
                return Ok(());
            }
            return self.store.delete(&self.container, &key).await;
        }

        if let Err(err) = self.store.delete(&self.container, &key).await {
            warn!(container = %self.container, key = %key, error = %err, "remote delete failed, entry kept");
            return Err(err);
        }
        self.entries.write().await.remove(id);
        Ok(())
    }

    /// Re-read the whole family from the remote store and replace the cache
    /// with that snapshot.
    ///
    /// Cached values are ignored. If any remote call fails the cache is left
    /// empty rather than half refreshed. Single-id reads, writes and deletes
    /// wait until the refetch has been installed.
    pub async fn fetch_all(&self) -> PlantkeepResult<BTreeMap<String, T>> {
        let _family = self.family_lock.write().await;
        let fetched = self.read_family().await;
        let mut entries = self.entries.write().await;
        match fetched {
            Ok(fresh) => {
                *entries = fresh
                    .iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect();
                debug!(container = %self.container, family = %T::family(), count = fresh.len(), "family refetched");
                Ok(fresh)
            }
            Err(err) => {
                entries.clear();
                warn!(container = %self.container, family = %T::family(), error = %err, "refetch failed, cache emptied");
                Err(err)
            }
        }
    }

    /// Cached value without touching the remote store.
    pub async fn peek(&self, id: &str) -> Option<T> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached ids in sorted order.
    pub async fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Copy of every cached entry.
    pub async fn snapshot(&self) -> BTreeMap<String, T> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }

    pub async fn stats(&self) -> CacheStats {
        let entry_count = self.len().await;
        self.counters.snapshot(entry_count)
    }

    fn key(&self, id: &str) -> String {
        T::family().key_for(id)
    }

    async fn lock_slot(&self, id: &str) -> SlotGuard<'_> {
        let slot = self.slots.entry(id.to_string()).or_default().value().clone();
        SlotGuard {
            slots: &self.slots,
            id: id.to_string(),
            guard: Some(slot.lock_owned().await),
        }
    }

    async fn list_ids(&self) -> PlantkeepResult<Vec<String>> {
        let family = T::family();
        let keys = self.store.list_keys(&self.container, family.suffix()).await?;
        Ok(keys
            .iter()
            .filter_map(|key| family.id_from_key(key))
            .map(str::to_owned)
            .collect())
    }

    /// Read `id` into the cache unless it is already there. The id is known
    /// to be listed, so no existence probe is made.
    async fn hydrate(&self, id: &str) -> PlantkeepResult<()> {
        if self.contains(id).await {
            self.counters.hit();
            return Ok(());
        }

        let _slot = self.lock_slot(id).await;
        if self.contains(id).await {
            self.counters.hit();
            return Ok(());
        }
        self.counters.miss();

        let value = self.read_remote(&self.key(id)).await?;
        self.entries.write().await.insert(id.to_string(), value);
        Ok(())
    }

    async fn read_family(&self) -> PlantkeepResult<BTreeMap<String, T>> {
        let ids = self.list_ids().await?;
        let values = try_join_all(ids.iter().map(|id| self.read_id(id))).await?;
        Ok(ids.into_iter().zip(values).collect())
    }

    async fn read_id(&self, id: &str) -> PlantkeepResult<T> {
        self.read_remote(&self.key(id)).await
    }

    async fn read_remote(&self, key: &str) -> PlantkeepResult<T> {
        self.counters.remote_read();
        let raw = self.store.read(&self.container, key).await?;
        decode(key, raw)
    }

    async fn write_through(
        &self,
        id: &str,
        value: T,
        if_match: Option<&VersionToken>,
    ) -> PlantkeepResult<()> {
        let key = self.key(id);
        let raw = encode(&key, &value)?;

        let _family = self.family_lock.read().await;
        let _slot = self.lock_slot(id).await;

        if let Err(err) = self.store.write(&self.container, &key, &raw, if_match).await {
            warn!(container = %self.container, key = %key, error = %err, "remote write failed, cache unchanged");
            return Err(err);
        }
        self.entries.write().await.insert(id.to_string(), value);
        Ok(())
    }
}

/// Held per-id lock. Unlocks on drop and removes the slot when no other
/// task holds or awaits it.
struct SlotGuard<'a> {
    slots: &'a DashMap<String, Arc<Mutex<()>>>,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.slots
            .remove_if(&self.id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl<T: CacheableObject> std::fmt::Debug for KeyedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedCache")
            .field("family", &T::family())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

fn decode<T: CacheableObject>(key: &str, raw: Value) -> PlantkeepResult<T> {
    serde_json::from_value(raw).map_err(|e| {
        StoreError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn encode<T: CacheableObject>(key: &str, value: &T) -> PlantkeepResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        StoreError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
