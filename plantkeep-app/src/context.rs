//! Application context and bootstrap.
//!
//! An [`ApplicationContext`] owns the caches of one application instance and
//! refuses every accessor until [`init`](ApplicationContext::init) has
//! succeeded. Bootstrap resolves the canonical groups, then hydrates the
//! application, user and plant families concurrently into freshly built
//! caches. The caches are published only when everything succeeded, so a
//! failed attempt leaves nothing behind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use plantkeep_core::{
    AppObject, CanonicalGroup, ContextAttributes, GroupRecord, PlantObject, PlantkeepError,
    PlantkeepResult, Role, SubscriberObject, UserObject, APP_SINGLETON_ID,
};
use plantkeep_storage::{CacheStats, KeyedCache, KeyedStore};
use tokio::sync::{watch, OnceCell};
use tracing::{info, warn};

use crate::config::GroupNaming;
use crate::directory::GroupDirectory;
use crate::groups::CanonicalGroups;

/// Bootstrap state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitPhase {
    Uninitialized,
    ResolvingGroups,
    HydratingCaches,
    Initialized,
}

impl fmt::Display for InitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitPhase::Uninitialized => "uninitialized",
            InitPhase::ResolvingGroups => "resolving_groups",
            InitPhase::HydratingCaches => "hydrating_caches",
            InitPhase::Initialized => "initialized",
        };
        f.write_str(name)
    }
}

/// State published by a successful bootstrap.
struct Bootstrapped {
    groups: CanonicalGroups,
    app: KeyedCache<AppObject>,
    users: KeyedCache<UserObject>,
    plants: KeyedCache<PlantObject>,
}

/// Usage counters of every cache owned by a context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStats {
    pub app: CacheStats,
    pub users: CacheStats,
    pub plants: CacheStats,
    pub subscribers: CacheStats,
}

/// Cached, role-aware state of one application instance.
pub struct ApplicationContext {
    attributes: ContextAttributes,
    naming: GroupNaming,
    store: Arc<dyn KeyedStore>,
    groups: Arc<dyn GroupDirectory>,
    state: OnceCell<Bootstrapped>,
    /// Lazily filled; not part of bootstrap.
    subscribers: KeyedCache<SubscriberObject>,
    phase: watch::Sender<InitPhase>,
}

impl ApplicationContext {
    /// Create an uninitialized context. Fails on invalid attributes.
    pub fn new(
        attributes: ContextAttributes,
        naming: GroupNaming,
        store: Arc<dyn KeyedStore>,
        groups: Arc<dyn GroupDirectory>,
    ) -> PlantkeepResult<Self> {
        attributes.validate()?;
        let subscribers = KeyedCache::new(store.clone(), attributes.container_id.clone());
        let (phase, _) = watch::channel(InitPhase::Uninitialized);
        Ok(Self {
            attributes,
            naming,
            store,
            groups,
            state: OnceCell::new(),
            subscribers,
            phase,
        })
    }

    pub fn attributes(&self) -> &ContextAttributes {
        &self.attributes
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    pub fn phase(&self) -> InitPhase {
        *self.phase.borrow()
    }

    /// Watch bootstrap phase transitions.
    pub fn subscribe_phase(&self) -> watch::Receiver<InitPhase> {
        self.phase.subscribe()
    }

    /// Bootstrap the context.
    ///
    /// All or nothing: on failure the context stays uninitialized with empty
    /// caches and the error is returned unchanged. Calling again after
    /// success is a no-op. Concurrent calls run one at a time; once one
    /// succeeds the others return without remote calls.
    pub async fn init(&self) -> PlantkeepResult<()> {
        self.state
            .get_or_try_init(|| async {
                match self.bootstrap().await {
                    Ok(state) => Ok(state),
                    Err(err) => {
                        warn!(
                            application_id = %self.attributes.application_id,
                            phase = %self.phase(),
                            error = %err,
                            "bootstrap failed"
                        );
                        self.set_phase(InitPhase::Uninitialized);
                        Err(err)
                    }
                }
            })
            .await?;
        self.set_phase(InitPhase::Initialized);
        Ok(())
    }

    async fn bootstrap(&self) -> PlantkeepResult<Bootstrapped> {
        let application_id = &self.attributes.application_id;
        let tenant = &self.attributes.owner_tenant;

        self.set_phase(InitPhase::ResolvingGroups);
        let listing = self.groups.list_groups(tenant).await?;
        let groups = CanonicalGroups::resolve(&listing, &self.naming, application_id)?;
        info!(%application_id, %tenant, "canonical groups resolved");

        self.set_phase(InitPhase::HydratingCaches);
        let container = &self.attributes.container_id;
        let app = KeyedCache::<AppObject>::new(self.store.clone(), container.clone());
        let users = KeyedCache::<UserObject>::new(self.store.clone(), container.clone());
        let plants = KeyedCache::<PlantObject>::new(self.store.clone(), container.clone());
        let (app_objects, user_objects, plant_objects) =
            tokio::try_join!(app.get_all(), users.get_all(), plants.get_all())?;

        info!(
            %application_id,
            container = %container,
            app = app_objects.len(),
            users = user_objects.len(),
            plants = plant_objects.len(),
            "application context initialized"
        );
        Ok(Bootstrapped {
            groups,
            app,
            users,
            plants,
        })
    }

    fn set_phase(&self, phase: InitPhase) {
        self.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }

    fn ready(&self) -> PlantkeepResult<&Bootstrapped> {
        self.state.get().ok_or(PlantkeepError::NotInitialized)
    }

    // ========================================================================
    // Application object
    // ========================================================================

    pub async fn get_app_data(&self) -> PlantkeepResult<Option<AppObject>> {
        self.ready()?.app.get_one(APP_SINGLETON_ID).await
    }

    pub async fn set_app_data(&self, value: AppObject) -> PlantkeepResult<()> {
        self.ready()?.app.set_one(APP_SINGLETON_ID, value).await
    }

    pub async fn remove_app_data(&self) -> PlantkeepResult<()> {
        self.ready()?.app.delete_one(APP_SINGLETON_ID).await
    }

    /// Re-read the application object from the remote store.
    pub async fn fetch_app_data(&self) -> PlantkeepResult<Option<AppObject>> {
        let mut fresh = self.ready()?.app.fetch_all().await?;
        Ok(fresh.remove(APP_SINGLETON_ID))
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user_data(&self, user_id: &str) -> PlantkeepResult<Option<UserObject>> {
        self.ready()?.users.get_one(user_id).await
    }

    pub async fn set_user_data(&self, user_id: &str, value: UserObject) -> PlantkeepResult<()> {
        self.ready()?.users.set_one(user_id, value).await
    }

    pub async fn remove_user_data(&self, user_id: &str) -> PlantkeepResult<()> {
        self.ready()?.users.delete_one(user_id).await
    }

    pub async fn get_all_users_data(&self) -> PlantkeepResult<BTreeMap<String, UserObject>> {
        self.ready()?.users.get_all().await
    }

    pub async fn fetch_all_users_data(&self) -> PlantkeepResult<BTreeMap<String, UserObject>> {
        self.ready()?.users.fetch_all().await
    }

    // ========================================================================
    // Plants
    // ========================================================================

    pub async fn get_plant_data(&self, plant_id: &str) -> PlantkeepResult<Option<PlantObject>> {
        self.ready()?.plants.get_one(plant_id).await
    }

    pub async fn set_plant_data(&self, plant_id: &str, value: PlantObject) -> PlantkeepResult<()> {
        self.ready()?.plants.set_one(plant_id, value).await
    }

    pub async fn remove_plant_data(&self, plant_id: &str) -> PlantkeepResult<()> {
        self.ready()?.plants.delete_one(plant_id).await
    }

    pub async fn get_all_plants_data(&self) -> PlantkeepResult<BTreeMap<String, PlantObject>> {
        self.ready()?.plants.get_all().await
    }

    pub async fn fetch_all_plants_data(&self) -> PlantkeepResult<BTreeMap<String, PlantObject>> {
        self.ready()?.plants.fetch_all().await
    }

    // ========================================================================
    // Notification subscribers
    // ========================================================================

    pub async fn get_subscriber(&self, service_id: &str) -> PlantkeepResult<Option<SubscriberObject>> {
        self.ready()?;
        self.subscribers.get_one(service_id).await
    }

    pub async fn set_subscriber(&self, service_id: &str, value: SubscriberObject) -> PlantkeepResult<()> {
        self.ready()?;
        self.subscribers.set_one(service_id, value).await
    }

    pub async fn remove_subscriber(&self, service_id: &str) -> PlantkeepResult<()> {
        self.ready()?;
        self.subscribers.delete_one(service_id).await
    }

    pub async fn get_all_subscribers(&self) -> PlantkeepResult<BTreeMap<String, SubscriberObject>> {
        self.ready()?;
        self.subscribers.get_all().await
    }

    // ========================================================================
    // Groups and roles
    // ========================================================================

    /// Role granted by `group`. See [`CanonicalGroups::role_for_group`].
    pub fn role_for_group(&self, group: &GroupRecord) -> PlantkeepResult<Role> {
        self.ready()?.groups.role_for_group(group)
    }

    /// Group granting `role`. See [`CanonicalGroups::group_for_role`].
    pub fn group_for_role(&self, role: Role) -> PlantkeepResult<GroupRecord> {
        self.ready()?.groups.group_for_role(role).cloned()
    }

    pub fn canonical_group(&self, kind: CanonicalGroup) -> PlantkeepResult<GroupRecord> {
        Ok(self.ready()?.groups.get(kind).clone())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// How many more users the application admits, from the cached user
    /// count and the application object's `max_users`. `None` when there is
    /// no limit or no application object.
    pub async fn remaining_user_slots(&self) -> PlantkeepResult<Option<u64>> {
        let state = self.ready()?;
        let Some(app) = state.app.get_one(APP_SINGLETON_ID).await? else {
            return Ok(None);
        };
        let Some(max_users) = app.max_users else {
            return Ok(None);
        };
        let used = state.users.len().await as u64;
        Ok(Some(max_users.saturating_sub(used)))
    }

    pub async fn stats(&self) -> PlantkeepResult<ContextStats> {
        let state = self.ready()?;
        Ok(ContextStats {
            app: state.app.stats().await,
            users: state.users.stats().await,
            plants: state.plants.stats().await,
            subscribers: self.subscribers.stats().await,
        })
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("attributes", &self.attributes)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
