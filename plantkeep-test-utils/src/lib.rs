//! plantkeep Test Utilities
//!
//! Shared test infrastructure for the plantkeep workspace:
//! - Proptest generators for roles, permissions and objects
//! - Fixtures wiring an application context over in-memory collaborators
//! - Custom assertions for plantkeep errors

// Re-export in-memory collaborators from their source crates
pub use plantkeep_app::{InMemoryGroupDirectory, InMemoryUserDirectory};
pub use plantkeep_storage::{InMemoryKeyedStore, StoreOp};

pub use plantkeep_core::{
    AppObject, CanonicalGroup, ContainerId, ContextAttributes, GroupRecord, PlantObject,
    PlantPermission, PlantkeepError, PlantkeepResult, Role, StoreError, UserObject,
    APP_SINGLETON_ID,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for plantkeep types.

    use super::*;
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// One of the four valid roles.
    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::LocalUser),
            Just(Role::LocalAdmin),
            Just(Role::GlobalUser),
            Just(Role::GlobalAdmin),
        ]
    }

    /// Any role including `Invalid`.
    pub fn arb_any_role() -> impl Strategy<Value = Role> {
        prop_oneof![4 => arb_role(), 1 => Just(Role::Invalid)]
    }

    /// A stored role value: valid codes, out-of-range numbers, or junk.
    pub fn arb_stored_role() -> impl Strategy<Value = Value> {
        prop_oneof![
            (0i64..=3).prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{1,8}".prop_map(Value::from),
            Just(Value::Null),
        ]
    }

    pub fn arb_plant_permission() -> impl Strategy<Value = PlantPermission> {
        prop_oneof![
            Just(PlantPermission::User),
            Just(PlantPermission::Admin),
            Just(PlantPermission::Invalid),
        ]
    }

    /// Object ids usable as key prefixes.
    pub fn arb_object_id() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9_-]{0,11}"
    }

    /// Small JSON payload for `data` / `config`.
    pub fn arb_payload() -> impl Strategy<Value = Value> {
        (any::<i32>(), "[a-z ]{0,16}", any::<bool>())
            .prop_map(|(n, s, b)| json!({ "n": n, "s": s, "on": b }))
    }

    pub fn arb_plant_object() -> impl Strategy<Value = PlantObject> {
        (arb_payload(), arb_payload()).prop_map(|(config, data)| PlantObject {
            config,
            data,
            ..Default::default()
        })
    }

    pub fn arb_user_object() -> impl Strategy<Value = UserObject> {
        (
            arb_any_role(),
            arb_payload(),
            btree_map(arb_object_id(), arb_plant_permission(), 0..4),
        )
            .prop_map(|(role, data, plant_permissions)| UserObject {
                role,
                data,
                plant_permissions,
                ..Default::default()
            })
    }

    /// Distinct object ids.
    pub fn arb_object_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
        vec(arb_object_id(), 0..max).prop_map(|mut ids| {
            ids.sort();
            ids.dedup();
            ids
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures: one tenant, one application, in-memory
    //! collaborators.

    use super::*;
    use plantkeep_app::{ApplicationContext, GroupNaming};
    use std::sync::Arc;

    pub const APPLICATION_ID: &str = "plants";
    pub const TENANT: &str = "t100";
    pub const CONTAINER_ID: &str = "4711";

    pub fn attributes() -> ContextAttributes {
        ContextAttributes::new(TENANT, APPLICATION_ID, CONTAINER_ID, TENANT)
    }

    pub fn container() -> ContainerId {
        ContainerId::new(CONTAINER_ID)
    }

    /// Id given to a canonical group in [`canonical_group_listing`].
    pub fn group_id(kind: CanonicalGroup) -> String {
        format!("grp-{}", kind.suffix())
    }

    /// The six canonical groups of `application_id` plus one unrelated group.
    pub fn canonical_group_listing(application_id: &str) -> Vec<GroupRecord> {
        let naming = GroupNaming::default();
        CanonicalGroup::ALL
            .iter()
            .map(|kind| GroupRecord::new(group_id(*kind), naming.name_for(application_id, *kind)))
            .chain([GroupRecord::new("grp-unrelated", "mdsp_core_standard_user")])
            .collect()
    }

    /// Listing with `missing` left out.
    pub fn listing_without(application_id: &str, missing: CanonicalGroup) -> Vec<GroupRecord> {
        let name = GroupNaming::default().name_for(application_id, missing);
        canonical_group_listing(application_id)
            .into_iter()
            .filter(|group| group.display_name != name)
            .collect()
    }

    /// Collaborators and an uninitialized context over them.
    pub struct TestContext {
        pub store: Arc<InMemoryKeyedStore>,
        pub groups: Arc<InMemoryGroupDirectory>,
        pub context: ApplicationContext,
    }

    impl TestContext {
        /// Fixture tenant with a complete canonical group listing.
        pub fn new() -> Self {
            Self::with_groups(canonical_group_listing(APPLICATION_ID))
        }

        pub fn with_groups(listing: Vec<GroupRecord>) -> Self {
            let store = Arc::new(InMemoryKeyedStore::new());
            let groups = Arc::new(InMemoryGroupDirectory::new());
            groups.set_groups(TENANT, listing);
            let context = ApplicationContext::new(
                attributes(),
                GroupNaming::default(),
                store.clone(),
                groups.clone(),
            )
            .expect("fixture attributes are valid");
            Self {
                store,
                groups,
                context,
            }
        }

        pub fn seed_app(&self, app: &AppObject) {
            self.store
                .insert_object(&container(), APP_SINGLETON_ID, app)
                .expect("fixture app object encodes");
        }

        pub fn seed_user(&self, id: &str, user: &UserObject) {
            self.store
                .insert_object(&container(), id, user)
                .expect("fixture user object encodes");
        }

        pub fn seed_plant(&self, id: &str, plant: &PlantObject) {
            self.store
                .insert_object(&container(), id, plant)
                .expect("fixture plant object encodes");
        }

        /// Initialize and forget the bootstrap's remote calls.
        pub async fn initialized(self) -> Self {
            self.context.init().await.expect("fixture context initializes");
            self.store.reset_calls();
            self
        }
    }

    impl Default for TestContext {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for plantkeep results.

    use super::*;

    /// Assert that a PlantkeepResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &PlantkeepResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a PlantkeepResult is NotInitialized.
    #[track_caller]
    pub fn assert_not_initialized<T: std::fmt::Debug>(result: &PlantkeepResult<T>) {
        match result {
            Err(PlantkeepError::NotInitialized) => {}
            other => panic!("Expected NotInitialized, got: {:?}", other),
        }
    }

    /// Assert that a PlantkeepResult failed in a remote collaborator.
    #[track_caller]
    pub fn assert_remote_error<T: std::fmt::Debug>(result: &PlantkeepResult<T>) {
        match result {
            Err(err) if err.is_remote() => {}
            other => panic!("Expected remote error, got: {:?}", other),
        }
    }

    /// Assert that a PlantkeepResult is GroupNotFound for `name`.
    #[track_caller]
    pub fn assert_group_not_found<T: std::fmt::Debug>(result: &PlantkeepResult<T>, name: &str) {
        match result {
            Err(PlantkeepError::GroupNotFound(missing)) => {
                assert_eq!(missing, name, "Wrong group in GroupNotFound error");
            }
            other => panic!("Expected GroupNotFound({}), got: {:?}", name, other),
        }
    }

    /// Assert that a store saw exactly `expected` calls of `op`.
    #[track_caller]
    pub fn assert_store_calls(store: &InMemoryKeyedStore, op: StoreOp, expected: usize) {
        assert_eq!(
            store.calls(op),
            expected,
            "Unexpected number of {:?} calls",
            op
        );
    }
}
