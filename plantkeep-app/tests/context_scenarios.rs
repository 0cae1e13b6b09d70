//! End-to-end behavior of the application context over in-memory
//! collaborators.

use plantkeep_app::{has_role, InitPhase};
use plantkeep_test_utils::assertions::*;
use plantkeep_test_utils::fixtures::*;
use plantkeep_test_utils::*;
use serde_json::json;

#[tokio::test]
async fn test_plant_read_is_cached() {
    let t = TestContext::new().initialized().await;
    // Written after bootstrap, so the cache has not seen it.
    t.seed_plant("p1", &PlantObject::with_data(json!({ "x": 1 })));

    let first = t.context.get_plant_data("p1").await.unwrap();
    assert_eq!(first, Some(PlantObject::with_data(json!({ "x": 1 }))));
    assert_store_calls(&t.store, StoreOp::Read, 1);

    let second = t.context.get_plant_data("p1").await.unwrap();
    assert_eq!(second, first);
    assert_store_calls(&t.store, StoreOp::Read, 1);
}

#[tokio::test]
async fn test_bootstrapped_plant_needs_no_read() {
    let t = TestContext::new();
    t.seed_plant("p1", &PlantObject::with_data(json!({ "x": 1 })));
    let t = t.initialized().await;

    let plant = t.context.get_plant_data("p1").await.unwrap().unwrap();
    assert_eq!(plant.data, json!({ "x": 1 }));
    assert_eq!(t.store.total_calls(), 0);
}

#[tokio::test]
async fn test_missing_plant_is_not_cached() {
    let t = TestContext::new().initialized().await;

    assert_eq!(t.context.get_plant_data("zzz").await.unwrap(), None);
    assert_eq!(t.context.get_plant_data("zzz").await.unwrap(), None);

    assert_store_calls(&t.store, StoreOp::Exists, 2);
    assert_store_calls(&t.store, StoreOp::Read, 0);
    assert!(!t.context.get_all_plants_data().await.unwrap().contains_key("zzz"));
}

#[tokio::test]
async fn test_failed_app_write_keeps_cached_value() {
    let t = TestContext::new();
    t.seed_app(&AppObject::with_data(json!({ "a": 1 })));
    let t = t.initialized().await;

    t.store.fail(StoreOp::Write);
    let result = t.context.set_app_data(AppObject::with_data(json!({ "a": 2 }))).await;
    assert_remote_error(&result);

    let app = t.context.get_app_data().await.unwrap().unwrap();
    assert_eq!(app.data, json!({ "a": 1 }));
    assert_eq!(
        t.store.get(&container(), "main.app.config.json").unwrap()["data"],
        json!({ "a": 1 })
    );
}

#[tokio::test]
async fn test_missing_global_admin_group_aborts_init() {
    let t = TestContext::with_groups(listing_without(APPLICATION_ID, CanonicalGroup::GlobalAdmin));
    t.seed_app(&AppObject::with_data(json!({ "a": 1 })));

    assert_group_not_found(&t.context.init().await, "plants_global_admin");
    assert!(!t.context.is_initialized());
    assert_eq!(t.context.phase(), InitPhase::Uninitialized);
    assert_not_initialized(&t.context.get_app_data().await);

    // Group resolution failed before any cache was touched.
    assert_eq!(t.store.total_calls(), 0);
}

#[tokio::test]
async fn test_each_missing_group_aborts_init() {
    for kind in CanonicalGroup::ALL {
        let t = TestContext::with_groups(listing_without(APPLICATION_ID, kind));
        let result = t.context.init().await;
        assert!(matches!(result, Err(PlantkeepError::GroupNotFound(_))), "{kind}");
        assert!(!t.context.is_initialized());
    }
}

#[tokio::test]
async fn test_get_all_users_merges_remote_and_cached() {
    let x = UserObject {
        data: json!({ "marker": "X" }),
        ..UserObject::new(Role::LocalUser)
    };
    let y = UserObject {
        data: json!({ "marker": "Y" }),
        ..UserObject::new(Role::GlobalUser)
    };

    let t = TestContext::new();
    t.seed_user("u1", &x);
    let t = t.initialized().await;

    t.seed_user("u2", &y);
    let all = t.context.get_all_users_data().await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all["u1"], x);
    assert_eq!(all["u2"], y);
    assert_store_calls(&t.store, StoreOp::Read, 1);

    t.store.reset_calls();
    assert_eq!(t.context.get_user_data("u2").await.unwrap(), Some(y));
    assert_eq!(t.store.total_calls(), 0);
}

#[tokio::test]
async fn test_remote_deletion_is_not_evicted_by_get_all() {
    let t = TestContext::new();
    t.seed_user("u1", &UserObject::new(Role::LocalUser));
    let t = t.initialized().await;

    t.store.remove(&container(), "u1.user.config.json");
    assert!(t.context.get_all_users_data().await.unwrap().contains_key("u1"));

    // An explicit refetch drops it.
    assert!(t.context.fetch_all_users_data().await.unwrap().is_empty());
    assert_eq!(t.context.get_user_data("u1").await.unwrap(), None);
}

#[tokio::test]
async fn test_failed_refetch_empties_family() {
    let t = TestContext::new();
    t.seed_plant("p1", &PlantObject::default());
    t.seed_plant("p2", &PlantObject::default());
    let t = t.initialized().await;

    t.store.fail_key(StoreOp::Read, "p2.plant.config.json");
    assert_remote_error(&t.context.fetch_all_plants_data().await);

    t.store.clear_failures();
    t.store.reset_calls();
    t.context.get_plant_data("p1").await.unwrap();
    // p1 had to be read again.
    assert_store_calls(&t.store, StoreOp::Read, 1);
}

#[tokio::test]
async fn test_user_roles_survive_round_trip() {
    let t = TestContext::new().initialized().await;
    let user = UserObject::new(Role::LocalAdmin).with_plant("p1", PlantPermission::Admin);

    t.context.set_user_data("u9", user.clone()).await.unwrap();
    let stored = t.store.get(&container(), "u9.user.config.json").unwrap();
    assert_eq!(stored["role"], json!(1));
    assert_eq!(stored["plantPermissions"]["p1"], json!(1));

    let fetched = t.context.fetch_all_users_data().await.unwrap();
    assert!(has_role(&fetched["u9"], Role::LocalAdmin));
}

#[tokio::test]
async fn test_remove_user_twice() {
    let t = TestContext::new();
    t.seed_user("u1", &UserObject::new(Role::LocalUser));
    let t = t.initialized().await;

    t.context.remove_user_data("u1").await.unwrap();
    assert_store_calls(&t.store, StoreOp::Delete, 1);

    // Second removal probes, finds nothing, and does not delete.
    t.context.remove_user_data("u1").await.unwrap();
    assert_store_calls(&t.store, StoreOp::Delete, 1);
    assert_store_calls(&t.store, StoreOp::Exists, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_init_bootstraps_once() {
    let t = std::sync::Arc::new(TestContext::new());
    t.seed_user("u1", &UserObject::new(Role::LocalUser));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let t = t.clone();
            tokio::spawn(async move { t.context.init().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(t.groups.calls(), 1);
    assert_store_calls(&t.store, StoreOp::Read, 1);
}

#[tokio::test]
async fn test_malformed_fields_do_not_abort_init() {
    let t = TestContext::new();
    t.store
        .insert(&container(), "main.app.config.json", json!({ "maxUsers": "10" }));
    t.store.insert(
        &container(),
        "u1.user.config.json",
        json!({ "role": 3, "plantPermissions": null }),
    );
    let t = t.initialized().await;

    assert_eq!(t.context.remaining_user_slots().await, Ok(None));
    let user = t.context.get_user_data("u1").await.unwrap().unwrap();
    assert!(has_role(&user, Role::GlobalAdmin));
    assert!(user.plant_permissions.is_empty());
}
