//! Object records stored in the remote container.
//!
//! Field names follow the camelCase JSON written by other platform clients.
//! Unrecognised fields are kept in `extra` so a write-back never drops them.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::family::ObjectFamily;
use crate::role::{PlantPermission, Role};

/// Types that live in one object family and can be held by a keyed cache.
///
/// Implementations must be `Clone`, `Serialize`, and `DeserializeOwned` for
/// the remote round trip, and `Send + Sync + 'static` for async use.
pub trait CacheableObject: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The family this object type is stored under.
    fn family() -> ObjectFamily;
}

/// The application singleton (`main.app.config.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppObject {
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub data: Value,
    /// Maximum number of users the application admits. `None` means
    /// unlimited, as does a stored value that is not a non-negative integer.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_max_users"
    )]
    pub max_users: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppObject {
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }
}

impl CacheableObject for AppObject {
    fn family() -> ObjectFamily {
        ObjectFamily::Application
    }
}

/// Per-user object (`<userId>.user.config.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserObject {
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub role: Role,
    /// Sparse plant id to permission mapping. Absent plant means no access.
    /// A stored value that is not an object decodes as no grants.
    #[serde(default, deserialize_with = "lenient_plant_permissions")]
    pub plant_permissions: BTreeMap<String, PlantPermission>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserObject {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    /// Grant `permission` on `plant_id`, replacing any previous grant.
    pub fn with_plant(mut self, plant_id: impl Into<String>, permission: PlantPermission) -> Self {
        self.plant_permissions.insert(plant_id.into(), permission);
        self
    }
}

impl CacheableObject for UserObject {
    fn family() -> ObjectFamily {
        ObjectFamily::User
    }
}

/// Per-plant object (`<plantId>.plant.config.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantObject {
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlantObject {
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }
}

impl CacheableObject for PlantObject {
    fn family() -> ObjectFamily {
        ObjectFamily::Plant
    }
}

/// Notification subscriber registration (`<serviceId>.sub.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberObject {
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CacheableObject for SubscriberObject {
    fn family() -> ObjectFamily {
        ObjectFamily::Subscriber
    }
}

fn lenient_max_users<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_u64())
}

fn lenient_plant_permissions<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, PlantPermission>, D::Error> {
    let permissions = match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .iter()
            .map(|(plant_id, value)| (plant_id.clone(), PlantPermission::from_value(value)))
            .collect(),
        _ => BTreeMap::new(),
    };
    Ok(permissions)
}
