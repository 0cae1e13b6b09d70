//! plantkeep core - data types
//!
//! Pure data shared by the storage and application crates: roles and plant
//! permissions, canonical groups, object families and records, context
//! attributes, and the error taxonomy. No I/O lives here.

pub mod attributes;
pub mod error;
pub mod family;
pub mod group;
pub mod objects;
pub mod role;

pub use attributes::{ContainerId, ContextAttributes};
pub use error::{ConfigError, DirectoryError, PlantkeepError, PlantkeepResult, StoreError};
pub use family::{ObjectFamily, APP_SINGLETON_ID};
pub use group::{CanonicalGroup, GroupRecord, UserRecord};
pub use objects::{AppObject, CacheableObject, PlantObject, SubscriberObject, UserObject};
pub use role::{PlantPermission, Role};
