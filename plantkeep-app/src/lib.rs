//! plantkeep application layer
//!
//! Wires the keyed caches into an [`ApplicationContext`] with an
//! all-or-nothing bootstrap, and provides role resolution, token scope
//! checks, configuration loading and tracing setup around it.
//!
//! Collaborators (keyed store, group and user directories) are injected as
//! trait objects; nothing here is a process-wide singleton.

pub mod authz;
pub mod config;
pub mod context;
pub mod directory;
pub mod groups;
pub mod roles;
pub mod telemetry;

pub use authz::{is_super_admin, CallerIdentity, ScopeAuthorizer, ScopeLevel};
pub use config::{AppConfig, GroupNaming, ScopeConfig, SuperAdminConfig};
pub use context::{ApplicationContext, ContextStats, InitPhase};
pub use directory::{
    GroupDirectory, InMemoryGroupDirectory, InMemoryUserDirectory, UserDirectory, UserQuery,
};
pub use groups::CanonicalGroups;
pub use roles::{
    accessible_plants, has_any_access_to_plant, has_role, is_admin_of_plant, is_user_of_plant,
    plant_permission,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
