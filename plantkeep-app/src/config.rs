//! Application configuration.
//!
//! Everything is loaded from environment variables with development
//! defaults. Each `from_env` has a `from_lookup` twin taking the variable
//! source as a closure, which is what the tests use.

use plantkeep_core::{CanonicalGroup, ConfigError, ContextAttributes};

use crate::telemetry::TelemetryConfig;

// ============================================================================
// GROUP NAMING
// ============================================================================

/// Convention deciding the display name of each canonical group.
///
/// Names are `<prefix>_<suffix>` where the prefix defaults to the
/// application id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNaming {
    pub prefix: Option<String>,
}

impl GroupNaming {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Expected display name of `group` for `application_id`.
    pub fn name_for(&self, application_id: &str, group: CanonicalGroup) -> String {
        let prefix = self.prefix.as_deref().unwrap_or(application_id);
        format!("{}_{}", prefix, group.suffix())
    }

    /// Environment variables:
    /// - `PLANTKEEP_GROUP_PREFIX`: overrides the application id prefix
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            prefix: non_empty(lookup("PLANTKEEP_GROUP_PREFIX")),
        }
    }
}

// ============================================================================
// SCOPES
// ============================================================================

/// Scope identifiers granting each of the four access levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    pub global_admin: String,
    pub global_user: String,
    pub local_admin: String,
    pub local_user: String,
    /// Token claim holding the scope list.
    pub claim: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::for_application("plantkeep")
    }
}

impl ScopeConfig {
    /// Scopes named `<application_id>.<level>`.
    pub fn for_application(application_id: &str) -> Self {
        Self {
            global_admin: format!("{application_id}.ga"),
            global_user: format!("{application_id}.gu"),
            local_admin: format!("{application_id}.la"),
            local_user: format!("{application_id}.lu"),
            claim: "scope".to_string(),
        }
    }

    /// Environment variables:
    /// - `PLANTKEEP_SCOPE_GLOBAL_ADMIN`, `PLANTKEEP_SCOPE_GLOBAL_USER`,
    ///   `PLANTKEEP_SCOPE_LOCAL_ADMIN`, `PLANTKEEP_SCOPE_LOCAL_USER`
    ///   (default: `<application id>.ga|gu|la|lu`)
    /// - `PLANTKEEP_SCOPE_CLAIM` (default: `scope`)
    pub fn from_env(application_id: &str) -> Self {
        Self::from_lookup(application_id, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(application_id: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::for_application(application_id);
        let read = |name: &str, default: String| non_empty(lookup(name)).unwrap_or(default);
        Self {
            global_admin: read("PLANTKEEP_SCOPE_GLOBAL_ADMIN", defaults.global_admin),
            global_user: read("PLANTKEEP_SCOPE_GLOBAL_USER", defaults.global_user),
            local_admin: read("PLANTKEEP_SCOPE_LOCAL_ADMIN", defaults.local_admin),
            local_user: read("PLANTKEEP_SCOPE_LOCAL_USER", defaults.local_user),
            claim: read("PLANTKEEP_SCOPE_CLAIM", defaults.claim),
        }
    }
}

// ============================================================================
// SUPER ADMINS
// ============================================================================

/// Who counts as a super admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperAdminConfig {
    /// Tenant callers must come from. `None` disables super admins.
    pub host_tenant: Option<String>,
    /// Directory user ids allowed to act as super admin.
    pub allowed_ids: Vec<String>,
}

impl SuperAdminConfig {
    pub fn new(host_tenant: impl Into<String>, allowed_ids: Vec<String>) -> Self {
        Self {
            host_tenant: Some(host_tenant.into()),
            allowed_ids,
        }
    }

    /// Environment variables:
    /// - `PLANTKEEP_HOST_TENANT`
    /// - `PLANTKEEP_SUPER_ADMINS`: comma-separated user ids
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let allowed_ids = lookup("PLANTKEEP_SUPER_ADMINS")
            .map(|s| {
                s.split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host_tenant: non_empty(lookup("PLANTKEEP_HOST_TENANT")),
            allowed_ids,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.host_tenant.is_some() && !self.allowed_ids.is_empty()
    }
}

// ============================================================================
// APPLICATION CONFIG
// ============================================================================

/// Complete configuration of one application process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub attributes: ContextAttributes,
    pub group_naming: GroupNaming,
    pub scopes: ScopeConfig,
    pub super_admin: SuperAdminConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let attributes = ContextAttributes::from_lookup(&lookup)?;
        let scopes = ScopeConfig::from_lookup(&attributes.application_id, &lookup);
        Ok(Self {
            group_naming: GroupNaming::from_lookup(&lookup),
            super_admin: SuperAdminConfig::from_lookup(&lookup),
            telemetry: TelemetryConfig::from_lookup(&lookup)?,
            scopes,
            attributes,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name: &str| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_group_naming() {
        let naming = GroupNaming::default();
        assert_eq!(
            naming.name_for("plants", CanonicalGroup::GlobalAdmin),
            "plants_global_admin"
        );

        let naming = GroupNaming::with_prefix("acme");
        assert_eq!(
            naming.name_for("plants", CanonicalGroup::SubtenantUser),
            "acme_subtenant_user"
        );
    }

    #[test]
    fn test_scope_defaults_follow_application() {
        let scopes = ScopeConfig::from_lookup("plants", env(&[("PLANTKEEP_SCOPE_LOCAL_USER", "lu.custom")]));
        assert_eq!(scopes.global_admin, "plants.ga");
        assert_eq!(scopes.local_user, "lu.custom");
        assert_eq!(scopes.claim, "scope");
    }

    #[test]
    fn test_super_admin_list() {
        let config = SuperAdminConfig::from_lookup(env(&[
            ("PLANTKEEP_HOST_TENANT", "host"),
            ("PLANTKEEP_SUPER_ADMINS", " a, ,b "),
        ]));
        assert_eq!(config.host_tenant.as_deref(), Some("host"));
        assert_eq!(config.allowed_ids, vec!["a", "b"]);
        assert!(config.is_enabled());

        assert!(!SuperAdminConfig::from_lookup(env(&[])).is_enabled());
    }

    #[test]
    fn test_app_config_from_lookup() {
        let config = AppConfig::from_lookup(env(&[
            ("PLANTKEEP_STORAGE_TENANT", "t100"),
            ("PLANTKEEP_APPLICATION_ID", "plants"),
            ("PLANTKEEP_CONTAINER_ID", "4711"),
            ("PLANTKEEP_GROUP_PREFIX", "acme"),
        ]))
        .unwrap();

        assert_eq!(config.attributes.owner_tenant, "t100");
        assert_eq!(config.group_naming.prefix.as_deref(), Some("acme"));
        assert_eq!(config.scopes.global_user, "plants.gu");
        assert!(!config.super_admin.is_enabled());
    }

    #[test]
    fn test_app_config_requires_container() {
        let err = AppConfig::from_lookup(env(&[
            ("PLANTKEEP_STORAGE_TENANT", "t100"),
            ("PLANTKEEP_APPLICATION_ID", "plants"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }
}
