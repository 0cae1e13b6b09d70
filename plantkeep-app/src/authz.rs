//! Token based authorization helpers.
//!
//! These look at decoded token claims only and never touch the caches.
//! Token validation itself belongs to the transport layer.

use plantkeep_core::PlantkeepResult;
use serde_json::Value;
use tracing::debug;

use crate::config::{ScopeConfig, SuperAdminConfig};
use crate::directory::{UserDirectory, UserQuery};

/// Access level granted by a token scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeLevel {
    GlobalAdmin,
    GlobalUser,
    LocalAdmin,
    LocalUser,
}

impl ScopeLevel {
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::GlobalAdmin,
        ScopeLevel::GlobalUser,
        ScopeLevel::LocalAdmin,
        ScopeLevel::LocalUser,
    ];
}

/// Checks token scopes against the configured scope identifiers.
#[derive(Debug, Clone, Default)]
pub struct ScopeAuthorizer {
    config: ScopeConfig,
}

impl ScopeAuthorizer {
    pub fn new(config: ScopeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    fn scope_for(&self, level: ScopeLevel) -> &str {
        match level {
            ScopeLevel::GlobalAdmin => &self.config.global_admin,
            ScopeLevel::GlobalUser => &self.config.global_user,
            ScopeLevel::LocalAdmin => &self.config.local_admin,
            ScopeLevel::LocalUser => &self.config.local_user,
        }
    }

    /// Whether the scope list in `claims` contains the scope for `level`.
    ///
    /// A missing claim, or one that is not an array, matches nothing.
    pub fn has_scope(&self, claims: &Value, level: ScopeLevel) -> bool {
        let wanted = self.scope_for(level);
        if wanted.is_empty() {
            return false;
        }
        claims
            .get(&self.config.claim)
            .and_then(Value::as_array)
            .is_some_and(|scopes| scopes.iter().any(|s| s.as_str() == Some(wanted)))
    }

    pub fn is_global_admin(&self, claims: &Value) -> bool {
        self.has_scope(claims, ScopeLevel::GlobalAdmin)
    }

    pub fn is_global_user(&self, claims: &Value) -> bool {
        self.has_scope(claims, ScopeLevel::GlobalUser)
    }

    pub fn is_local_admin(&self, claims: &Value) -> bool {
        self.has_scope(claims, ScopeLevel::LocalAdmin)
    }

    pub fn is_local_user(&self, claims: &Value) -> bool {
        self.has_scope(claims, ScopeLevel::LocalUser)
    }

    /// Every level granted by `claims`, in `ScopeLevel::ALL` order.
    pub fn levels(&self, claims: &Value) -> Vec<ScopeLevel> {
        ScopeLevel::ALL
            .into_iter()
            .filter(|level| self.has_scope(claims, *level))
            .collect()
    }
}

/// Who is calling, as read from token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub tenant: String,
    pub subtenant: Option<String>,
    pub login_name: String,
}

impl CallerIdentity {
    pub fn new(tenant: impl Into<String>, login_name: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            subtenant: None,
            login_name: login_name.into(),
        }
    }

    pub fn with_subtenant(mut self, subtenant: impl Into<String>) -> Self {
        self.subtenant = Some(subtenant.into());
        self
    }

    /// Read `ten`, `subtenant` and `user_name` claims. `None` when tenant or
    /// user name is missing.
    pub fn from_claims(claims: &Value) -> Option<Self> {
        let text = |name: &str| {
            claims
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            tenant: text("ten")?,
            subtenant: text("subtenant"),
            login_name: text("user_name")?,
        })
    }
}

/// Whether `caller` is one of the configured super admins.
///
/// The caller must come from the host tenant, and the directory user found
/// for its login name must be on the allow-list. Any mismatch is `false`;
/// only directory failures are errors.
pub async fn is_super_admin(
    users: &dyn UserDirectory,
    caller: &CallerIdentity,
    config: &SuperAdminConfig,
) -> PlantkeepResult<bool> {
    let Some(host_tenant) = config.host_tenant.as_deref() else {
        return Ok(false);
    };
    if config.allowed_ids.is_empty() || caller.tenant != host_tenant {
        return Ok(false);
    }

    let query = UserQuery::tenant(&caller.tenant)
        .with_subtenant(caller.subtenant.clone())
        .with_login_name(&caller.login_name);
    let found = users.find_users(&query).await?;

    let allowed = found
        .iter()
        .any(|user| config.allowed_ids.iter().any(|id| id == &user.id));
    debug!(
        tenant = %caller.tenant,
        login_name = %caller.login_name,
        matches = found.len(),
        allowed,
        "super admin check"
    );
    Ok(allowed)
}
