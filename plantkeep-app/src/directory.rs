//! User and group directory contracts.
//!
//! Both directories are remote, already-authenticated clients owned by the
//! host process. The in-memory implementations below back tests and local
//! runs.

use async_trait::async_trait;
use dashmap::DashMap;
use plantkeep_core::{DirectoryError, GroupRecord, PlantkeepResult, UserRecord};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Tenant group listing.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Every group defined in `tenant`.
    async fn list_groups(&self, tenant: &str) -> PlantkeepResult<Vec<GroupRecord>>;
}

/// Filter for [`UserDirectory::find_users`]. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub tenant: String,
    pub subtenant: Option<String>,
    /// Group id the user must belong to.
    pub group: Option<String>,
    pub login_name: Option<String>,
}

impl UserQuery {
    pub fn tenant(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            ..Default::default()
        }
    }

    pub fn with_subtenant(mut self, subtenant: Option<String>) -> Self {
        self.subtenant = subtenant;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_login_name(mut self, login_name: impl Into<String>) -> Self {
        self.login_name = Some(login_name.into());
        self
    }
}

/// User lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_users(&self, query: &UserQuery) -> PlantkeepResult<Vec<UserRecord>>;
}

fn injected(directory: &str) -> DirectoryError {
    DirectoryError::Remote {
        directory: directory.to_string(),
        reason: "injected failure".to_string(),
    }
}

/// In-memory group directory.
#[derive(Debug, Default)]
pub struct InMemoryGroupDirectory {
    groups: DashMap<String, Vec<GroupRecord>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listing of `tenant`.
    pub fn set_groups(&self, tenant: impl Into<String>, groups: Vec<GroupRecord>) {
        self.groups.insert(tenant.into(), groups);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every listing fail until turned off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn list_groups(&self, tenant: &str) -> PlantkeepResult<Vec<GroupRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected("group").into());
        }
        Ok(self
            .groups
            .get(tenant)
            .map(|groups| groups.value().clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
struct DirectoryUser {
    tenant: String,
    subtenant: Option<String>,
    groups: Vec<String>,
    record: UserRecord,
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, DirectoryUser>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `record` in `tenant`, replacing any user with the same id.
    pub fn add_user(
        &self,
        tenant: impl Into<String>,
        subtenant: Option<String>,
        groups: Vec<String>,
        record: UserRecord,
    ) {
        let user = DirectoryUser {
            tenant: tenant.into(),
            subtenant,
            groups,
            record,
        };
        self.users.insert(user.record.id.clone(), user);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_users(&self, query: &UserQuery) -> PlantkeepResult<Vec<UserRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected("user").into());
        }

        let mut found: Vec<UserRecord> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|user| user.tenant == query.tenant)
            .filter(|user| query.subtenant.is_none() || user.subtenant == query.subtenant)
            .filter(|user| {
                query
                    .group
                    .as_ref()
                    .map_or(true, |group| user.groups.contains(group))
            })
            .filter(|user| {
                query
                    .login_name
                    .as_ref()
                    .map_or(true, |login| &user.record.login_name == login)
            })
            .map(|user| user.record)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
