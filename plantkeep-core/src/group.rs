//! Canonical groups and remote directory records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::role::Role;

/// One of the six fixed logical groups resolved at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalGroup {
    GlobalAdmin,
    GlobalUser,
    LocalAdmin,
    LocalUser,
    /// Union of the four role groups.
    StandardUser,
    /// Standard user group scoped to a subtenant.
    SubtenantUser,
}

impl CanonicalGroup {
    pub const ALL: [CanonicalGroup; 6] = [
        CanonicalGroup::GlobalAdmin,
        CanonicalGroup::GlobalUser,
        CanonicalGroup::LocalAdmin,
        CanonicalGroup::LocalUser,
        CanonicalGroup::StandardUser,
        CanonicalGroup::SubtenantUser,
    ];

    /// Suffix used by the naming convention `<prefix>_<suffix>`.
    pub fn suffix(&self) -> &'static str {
        match self {
            CanonicalGroup::GlobalAdmin => "global_admin",
            CanonicalGroup::GlobalUser => "global_user",
            CanonicalGroup::LocalAdmin => "local_admin",
            CanonicalGroup::LocalUser => "local_user",
            CanonicalGroup::StandardUser => "standard_user",
            CanonicalGroup::SubtenantUser => "subtenant_user",
        }
    }

    /// Role granted by membership, `None` for the two union groups.
    pub fn role(&self) -> Option<Role> {
        match self {
            CanonicalGroup::GlobalAdmin => Some(Role::GlobalAdmin),
            CanonicalGroup::GlobalUser => Some(Role::GlobalUser),
            CanonicalGroup::LocalAdmin => Some(Role::LocalAdmin),
            CanonicalGroup::LocalUser => Some(Role::LocalUser),
            CanonicalGroup::StandardUser | CanonicalGroup::SubtenantUser => None,
        }
    }

    /// Group that grants `role`, `None` for `Role::Invalid`.
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::GlobalAdmin => Some(CanonicalGroup::GlobalAdmin),
            Role::GlobalUser => Some(CanonicalGroup::GlobalUser),
            Role::LocalAdmin => Some(CanonicalGroup::LocalAdmin),
            Role::LocalUser => Some(CanonicalGroup::LocalUser),
            Role::Invalid => None,
        }
    }
}

impl fmt::Display for CanonicalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A group as returned by the group directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            members: Vec::new(),
        }
    }
}

/// A user as returned by the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub login_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, login_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login_name: login_name.into(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_group_mapping_is_inverse() {
        for role in Role::ALL {
            let group = CanonicalGroup::for_role(role).unwrap();
            assert_eq!(group.role(), Some(role));
        }
        assert_eq!(CanonicalGroup::for_role(Role::Invalid), None);
    }

    #[test]
    fn test_union_groups_grant_no_role() {
        assert_eq!(CanonicalGroup::StandardUser.role(), None);
        assert_eq!(CanonicalGroup::SubtenantUser.role(), None);
    }

    #[test]
    fn test_group_record_decodes_without_members() {
        let record: GroupRecord =
            serde_json::from_value(serde_json::json!({ "id": "7", "displayName": "g" })).unwrap();
        assert_eq!(record, GroupRecord::new("7", "g"));
    }
}
