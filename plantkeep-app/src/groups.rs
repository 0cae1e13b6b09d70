//! Canonical group resolution.

use plantkeep_core::{CanonicalGroup, GroupRecord, PlantkeepError, PlantkeepResult, Role};

use crate::config::GroupNaming;

/// The six canonical groups of one application, resolved from a tenant's
/// group listing. Holds every group; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalGroups {
    global_admin: GroupRecord,
    global_user: GroupRecord,
    local_admin: GroupRecord,
    local_user: GroupRecord,
    standard_user: GroupRecord,
    subtenant_user: GroupRecord,
}

impl CanonicalGroups {
    /// Pick each canonical group out of `listing` by its conventional name.
    ///
    /// Fails with `GroupNotFound` naming the first missing group, in
    /// `CanonicalGroup::ALL` order.
    pub fn resolve(
        listing: &[GroupRecord],
        naming: &GroupNaming,
        application_id: &str,
    ) -> PlantkeepResult<Self> {
        let find = |kind: CanonicalGroup| {
            let name = naming.name_for(application_id, kind);
            listing
                .iter()
                .find(|group| group.display_name == name)
                .cloned()
                .ok_or(PlantkeepError::GroupNotFound(name))
        };
        Ok(Self {
            global_admin: find(CanonicalGroup::GlobalAdmin)?,
            global_user: find(CanonicalGroup::GlobalUser)?,
            local_admin: find(CanonicalGroup::LocalAdmin)?,
            local_user: find(CanonicalGroup::LocalUser)?,
            standard_user: find(CanonicalGroup::StandardUser)?,
            subtenant_user: find(CanonicalGroup::SubtenantUser)?,
        })
    }

    pub fn get(&self, kind: CanonicalGroup) -> &GroupRecord {
        match kind {
            CanonicalGroup::GlobalAdmin => &self.global_admin,
            CanonicalGroup::GlobalUser => &self.global_user,
            CanonicalGroup::LocalAdmin => &self.local_admin,
            CanonicalGroup::LocalUser => &self.local_user,
            CanonicalGroup::StandardUser => &self.standard_user,
            CanonicalGroup::SubtenantUser => &self.subtenant_user,
        }
    }

    /// Which canonical group, if any, `group_id` identifies.
    pub fn kind_of(&self, group_id: &str) -> Option<CanonicalGroup> {
        CanonicalGroup::ALL
            .into_iter()
            .find(|kind| self.get(*kind).id == group_id)
    }

    /// Role granted by membership in `group`.
    ///
    /// Fails with `PermissionNotRecognized` for groups that are not one of
    /// the four role groups.
    pub fn role_for_group(&self, group: &GroupRecord) -> PlantkeepResult<Role> {
        self.kind_of(&group.id)
            .and_then(|kind| kind.role())
            .ok_or_else(|| PlantkeepError::PermissionNotRecognized(group.display_name.clone()))
    }

    /// Group granting `role`. Fails with `RoleNotRecognized` for
    /// `Role::Invalid`.
    pub fn group_for_role(&self, role: Role) -> PlantkeepResult<&GroupRecord> {
        CanonicalGroup::for_role(role)
            .map(|kind| self.get(kind))
            .ok_or_else(|| PlantkeepError::RoleNotRecognized(role.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalGroup, &GroupRecord)> {
        CanonicalGroup::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(app: &str) -> Vec<GroupRecord> {
        let naming = GroupNaming::default();
        CanonicalGroup::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| GroupRecord::new(format!("g{i}"), naming.name_for(app, *kind)))
            .chain([GroupRecord::new("other", "unrelated")])
            .collect()
    }

    #[test]
    fn test_resolve_all_six() {
        let groups = CanonicalGroups::resolve(&listing("plants"), &GroupNaming::default(), "plants").unwrap();
        assert_eq!(groups.get(CanonicalGroup::GlobalAdmin).id, "g0");
        assert_eq!(groups.get(CanonicalGroup::SubtenantUser).id, "g5");
        assert_eq!(groups.iter().count(), 6);
    }

    #[test]
    fn test_get_returns_the_group_named_for_kind() {
        let naming = GroupNaming::default();
        // Listing order differs from declaration order.
        let mut shuffled = listing("plants");
        shuffled.reverse();
        let groups = CanonicalGroups::resolve(&shuffled, &naming, "plants").unwrap();

        for (kind, group) in groups.iter() {
            assert_eq!(group.display_name, naming.name_for("plants", kind));
            assert_eq!(groups.kind_of(&group.id), Some(kind));
        }
    }

    #[test]
    fn test_missing_group_is_named() {
        let mut groups = listing("plants");
        groups.retain(|g| g.display_name != "plants_local_user");

        let err = CanonicalGroups::resolve(&groups, &GroupNaming::default(), "plants").unwrap_err();
        assert_eq!(err, PlantkeepError::GroupNotFound("plants_local_user".to_string()));
    }

    #[test]
    fn test_other_application_groups_do_not_match() {
        let err = CanonicalGroups::resolve(&listing("other"), &GroupNaming::default(), "plants").unwrap_err();
        assert_eq!(err, PlantkeepError::GroupNotFound("plants_global_admin".to_string()));
    }

    #[test]
    fn test_role_group_inverse() {
        let groups = CanonicalGroups::resolve(&listing("plants"), &GroupNaming::default(), "plants").unwrap();
        for role in Role::ALL {
            let group = groups.group_for_role(role).unwrap().clone();
            assert_eq!(groups.role_for_group(&group).unwrap(), role);
        }
    }

    #[test]
    fn test_unrecognized_inputs() {
        let groups = CanonicalGroups::resolve(&listing("plants"), &GroupNaming::default(), "plants").unwrap();

        let standard = groups.get(CanonicalGroup::StandardUser).clone();
        assert_eq!(
            groups.role_for_group(&standard),
            Err(PlantkeepError::PermissionNotRecognized("plants_standard_user".to_string()))
        );
        assert!(matches!(
            groups.role_for_group(&GroupRecord::new("other", "unrelated")),
            Err(PlantkeepError::PermissionNotRecognized(_))
        ));
        assert!(matches!(
            groups.group_for_role(Role::Invalid),
            Err(PlantkeepError::RoleNotRecognized(_))
        ));
    }
}
