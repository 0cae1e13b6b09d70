//! Role and plant permission predicates over user objects.
//!
//! All predicates are strict equality checks. An `Invalid` role or
//! permission never satisfies any of them and nothing here fails.

use plantkeep_core::{PlantPermission, Role, UserObject};

/// Whether `user` holds exactly `role`.
pub fn has_role(user: &UserObject, role: Role) -> bool {
    role.is_valid() && user.role == role
}

/// Permission of `user` on `plant_id`; `Invalid` when the plant is not
/// granted at all.
pub fn plant_permission(user: &UserObject, plant_id: &str) -> PlantPermission {
    user.plant_permissions
        .get(plant_id)
        .copied()
        .unwrap_or(PlantPermission::Invalid)
}

pub fn is_admin_of_plant(user: &UserObject, plant_id: &str) -> bool {
    plant_permission(user, plant_id) == PlantPermission::Admin
}

pub fn is_user_of_plant(user: &UserObject, plant_id: &str) -> bool {
    plant_permission(user, plant_id) == PlantPermission::User
}

pub fn has_any_access_to_plant(user: &UserObject, plant_id: &str) -> bool {
    plant_permission(user, plant_id).is_valid()
}

/// Plant ids `user` can access, sorted.
pub fn accessible_plants(user: &UserObject) -> Vec<&str> {
    user.plant_permissions
        .iter()
        .filter(|(_, permission)| permission.is_valid())
        .map(|(plant_id, _)| plant_id.as_str())
        .collect()
}
