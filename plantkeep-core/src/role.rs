//! Role and plant permission enums.
//!
//! Both are stored remotely as plain integers. Anything that does not decode
//! to a known variant (out-of-range numbers, strings, null, a missing field)
//! becomes `Invalid`, so predicates never range-check raw values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ============================================================================
// ROLE
// ============================================================================

/// Canonical application role of a user.
///
/// Roles are compared for equality only. There is no hierarchy: a
/// `LocalAdmin` check does not pass for a `GlobalAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    LocalUser,
    LocalAdmin,
    GlobalUser,
    GlobalAdmin,
    /// Any stored value outside the four roles above.
    #[default]
    Invalid,
}

impl Role {
    /// The four valid roles, in storage-code order.
    pub const ALL: [Role; 4] = [
        Role::LocalUser,
        Role::LocalAdmin,
        Role::GlobalUser,
        Role::GlobalAdmin,
    ];

    /// Decode a stored integer code.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Role::LocalUser,
            1 => Role::LocalAdmin,
            2 => Role::GlobalUser,
            3 => Role::GlobalAdmin,
            _ => Role::Invalid,
        }
    }

    /// Decode an arbitrary stored JSON value.
    pub fn from_value(value: &Value) -> Self {
        value.as_i64().map(Self::from_code).unwrap_or(Role::Invalid)
    }

    /// Storage code, `None` for `Invalid`.
    pub fn code(&self) -> Option<i64> {
        match self {
            Role::LocalUser => Some(0),
            Role::LocalAdmin => Some(1),
            Role::GlobalUser => Some(2),
            Role::GlobalAdmin => Some(3),
            Role::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Role::Invalid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LocalUser => "LocalUser",
            Role::LocalAdmin => "LocalAdmin",
            Role::GlobalUser => "GlobalUser",
            Role::GlobalAdmin => "GlobalAdmin",
            Role::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.code() {
            Some(code) => serializer.serialize_i64(code),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Role::from_value(&value))
    }
}

// ============================================================================
// PLANT PERMISSION
// ============================================================================

/// Permission level of a user on one plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlantPermission {
    User,
    Admin,
    /// Absent from the user's mapping, or a stored value outside `{User, Admin}`.
    #[default]
    Invalid,
}

impl PlantPermission {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PlantPermission::User,
            1 => PlantPermission::Admin,
            _ => PlantPermission::Invalid,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        value
            .as_i64()
            .map(Self::from_code)
            .unwrap_or(PlantPermission::Invalid)
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            PlantPermission::User => Some(0),
            PlantPermission::Admin => Some(1),
            PlantPermission::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, PlantPermission::Invalid)
    }
}

impl fmt::Display for PlantPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlantPermission::User => "User",
            PlantPermission::Admin => "Admin",
            PlantPermission::Invalid => "Invalid",
        };
        write!(f, "{}", name)
    }
}

impl Serialize for PlantPermission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.code() {
            Some(code) => serializer.serialize_i64(code),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for PlantPermission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(PlantPermission::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_role_codes_decode() {
        assert_eq!(Role::from_value(&json!(0)), Role::LocalUser);
        assert_eq!(Role::from_value(&json!(1)), Role::LocalAdmin);
        assert_eq!(Role::from_value(&json!(2)), Role::GlobalUser);
        assert_eq!(Role::from_value(&json!(3)), Role::GlobalAdmin);
    }

    #[test]
    fn test_role_non_numeric_is_invalid() {
        assert_eq!(Role::from_value(&json!(null)), Role::Invalid);
        assert_eq!(Role::from_value(&json!("GlobalAdmin")), Role::Invalid);
        assert_eq!(Role::from_value(&json!(2.5)), Role::Invalid);
        assert_eq!(Role::from_value(&json!([3])), Role::Invalid);
    }

    #[test]
    fn test_role_serializes_as_code_or_null() {
        assert_eq!(serde_json::to_value(Role::GlobalAdmin).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(Role::Invalid).unwrap(), json!(null));
    }

    #[test]
    fn test_permission_decode() {
        assert_eq!(PlantPermission::from_value(&json!(0)), PlantPermission::User);
        assert_eq!(PlantPermission::from_value(&json!(1)), PlantPermission::Admin);
        assert_eq!(PlantPermission::from_value(&json!(2)), PlantPermission::Invalid);
        assert_eq!(PlantPermission::from_value(&json!(-1)), PlantPermission::Invalid);
        assert_eq!(PlantPermission::from_value(&json!("admin")), PlantPermission::Invalid);
    }

    #[test]
    fn test_role_all_excludes_invalid() {
        assert_eq!(Role::ALL.len(), 4);
        assert!(Role::ALL.iter().all(Role::is_valid));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_out_of_range_role_is_invalid(code in any::<i64>().prop_filter("out of range", |c| !(0..=3).contains(c))) {
            prop_assert_eq!(Role::from_code(code), Role::Invalid);
            let decoded: Role = serde_json::from_value(json!(code)).unwrap();
            prop_assert_eq!(decoded, Role::Invalid);
        }

        #[test]
        fn prop_valid_role_code_roundtrips(code in 0i64..=3) {
            let role = Role::from_code(code);
            prop_assert!(role.is_valid());
            prop_assert_eq!(role.code(), Some(code));
        }

        #[test]
        fn prop_out_of_range_permission_is_invalid(code in any::<i64>().prop_filter("out of range", |c| !(0..=1).contains(c))) {
            prop_assert_eq!(PlantPermission::from_code(code), PlantPermission::Invalid);
        }
    }
}
