//! Identifying attributes of one application instance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Opaque id of the remote container (asset) holding an application's objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Who and where an application context lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextAttributes {
    /// Tenant whose store holds the container.
    pub storage_tenant: String,
    pub application_id: String,
    pub container_id: ContainerId,
    /// Tenant owning the application; groups are listed here.
    pub owner_tenant: String,
    pub subtenant: Option<String>,
}

impl ContextAttributes {
    pub fn new(
        storage_tenant: impl Into<String>,
        application_id: impl Into<String>,
        container_id: impl Into<String>,
        owner_tenant: impl Into<String>,
    ) -> Self {
        Self {
            storage_tenant: storage_tenant.into(),
            application_id: application_id.into(),
            container_id: ContainerId::new(container_id),
            owner_tenant: owner_tenant.into(),
            subtenant: None,
        }
    }

    /// Load attributes from the process environment.
    ///
    /// Environment variables:
    /// - `PLANTKEEP_STORAGE_TENANT` (required)
    /// - `PLANTKEEP_APPLICATION_ID` (required)
    /// - `PLANTKEEP_CONTAINER_ID` (required)
    /// - `PLANTKEEP_OWNER_TENANT` (default: the storage tenant)
    /// - `PLANTKEEP_SUBTENANT` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &str| {
            read(name).ok_or_else(|| ConfigError::MissingRequired {
                field: name.to_string(),
            })
        };

        let storage_tenant = require("PLANTKEEP_STORAGE_TENANT")?;
        let application_id = require("PLANTKEEP_APPLICATION_ID")?;
        let container_id = require("PLANTKEEP_CONTAINER_ID")?;
        let owner_tenant = read("PLANTKEEP_OWNER_TENANT").unwrap_or_else(|| storage_tenant.clone());

        let attributes = Self {
            storage_tenant,
            application_id,
            container_id: ContainerId::new(container_id),
            owner_tenant,
            subtenant: read("PLANTKEEP_SUBTENANT"),
        };
        attributes.validate()?;
        Ok(attributes)
    }

    pub fn with_subtenant(mut self, subtenant: impl Into<String>) -> Self {
        self.subtenant = Some(subtenant.into());
        self
    }

    /// Reject attributes with empty required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("storage_tenant", self.storage_tenant.as_str()),
            ("application_id", self.application_id.as_str()),
            ("container_id", self.container_id.as_str()),
            ("owner_tenant", self.owner_tenant.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }
        if matches!(&self.subtenant, Some(s) if s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "subtenant".to_string(),
                value: String::new(),
                reason: "must be omitted rather than empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_validate_accepts_complete_attributes() {
        let attrs = ContextAttributes::new("t100", "plants", "4711", "t100").with_subtenant("s1");
        assert!(attrs.validate().is_ok());
        assert_eq!(attrs.container_id.as_str(), "4711");
    }

    #[test]
    fn test_validate_rejects_missing_container() {
        let attrs = ContextAttributes::new("t100", "plants", " ", "t100");
        assert_eq!(
            attrs.validate(),
            Err(ConfigError::MissingRequired {
                field: "container_id".to_string()
            })
        );
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("PLANTKEEP_STORAGE_TENANT", "t100"),
            ("PLANTKEEP_APPLICATION_ID", "plants"),
            ("PLANTKEEP_CONTAINER_ID", " 4711 "),
            ("PLANTKEEP_SUBTENANT", ""),
        ]
        .into_iter()
        .collect();

        let attrs = ContextAttributes::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(attrs.container_id.as_str(), "4711");
        assert_eq!(attrs.owner_tenant, "t100");
        assert_eq!(attrs.subtenant, None);
    }

    #[test]
    fn test_from_lookup_missing_application() {
        let err = ContextAttributes::from_lookup(|k| {
            (k != "PLANTKEEP_APPLICATION_ID").then(|| "x".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired {
                field: "PLANTKEEP_APPLICATION_ID".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_empty_subtenant() {
        let attrs = ContextAttributes::new("t100", "plants", "4711", "t100").with_subtenant("");
        assert!(matches!(attrs.validate(), Err(ConfigError::InvalidValue { .. })));
    }
}
