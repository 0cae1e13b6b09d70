//! Error types for plantkeep operations

use thiserror::Error;

/// Remote keyed store errors.
///
/// Produced by keyed store clients and surfaced unchanged through the cache
/// and the application context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object not found: {key} in container {container}")]
    NotFound { container: String, key: String },

    #[error("Version precondition failed for {key}")]
    PreconditionFailed { key: String },

    #[error("Remote store {operation} failed: {reason}")]
    Remote { operation: String, reason: String },

    #[error("Could not decode {key}: {reason}")]
    Codec { key: String, reason: String },
}

/// Remote user/group directory errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{directory} directory request failed: {reason}")]
    Remote { directory: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all plantkeep errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlantkeepError {
    #[error("Application context is not initialized")]
    NotInitialized,

    #[error("Canonical group not found: {0}")]
    GroupNotFound(String),

    #[error("Role not recognized: {0}")]
    RoleNotRecognized(String),

    #[error("Permission not recognized for group: {0}")]
    PermissionNotRecognized(String),

    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl PlantkeepError {
    /// Whether the failure came from a remote collaborator rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(self, PlantkeepError::Store(_) | PlantkeepError::Directory(_))
    }
}

/// Result type alias for plantkeep operations.
pub type PlantkeepResult<T> = Result<T, PlantkeepError>;

// =============================================================================
// TESTS
// =============================================================================
