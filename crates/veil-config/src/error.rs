//! Configuration error types

use thiserror::Error;

use crate::tier::ConfigTier;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Storage error: {0}")]
    Storage(#[from] veil_storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown protection flag: {0}")]
    UnknownFlag(String),

    #[error("Unknown config tier: {0}")]
    UnknownTier(String),

    #[error("Tier {0} cannot be overridden per scope")]
    NotOverridable(ConfigTier),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Override scope cannot be empty")]
    EmptyScope,
}
