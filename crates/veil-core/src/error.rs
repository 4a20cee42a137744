//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] veil_storage::StorageError),

    #[error("Settings error: {0}")]
    Settings(#[from] veil_config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Viewer session closed")]
    SessionClosed,
}

/// Clipboard clearing failed. Never surfaced past the viewer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard API unavailable")]
    Unavailable,

    #[error("Clipboard write rejected: {0}")]
    Rejected(String),
}

/// The capture constructor could not be replaced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureApiError {
    #[error("Capture API already overridden")]
    AlreadyOverridden,

    #[error("Capture API not available")]
    Unavailable,
}
