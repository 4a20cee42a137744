//! Runtime error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Core error: {0}")]
    Core(#[from] veil_core::CoreError),

    #[error("Viewer task stopped")]
    Stopped,

    #[error("Invalid replay script: {0}")]
    InvalidScript(String),

    #[error("Viewer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
