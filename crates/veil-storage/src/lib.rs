//! Veil Storage Layer
//!
//! Local SQLite cache for protection settings. Nothing here is security
//! state: viewer sessions never persist, only the tier overrides and
//! defaults that feed the settings provider.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
