//! Surface error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Protected content container is not mounted")]
    MissingTarget,
}
