//! Veil Runtime
//!
//! Drives protected viewers on tokio: each viewer gets a task that
//! reacts to host events, config republishes and its own timer
//! deadlines. Also hosts the deterministic replay used by `veil-replay`.

mod clock;
mod error;
mod replay;
mod runtime;

pub use clock::TokioClock;
pub use error::RuntimeError;
pub use replay::{replay, EventEntry, ReplayReport, ReplayScript, ReplayStep, TimerEntry};
pub use runtime::{ViewerHandle, ViewerRuntime};

pub type Result<T> = std::result::Result<T, RuntimeError>;
