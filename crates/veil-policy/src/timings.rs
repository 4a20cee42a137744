//! Policy durations

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Durations attached to decisions, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTimings {
    pub warning_ms: u64,
    pub penalty_ms: u64,
    pub recording_flash_ms: u64,
    /// Gives a penalty raised by the same focus change time to land
    pub focus_restore_defer_ms: u64,
}

impl PolicyTimings {
    pub fn warning(&self) -> Duration {
        Duration::from_millis(self.warning_ms)
    }

    pub fn penalty(&self) -> Duration {
        Duration::from_millis(self.penalty_ms)
    }

    pub fn recording_flash(&self) -> Duration {
        Duration::from_millis(self.recording_flash_ms)
    }

    pub fn focus_restore_defer(&self) -> Duration {
        Duration::from_millis(self.focus_restore_defer_ms)
    }
}

impl Default for PolicyTimings {
    fn default() -> Self {
        Self {
            warning_ms: 20_000,
            penalty_ms: 3_000,
            recording_flash_ms: 2_000,
            focus_restore_defer_ms: 50,
        }
    }
}
