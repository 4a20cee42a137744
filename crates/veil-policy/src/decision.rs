//! Policy decisions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use veil_presentation::SuppressMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    NoOp,
    ShowTransientWarning {
        message: String,
        duration: Duration,
    },
    ApplyPenalty {
        message: String,
        duration: Duration,
    },
    SuppressUntilFocusReturns {
        mode: SuppressMode,
        /// Pause whatever media is playing
        pause_media: bool,
    },
    /// Restore now, or after `defer` when set
    RestoreIfSafe {
        defer: Option<Duration>,
    },
    StartRecordingBlock {
        duration: Duration,
    },
    DisableCaptureApi,
}

impl Decision {
    pub fn is_noop(&self) -> bool {
        matches!(self, Decision::NoOp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NoOp => "no_op",
            Decision::ShowTransientWarning { .. } => "show_transient_warning",
            Decision::ApplyPenalty { .. } => "apply_penalty",
            Decision::SuppressUntilFocusReturns { .. } => "suppress_until_focus_returns",
            Decision::RestoreIfSafe { .. } => "restore_if_safe",
            Decision::StartRecordingBlock { .. } => "start_recording_block",
            Decision::DisableCaptureApi => "disable_capture_api",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
