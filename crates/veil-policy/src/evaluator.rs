//! Policy evaluator
//!
//! | Signal               | Enabled by                        | Decision                       |
//! |----------------------|-----------------------------------|--------------------------------|
//! | ContextMenuAttempt   | block_right_click                 | ShowTransientWarning           |
//! | ScreenshotKeyAttempt | block_print_screen, anti_screenshot | ApplyPenalty                 |
//! | DevToolsKeyAttempt   | block_keyboard                    | ShowTransientWarning           |
//! | ShortcutKeyAttempt   | block_shortcuts                   | ShowTransientWarning           |
//! | TabHidden            | tab_focus_protection              | Suppress (instant), pause media |
//! | TabVisible           | tab_focus_protection              | RestoreIfSafe                  |
//! | WindowBlur           | anti_screenshot, block_print_screen | Suppress (blurred)           |
//! | WindowFocus          | anti_screenshot, block_print_screen | RestoreIfSafe, deferred      |
//! | WindowBlur           | block_media_recorder              | StartRecordingBlock            |
//! | RecordingApiInvoked  | block_media_recorder              | DisableCaptureApi              |
//!
//! A restore requested while a penalty is running is a no-op.

use veil_config::ProtectionConfig;
use veil_presentation::{ProtectionState, SuppressMode};
use veil_signals::Signal;

use crate::decision::Decision;
use crate::messages;
use crate::timings::PolicyTimings;

#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    timings: PolicyTimings,
}

impl PolicyEvaluator {
    pub fn new(timings: PolicyTimings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> &PolicyTimings {
        &self.timings
    }

    /// Every decision `signal` triggers, in table order. Yields a single
    /// `NoOp` when nothing applies.
    pub fn evaluate(
        &self,
        signal: Signal,
        config: &ProtectionConfig,
        state: &ProtectionState,
    ) -> Vec<Decision> {
        let mut decisions = Vec::new();

        match signal {
            Signal::ContextMenuAttempt if config.block_right_click => {
                decisions.push(self.warning(messages::CONTEXT_MENU_BLOCKED));
            }
            Signal::ScreenshotKeyAttempt if config.guards_screenshots() => {
                decisions.push(Decision::ApplyPenalty {
                    message: messages::SCREENSHOT_BLOCKED.to_string(),
                    duration: self.timings.penalty(),
                });
            }
            Signal::DevToolsKeyAttempt if config.block_keyboard => {
                decisions.push(self.warning(messages::DEVTOOLS_BLOCKED));
            }
            Signal::ShortcutKeyAttempt if config.block_shortcuts => {
                decisions.push(self.warning(messages::SHORTCUT_BLOCKED));
            }
            Signal::TabHidden if config.tab_focus_protection => {
                decisions.push(Decision::SuppressUntilFocusReturns {
                    mode: SuppressMode::Instant,
                    pause_media: true,
                });
            }
            Signal::TabVisible if config.tab_focus_protection => {
                decisions.push(restore_if_safe(state, None));
            }
            Signal::WindowBlur => {
                if config.guards_screenshots() {
                    decisions.push(Decision::SuppressUntilFocusReturns {
                        mode: SuppressMode::Blurred,
                        pause_media: false,
                    });
                }
                if config.block_media_recorder {
                    decisions.push(Decision::StartRecordingBlock {
                        duration: self.timings.recording_flash(),
                    });
                }
            }
            Signal::WindowFocus if config.guards_screenshots() => {
                decisions.push(restore_if_safe(
                    state,
                    Some(self.timings.focus_restore_defer()),
                ));
            }
            Signal::RecordingApiInvoked
                if config.block_media_recorder && !state.capture_api_disabled =>
            {
                decisions.push(Decision::DisableCaptureApi);
            }
            _ => {}
        }

        if decisions.is_empty() {
            decisions.push(Decision::NoOp);
        }

        tracing::debug!(
            signal = %signal,
            decisions = ?decisions.iter().map(Decision::as_str).collect::<Vec<_>>(),
            "Evaluated signal"
        );

        decisions
    }

    fn warning(&self, message: &str) -> Decision {
        Decision::ShowTransientWarning {
            message: message.to_string(),
            duration: self.timings.warning(),
        }
    }
}

fn restore_if_safe(state: &ProtectionState, defer: Option<std::time::Duration>) -> Decision {
    if state.penalty_active {
        Decision::NoOp
    } else {
        Decision::RestoreIfSafe { defer }
    }
}
