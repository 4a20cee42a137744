//! Normalized signals

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ContextMenuAttempt,
    ScreenshotKeyAttempt,
    DevToolsKeyAttempt,
    ShortcutKeyAttempt,
    TabHidden,
    TabVisible,
    WindowBlur,
    WindowFocus,
    RecordingApiInvoked,
}

impl Signal {
    /// Signals that come from a user input whose default action the
    /// page can still cancel
    pub fn is_cancelable_input(&self) -> bool {
        matches!(
            self,
            Signal::ContextMenuAttempt
                | Signal::ScreenshotKeyAttempt
                | Signal::DevToolsKeyAttempt
                | Signal::ShortcutKeyAttempt
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::ContextMenuAttempt => "context_menu_attempt",
            Signal::ScreenshotKeyAttempt => "screenshot_key_attempt",
            Signal::DevToolsKeyAttempt => "devtools_key_attempt",
            Signal::ShortcutKeyAttempt => "shortcut_key_attempt",
            Signal::TabHidden => "tab_hidden",
            Signal::TabVisible => "tab_visible",
            Signal::WindowBlur => "window_blur",
            Signal::WindowFocus => "window_focus",
            Signal::RecordingApiInvoked => "recording_api_invoked",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
