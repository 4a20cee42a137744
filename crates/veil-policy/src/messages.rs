//! User-visible messages shown by warnings and the penalty overlay

pub const CONTEXT_MENU_BLOCKED: &str = "Right-click is disabled on protected content";

pub const SCREENSHOT_BLOCKED: &str =
    "Screenshot attempt detected. Protected content is hidden for a few seconds";

pub const DEVTOOLS_BLOCKED: &str = "Developer tools are disabled on protected content";

pub const SHORTCUT_BLOCKED: &str = "Keyboard shortcuts are disabled on protected content";
