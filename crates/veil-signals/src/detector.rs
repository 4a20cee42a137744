//! Signal detector
//!
//! Key chords are checked by three independent handlers. Each handler
//! yields at most one signal per keydown, but one keydown can satisfy
//! several handlers (Ctrl+Shift+S is both a screenshot chord and a save
//! shortcut) and then yields one signal per handler.

use crate::event::{KeyEvent, RawEvent};
use crate::signal::Signal;

/// Outcome of normalizing one raw event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// Signals for the policy evaluator, in handler order
    pub signals: Vec<Signal>,
    /// Cancel the browser default action regardless of policy
    pub prevent_default: bool,
    /// Best-effort clipboard wipe regardless of policy
    pub clear_clipboard: bool,
}

impl Detection {
    fn single(signal: Signal) -> Self {
        Self {
            signals: vec![signal],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHandler {
    Screenshot,
    DevTools,
    Shortcuts,
}

impl KeyHandler {
    pub const ALL: [KeyHandler; 3] = [
        KeyHandler::Screenshot,
        KeyHandler::DevTools,
        KeyHandler::Shortcuts,
    ];

    pub fn classify(&self, event: &KeyEvent) -> Option<Signal> {
        let matched = match self {
            KeyHandler::Screenshot => is_screenshot_chord(event),
            KeyHandler::DevTools => is_devtools_chord(event),
            KeyHandler::Shortcuts => is_shortcut_chord(event),
        };

        matched.then_some(match self {
            KeyHandler::Screenshot => Signal::ScreenshotKeyAttempt,
            KeyHandler::DevTools => Signal::DevToolsKeyAttempt,
            KeyHandler::Shortcuts => Signal::ShortcutKeyAttempt,
        })
    }
}

/// PrintScreen, Print, Windows snip (Shift+Meta+S), Ctrl+Shift+S and
/// the macOS Cmd+Shift+3/4/5 captures. All combos are checked on every
/// platform.
fn is_screenshot_chord(event: &KeyEvent) -> bool {
    if event.is_any_key(&["PrintScreen", "Print"]) {
        return true;
    }

    if event.shift && event.meta && event.is_key("s") {
        return true;
    }

    if event.ctrl && event.shift && event.is_key("s") {
        return true;
    }

    event.meta && event.shift && ['3', '4', '5'].into_iter().any(|d| event.is_digit(d))
}

/// Ctrl+Shift+I/J/C, Ctrl+U and F12
fn is_devtools_chord(event: &KeyEvent) -> bool {
    if event.is_key("F12") {
        return true;
    }

    if event.ctrl && event.shift && event.is_any_key(&["i", "j", "c"]) {
        return true;
    }

    event.ctrl && event.is_key("u")
}

/// Ctrl/Cmd + S, P, C, V
fn is_shortcut_chord(event: &KeyEvent) -> bool {
    event.has_command_modifier() && event.is_any_key(&["s", "p", "c", "v"])
}

pub struct SignalDetector {
    key_handlers: Vec<KeyHandler>,
}

impl SignalDetector {
    pub fn new() -> Self {
        Self {
            key_handlers: KeyHandler::ALL.to_vec(),
        }
    }

    /// Detector running only the given key handlers
    pub fn with_key_handlers(handlers: &[KeyHandler]) -> Self {
        Self {
            key_handlers: handlers.to_vec(),
        }
    }

    pub fn detect(&self, event: &RawEvent) -> Detection {
        let detection = match event {
            RawEvent::KeyDown(key) => self.detect_key(key),
            RawEvent::ContextMenu => Detection::single(Signal::ContextMenuAttempt),
            RawEvent::VisibilityChange { hidden: true } => Detection::single(Signal::TabHidden),
            RawEvent::VisibilityChange { hidden: false } => Detection::single(Signal::TabVisible),
            RawEvent::WindowBlur => Detection::single(Signal::WindowBlur),
            RawEvent::WindowFocus => Detection::single(Signal::WindowFocus),
            RawEvent::CaptureApiInvoked => Detection::single(Signal::RecordingApiInvoked),
        };

        if !detection.is_empty() {
            tracing::trace!(
                event = event.kind(),
                signals = ?detection.signals,
                prevent_default = detection.prevent_default,
                "Detected signals"
            );
        }

        detection
    }

    fn detect_key(&self, key: &KeyEvent) -> Detection {
        let mut detection = Detection::default();

        for handler in &self.key_handlers {
            if let Some(signal) = handler.classify(key) {
                detection.signals.push(signal);

                // The app owns screenshot chords whether or not a
                // protection is switched on for them
                if signal == Signal::ScreenshotKeyAttempt {
                    detection.prevent_default = true;
                    detection.clear_clipboard = true;
                }
            }
        }

        detection
    }
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::new()
    }
}
