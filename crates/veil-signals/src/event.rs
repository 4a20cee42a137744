//! Raw events as delivered by the host page

use serde::{Deserialize, Serialize};

/// A keydown as reported by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEvent {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`, when the host forwards it
    pub code: Option<String>,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Case-insensitive match on `key`
    pub fn is_key(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }

    pub fn is_any_key(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.is_key(k))
    }

    /// Ctrl on Windows/Linux or Cmd on macOS
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Match a digit either by `key` or by physical `code`. Shifted
    /// digits report their symbol as `key` on most layouts.
    pub fn is_digit(&self, digit: char) -> bool {
        let mut buf = [0u8; 4];
        let as_key: &str = digit.encode_utf8(&mut buf);
        if self.key == as_key {
            return true;
        }

        match self.code.as_deref() {
            Some(code) => code
                .strip_prefix("Digit")
                .is_some_and(|rest| rest == as_key),
            None => false,
        }
    }
}

impl std::fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (held, name) in [
            (self.ctrl, "Ctrl"),
            (self.meta, "Meta"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    KeyDown(KeyEvent),
    ContextMenu,
    VisibilityChange { hidden: bool },
    WindowBlur,
    WindowFocus,
    /// The page tried to construct the screen-recording API
    CaptureApiInvoked,
}

impl RawEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RawEvent::KeyDown(_) => "keydown",
            RawEvent::ContextMenu => "contextmenu",
            RawEvent::VisibilityChange { .. } => "visibilitychange",
            RawEvent::WindowBlur => "blur",
            RawEvent::WindowFocus => "focus",
            RawEvent::CaptureApiInvoked => "capture-api",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_matching() {
        assert!(KeyEvent::new("3").is_digit('3'));
        assert!(KeyEvent::new("#").with_code("Digit3").is_digit('3'));
        assert!(!KeyEvent::new("#").is_digit('3'));
        assert!(!KeyEvent::new("4").with_code("Digit4").is_digit('5'));
    }

    #[test]
    fn test_display_chord() {
        let event = KeyEvent::new("S").ctrl().shift();
        assert_eq!(event.to_string(), "Ctrl+Shift+S");
    }

    #[test]
    fn test_parse_host_event() {
        let event: RawEvent =
            serde_json::from_str(r#"{"type": "key_down", "key": "p", "ctrl": true}"#).unwrap();
        assert_eq!(event, RawEvent::KeyDown(KeyEvent::new("p").ctrl()));

        let event: RawEvent =
            serde_json::from_str(r#"{"type": "visibility_change", "hidden": true}"#).unwrap();
        assert_eq!(event.kind(), "visibilitychange");
    }
}
