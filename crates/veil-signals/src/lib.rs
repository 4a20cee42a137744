//! Veil Signal Detection
//!
//! Turns raw browser events into decision-agnostic signals:
//! - Context menu, screenshot, devtools and shortcut key chords
//! - Tab visibility and window focus changes
//! - Attempts to construct the screen-recording API
//!
//! No policy lives here. The only unconditional behaviour is that
//! screenshot chords always have their default action prevented.

mod detector;
mod event;
mod signal;

pub use detector::{Detection, KeyHandler, SignalDetector};
pub use event::{KeyEvent, RawEvent};
pub use signal::Signal;
