//! Environment port
//!
//! Everything the viewer does to the page goes through [`Environment`]:
//! the surface outputs plus the handful of side effects that are not
//! presentation (default actions, clipboard, media, capture API).

use serde::Serialize;

use veil_presentation::{ContentStyle, Overlay, Surface, SurfaceError};

use crate::error::{CaptureApiError, ClipboardError};

pub trait Environment: Surface {
    /// Cancel the browser default action of the event being handled
    fn prevent_default(&mut self);

    /// Best-effort clipboard wipe
    fn clear_clipboard(&mut self) -> Result<(), ClipboardError>;

    /// Pause playing media. Returns whether anything was playing.
    fn pause_media(&mut self) -> bool;

    /// Replace the capture constructor with one that always fails
    fn disable_capture_api(&mut self) -> Result<(), CaptureApiError>;

    fn set_picture_in_picture_allowed(&mut self, allowed: bool);
}

/// One call made on a [`RecordingEnvironment`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EnvCall {
    ContentStyle { style: ContentStyle },
    Overlay { overlay: Option<Overlay> },
    Warning { warning: Option<Overlay> },
    PreventDefault,
    ClearClipboard,
    PauseMedia { paused: bool },
    DisableCaptureApi,
    PictureInPicture { allowed: bool },
}

/// Environment with no page behind it. Records every call and keeps the
/// observable outputs so tests and replays can inspect them.
#[derive(Debug, Clone)]
pub struct RecordingEnvironment {
    calls: Vec<EnvCall>,
    content_mounted: bool,
    clipboard_available: bool,
    media_playing: bool,
    capture_api_present: bool,
    capture_api_overridden: bool,
    content_style: Option<ContentStyle>,
    overlay: Option<Overlay>,
    warning: Option<Overlay>,
    picture_in_picture_allowed: bool,
}

impl RecordingEnvironment {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            content_mounted: true,
            clipboard_available: true,
            media_playing: false,
            capture_api_present: true,
            capture_api_overridden: false,
            content_style: None,
            overlay: None,
            warning: None,
            picture_in_picture_allowed: true,
        }
    }

    pub fn with_media_playing(mut self) -> Self {
        self.media_playing = true;
        self
    }

    pub fn without_clipboard(mut self) -> Self {
        self.clipboard_available = false;
        self
    }

    pub fn without_capture_api(mut self) -> Self {
        self.capture_api_present = false;
        self
    }

    /// Content container not in the page yet
    pub fn unmounted(mut self) -> Self {
        self.content_mounted = false;
        self
    }

    pub fn mount_content(&mut self) {
        self.content_mounted = true;
    }

    pub fn start_media(&mut self) {
        self.media_playing = true;
    }

    pub fn calls(&self) -> &[EnvCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EnvCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, call: &EnvCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn default_prevented(&self) -> usize {
        self.count(&EnvCall::PreventDefault)
    }

    pub fn content_style(&self) -> Option<ContentStyle> {
        self.content_style
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn warning(&self) -> Option<&Overlay> {
        self.warning.as_ref()
    }

    pub fn media_playing(&self) -> bool {
        self.media_playing
    }

    pub fn capture_api_overridden(&self) -> bool {
        self.capture_api_overridden
    }

    pub fn picture_in_picture_allowed(&self) -> bool {
        self.picture_in_picture_allowed
    }
}

impl Default for RecordingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RecordingEnvironment {
    fn set_content_style(&mut self, style: ContentStyle) -> Result<(), SurfaceError> {
        if !self.content_mounted {
            return Err(SurfaceError::MissingTarget);
        }

        self.content_style = Some(style);
        self.calls.push(EnvCall::ContentStyle { style });
        Ok(())
    }

    fn set_overlay(&mut self, overlay: Option<&Overlay>) {
        self.overlay = overlay.cloned();
        self.calls.push(EnvCall::Overlay {
            overlay: overlay.cloned(),
        });
    }

    fn set_warning(&mut self, warning: Option<&Overlay>) {
        self.warning = warning.cloned();
        self.calls.push(EnvCall::Warning {
            warning: warning.cloned(),
        });
    }
}

impl Environment for RecordingEnvironment {
    fn prevent_default(&mut self) {
        self.calls.push(EnvCall::PreventDefault);
    }

    fn clear_clipboard(&mut self) -> Result<(), ClipboardError> {
        if !self.clipboard_available {
            return Err(ClipboardError::Unavailable);
        }

        self.calls.push(EnvCall::ClearClipboard);
        Ok(())
    }

    fn pause_media(&mut self) -> bool {
        let paused = std::mem::replace(&mut self.media_playing, false);
        self.calls.push(EnvCall::PauseMedia { paused });
        paused
    }

    fn disable_capture_api(&mut self) -> Result<(), CaptureApiError> {
        if !self.capture_api_present {
            return Err(CaptureApiError::Unavailable);
        }

        if self.capture_api_overridden {
            return Err(CaptureApiError::AlreadyOverridden);
        }

        self.capture_api_overridden = true;
        self.calls.push(EnvCall::DisableCaptureApi);
        Ok(())
    }

    fn set_picture_in_picture_allowed(&mut self, allowed: bool) {
        self.picture_in_picture_allowed = allowed;
        self.calls.push(EnvCall::PictureInPicture { allowed });
    }
}
