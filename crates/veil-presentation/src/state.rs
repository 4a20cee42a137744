//! Protection state for one viewer session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::surface::{ContentStyle, Overlay};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionState {
    /// Content rendered normally (not suppressed)
    pub content_visible: bool,
    /// Blur filter requested by a blurred suppression
    pub blurred: bool,
    /// Full-screen block, mounted while `Some`
    pub overlay: Option<Overlay>,
    /// Time-locked suppression in effect
    pub penalty_active: bool,
    pub penalty_deadline: Option<DateTime<Utc>>,
    /// Short suppression after a blur while recording is blocked
    pub recording_block_active: bool,
    /// Transient banner, independent of suppression
    pub warning: Option<Overlay>,
    /// Last reported document visibility
    pub tab_hidden: bool,
    /// Capture constructor already replaced for this session
    pub capture_api_disabled: bool,
}

impl ProtectionState {
    pub fn new() -> Self {
        Self {
            content_visible: true,
            blurred: false,
            overlay: None,
            penalty_active: false,
            penalty_deadline: None,
            recording_block_active: false,
            warning: None,
            tab_hidden: false,
            capture_api_disabled: false,
        }
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn surface_state(&self) -> SurfaceState {
        if self.penalty_active {
            SurfaceState::PenaltyLocked
        } else if !self.content_visible {
            SurfaceState::SuppressedTransient
        } else {
            SurfaceState::Visible
        }
    }

    /// Style the content container should currently have
    pub fn content_style(&self) -> ContentStyle {
        ContentStyle {
            visible: self.content_visible && !self.recording_block_active,
            blurred: self.blurred,
        }
    }
}

impl Default for ProtectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Protected surface state machine
///
/// ```text
/// Visible ⇄ SuppressedTransient
///    ↓            ↓
///   PenaltyLocked ──(penalty timer)──→ Visible
/// ```
/// `PenaltyLocked` only leaves through its own expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Visible,
    SuppressedTransient,
    PenaltyLocked,
}

impl SurfaceState {
    pub fn can_transition_to(&self, target: SurfaceState) -> bool {
        match (self, target) {
            (SurfaceState::Visible, SurfaceState::SuppressedTransient) => true,
            (SurfaceState::SuppressedTransient, SurfaceState::Visible) => true,
            (SurfaceState::Visible, SurfaceState::PenaltyLocked) => true,
            (SurfaceState::SuppressedTransient, SurfaceState::PenaltyLocked) => true,
            (SurfaceState::PenaltyLocked, SurfaceState::Visible) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceState::Visible => "visible",
            SurfaceState::SuppressedTransient => "suppressed_transient",
            SurfaceState::PenaltyLocked => "penalty_locked",
        }
    }
}

impl std::fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(SurfaceState::Visible.can_transition_to(SurfaceState::SuppressedTransient));
        assert!(SurfaceState::SuppressedTransient.can_transition_to(SurfaceState::Visible));
        assert!(SurfaceState::Visible.can_transition_to(SurfaceState::PenaltyLocked));
        assert!(SurfaceState::SuppressedTransient.can_transition_to(SurfaceState::PenaltyLocked));
        assert!(SurfaceState::PenaltyLocked.can_transition_to(SurfaceState::Visible));
    }

    #[test]
    fn test_penalty_is_absorbing() {
        assert!(!SurfaceState::PenaltyLocked.can_transition_to(SurfaceState::SuppressedTransient));
    }

    #[test]
    fn test_derived_state() {
        let mut state = ProtectionState::new();
        assert_eq!(state.surface_state(), SurfaceState::Visible);
        assert_eq!(state.content_style(), ContentStyle::VISIBLE);

        state.recording_block_active = true;
        assert_eq!(state.surface_state(), SurfaceState::Visible);
        assert!(!state.content_style().visible);

        state.content_visible = false;
        assert_eq!(state.surface_state(), SurfaceState::SuppressedTransient);

        state.penalty_active = true;
        assert_eq!(state.surface_state(), SurfaceState::PenaltyLocked);
    }
}
