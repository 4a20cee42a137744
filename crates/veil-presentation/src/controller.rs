//! Presentation controller
//!
//! Sole owner of [`ProtectionState`]. The policy layer only asks for
//! transitions; every change lands here and is pushed to the surface in
//! the same call, so a suppression is on screen before the caller
//! returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{deadline_after, Clock};
use crate::state::{ProtectionState, SurfaceState};
use crate::surface::{ContentStyle, Overlay, Surface};
use crate::timer::{ScheduledTimer, TimerPurpose, TimerRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressMode {
    /// Flat hide, used by the screenshot penalty
    Instant,
    /// Hide plus blur filter, used when focus leaves the window
    Blurred,
}

pub struct PresentationController {
    state: ProtectionState,
    timers: TimerRegistry,
    clock: Arc<dyn Clock>,
    /// What the surface last accepted, to avoid duplicate pushes
    applied_style: Option<ContentStyle>,
    shown_overlay: Option<Overlay>,
    shown_warning: Option<Overlay>,
}

impl PresentationController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: ProtectionState::new(),
            timers: TimerRegistry::new(),
            clock,
            applied_style: None,
            shown_overlay: None,
            shown_warning: None,
        }
    }

    pub fn state(&self) -> &ProtectionState {
        &self.state
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.state.surface_state()
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.next_deadline()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Push the initial state once the viewer is mounted
    pub fn mount<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.sync(surface);
    }

    /// Record document visibility. Restores are refused while hidden, and
    /// a recording block held back by the hidden tab ends once it returns.
    pub fn note_tab_hidden<S: Surface + ?Sized>(&mut self, hidden: bool, surface: &mut S) {
        self.state.tab_hidden = hidden;

        if !hidden
            && self.state.recording_block_active
            && !self.timers.is_armed(TimerPurpose::RecordingFlash)
        {
            self.end_recording_block(surface);
        }
    }

    pub fn mark_capture_api_disabled(&mut self) {
        self.state.capture_api_disabled = true;
    }

    /// Hide the content now. Any pending deferred restore is dropped.
    pub fn suppress<S: Surface + ?Sized>(&mut self, mode: SuppressMode, surface: &mut S) {
        let before = self.surface_state();

        self.timers.cancel(TimerPurpose::FocusRestoreDefer);
        self.state.content_visible = false;
        if mode == SuppressMode::Blurred {
            self.state.blurred = true;
        }

        self.sync(surface);
        self.log_transition(before, "suppress");
    }

    /// Show the content again unless a penalty holds the lock or the tab
    /// is hidden. Returns whether the content was restored.
    pub fn restore<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if self.state.penalty_active {
            tracing::debug!("Restore refused: penalty active");
            return false;
        }

        if self.state.tab_hidden {
            tracing::debug!("Restore refused: tab hidden");
            return false;
        }

        self.reveal(surface, "restore");
        true
    }

    /// Restore after `delay`, giving a penalty raised in the meantime the
    /// chance to take the lock first
    pub fn schedule_restore(&mut self, delay: Duration) -> DateTime<Utc> {
        let deadline = deadline_after(self.clock.now(), delay);
        self.timers.arm(TimerPurpose::FocusRestoreDefer, deadline);
        deadline
    }

    /// Start or restart the penalty window. The previous expiry, if any,
    /// is replaced: the last attempt resets the clock.
    pub fn arm_penalty(&mut self, duration: Duration) -> DateTime<Utc> {
        let deadline = deadline_after(self.clock.now(), duration);
        self.state.penalty_active = true;
        self.state.penalty_deadline = Some(deadline);
        self.timers.arm(TimerPurpose::Penalty, deadline);
        deadline
    }

    /// Instant suppression, penalty overlay and penalty timer
    pub fn apply_penalty<S: Surface + ?Sized>(
        &mut self,
        message: &str,
        duration: Duration,
        surface: &mut S,
    ) {
        let before = self.surface_state();

        self.suppress(SuppressMode::Instant, surface);
        self.state.overlay = Some(Overlay::penalty(message));
        let deadline = self.arm_penalty(duration);

        self.sync(surface);
        tracing::debug!(deadline = %deadline, "Penalty armed");
        self.log_transition(before, "penalty");
    }

    /// Show the banner; a repeat call restarts its timer
    pub fn show_warning<S: Surface + ?Sized>(
        &mut self,
        message: &str,
        duration: Duration,
        surface: &mut S,
    ) {
        self.state.warning = Some(Overlay::warning(message));
        let deadline = deadline_after(self.clock.now(), duration);
        self.timers.arm(TimerPurpose::Warning, deadline);
        self.sync(surface);
    }

    pub fn start_recording_block<S: Surface + ?Sized>(
        &mut self,
        duration: Duration,
        surface: &mut S,
    ) {
        self.state.recording_block_active = true;
        let deadline = deadline_after(self.clock.now(), duration);
        self.timers.arm(TimerPurpose::RecordingFlash, deadline);
        self.sync(surface);
    }

    /// Run every timer that is due, earliest first
    pub fn fire_due<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Vec<ScheduledTimer> {
        let expired = self.timers.take_expired(self.clock.now());

        for timer in &expired {
            tracing::debug!(timer = %timer.purpose, "Timer fired");

            match timer.purpose {
                TimerPurpose::Penalty => self.expire_penalty(surface),
                TimerPurpose::Warning => {
                    self.state.warning = None;
                    self.sync(surface);
                }
                TimerPurpose::RecordingFlash => self.end_recording_block(surface),
                TimerPurpose::FocusRestoreDefer => {
                    self.restore(surface);
                }
            }
        }

        expired
    }

    /// Drop every pending timer. Used on teardown.
    pub fn cancel_all(&mut self) -> usize {
        self.timers.cancel_all()
    }

    // The penalty owns the lock it releases, so its expiry skips the
    // checks `restore` applies
    fn expire_penalty<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.state.penalty_active = false;
        self.state.penalty_deadline = None;
        self.reveal(surface, "penalty expired");
    }

    fn end_recording_block<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.state.tab_hidden || self.state.penalty_active {
            tracing::debug!(
                tab_hidden = self.state.tab_hidden,
                penalty_active = self.state.penalty_active,
                "Recording block held until next restore"
            );
            return;
        }

        self.state.recording_block_active = false;
        self.sync(surface);
    }

    fn reveal<S: Surface + ?Sized>(&mut self, surface: &mut S, reason: &'static str) {
        let before = self.surface_state();

        self.state.content_visible = true;
        self.state.blurred = false;
        self.state.overlay = None;

        // A flash still counting down keeps its own window
        if self.state.recording_block_active && !self.timers.is_armed(TimerPurpose::RecordingFlash)
        {
            self.state.recording_block_active = false;
        }

        self.sync(surface);
        self.log_transition(before, reason);
    }

    fn sync<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let style = self.state.content_style();
        if self.applied_style != Some(style) {
            match surface.set_content_style(style) {
                Ok(()) => self.applied_style = Some(style),
                // Retried on the next change
                Err(e) => tracing::debug!("Content style not applied: {}", e),
            }
        }

        if self.shown_overlay != self.state.overlay {
            surface.set_overlay(self.state.overlay.as_ref());
            self.shown_overlay = self.state.overlay.clone();
        }

        if self.shown_warning != self.state.warning {
            surface.set_warning(self.state.warning.as_ref());
            self.shown_warning = self.state.warning.clone();
        }
    }

    fn log_transition(&self, before: SurfaceState, reason: &'static str) {
        let after = self.surface_state();
        if before == after {
            return;
        }

        if before.can_transition_to(after) {
            tracing::debug!(from = %before, to = %after, reason, "Surface state transition");
        } else {
            tracing::warn!(from = %before, to = %after, reason, "Unexpected surface state transition");
        }
    }
}
