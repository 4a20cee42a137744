//! Protected viewer session
//!
//! One viewer per mounted piece of protected content. Events flow
//! detector → evaluator → controller → environment inside a single
//! `handle_event` call, so a blocked screenshot is hidden before the
//! call returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use veil_config::ProtectionConfig;
use veil_policy::{Decision, PolicyEvaluator, PolicyTimings};
use veil_presentation::{Clock, PresentationController, ProtectionState, SurfaceState, TimerPurpose};
use veil_signals::{RawEvent, SignalDetector};

use crate::environment::Environment;
use crate::error::{CaptureApiError, CoreError};
use crate::Result;

/// Watermark layers the host should render over the content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkLayers {
    pub visual: bool,
    pub forensic: bool,
    pub overlay: bool,
}

impl WatermarkLayers {
    pub fn from_config(config: &ProtectionConfig) -> Self {
        Self {
            visual: config.visual_watermark,
            forensic: config.forensic_watermark,
            overlay: config.watermark_overlay,
        }
    }

    pub fn any(&self) -> bool {
        self.visual || self.forensic || self.overlay
    }
}

/// Point-in-time view of a session, for hosts and replays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub session_id: Uuid,
    pub surface: SurfaceState,
    pub state: ProtectionState,
    pub config: ProtectionConfig,
    pub watermarks: WatermarkLayers,
    pub next_deadline: Option<DateTime<Utc>>,
    pub closed: bool,
}

pub struct ProtectedViewer<E: Environment> {
    session_id: Uuid,
    detector: SignalDetector,
    evaluator: PolicyEvaluator,
    controller: PresentationController,
    environment: E,
    config: ProtectionConfig,
    closed: bool,
}

impl<E: Environment> ProtectedViewer<E> {
    pub fn new(
        environment: E,
        config: ProtectionConfig,
        timings: PolicyTimings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut viewer = Self {
            session_id: Uuid::new_v4(),
            detector: SignalDetector::new(),
            evaluator: PolicyEvaluator::new(timings),
            controller: PresentationController::new(clock),
            environment,
            config: ProtectionConfig::default(),
            closed: false,
        };

        viewer.controller.mount(&mut viewer.environment);
        viewer.install_config(config);

        tracing::info!(
            session_id = %viewer.session_id,
            flags = ?config.enabled_flags(),
            "Protected viewer opened"
        );

        viewer
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn state(&self) -> &ProtectionState {
        self.controller.state()
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.controller.surface_state()
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handle one raw event, returning the decisions that were applied
    pub fn handle_event(&mut self, event: &RawEvent) -> Result<Vec<Decision>> {
        self.ensure_open()?;

        // Timers that came due before this event run first
        self.controller.fire_due(&mut self.environment);

        let detection = self.detector.detect(event);

        let mut prevented = detection.prevent_default;
        if detection.prevent_default {
            self.environment.prevent_default();
        }

        if detection.clear_clipboard {
            if let Err(e) = self.environment.clear_clipboard() {
                tracing::debug!(session_id = %self.session_id, "Clipboard not cleared: {}", e);
            }
        }

        if let RawEvent::VisibilityChange { hidden } = event {
            self.controller
                .note_tab_hidden(*hidden, &mut self.environment);
        }

        let mut applied = Vec::new();
        for signal in detection.signals {
            let decisions = self
                .evaluator
                .evaluate(signal, &self.config, self.controller.state());

            for decision in decisions {
                if signal.is_cancelable_input() && !decision.is_noop() && !prevented {
                    self.environment.prevent_default();
                    prevented = true;
                }

                tracing::debug!(
                    session_id = %self.session_id,
                    signal = %signal,
                    decision = %decision,
                    "Applying decision"
                );

                self.apply(&decision);
                applied.push(decision);
            }
        }

        Ok(applied)
    }

    /// Fire every timer that is due
    pub fn advance(&mut self) -> Result<Vec<TimerPurpose>> {
        self.ensure_open()?;

        let fired = self
            .controller
            .fire_due(&mut self.environment)
            .into_iter()
            .map(|timer| timer.purpose)
            .collect();

        Ok(fired)
    }

    /// Replace the whole configuration. Takes effect for the next signal.
    pub fn apply_config(&mut self, config: ProtectionConfig) -> Result<()> {
        self.ensure_open()?;

        if config == self.config {
            return Ok(());
        }

        self.install_config(config);

        tracing::info!(
            session_id = %self.session_id,
            flags = ?config.enabled_flags(),
            "Protection config replaced"
        );

        Ok(())
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        if self.closed {
            return None;
        }
        self.controller.next_deadline()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            session_id: self.session_id,
            surface: self.controller.surface_state(),
            state: self.controller.state().clone(),
            config: self.config,
            watermarks: WatermarkLayers::from_config(&self.config),
            next_deadline: self.next_deadline(),
            closed: self.closed,
        }
    }

    /// Cancel all pending timers. Later events fail with `SessionClosed`.
    pub fn teardown(&mut self) -> usize {
        if self.closed {
            return 0;
        }

        self.closed = true;
        let cancelled = self.controller.cancel_all();

        tracing::info!(
            session_id = %self.session_id,
            cancelled,
            "Protected viewer closed"
        );

        cancelled
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(CoreError::SessionClosed);
        }
        Ok(())
    }

    fn install_config(&mut self, config: ProtectionConfig) {
        let previous = std::mem::replace(&mut self.config, config);

        if config.block_media_recorder && !previous.block_media_recorder {
            self.disable_capture_api();
        }

        if config.block_pip != previous.block_pip {
            self.environment.set_picture_in_picture_allowed(!config.block_pip);
        }
    }

    fn apply(&mut self, decision: &Decision) {
        match decision {
            Decision::NoOp => {}
            Decision::ShowTransientWarning { message, duration } => {
                self.controller
                    .show_warning(message, *duration, &mut self.environment);
            }
            Decision::ApplyPenalty { message, duration } => {
                self.controller
                    .apply_penalty(message, *duration, &mut self.environment);
            }
            Decision::SuppressUntilFocusReturns { mode, pause_media } => {
                self.controller.suppress(*mode, &mut self.environment);
                if *pause_media {
                    let paused = self.environment.pause_media();
                    tracing::debug!(session_id = %self.session_id, paused, "Media pause requested");
                }
            }
            Decision::RestoreIfSafe { defer: None } => {
                self.controller.restore(&mut self.environment);
            }
            Decision::RestoreIfSafe { defer: Some(delay) } => {
                self.controller.schedule_restore(*delay);
            }
            Decision::StartRecordingBlock { duration } => {
                self.controller
                    .start_recording_block(*duration, &mut self.environment);
            }
            Decision::DisableCaptureApi => self.disable_capture_api(),
        }
    }

    fn disable_capture_api(&mut self) {
        if self.controller.state().capture_api_disabled {
            return;
        }

        match self.environment.disable_capture_api() {
            Ok(()) | Err(CaptureApiError::AlreadyOverridden) => {
                self.controller.mark_capture_api_disabled();
            }
            Err(e) => {
                tracing::debug!(session_id = %self.session_id, "Capture API left alone: {}", e);
            }
        }
    }
}

impl<E: Environment> Drop for ProtectedViewer<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EnvCall, RecordingEnvironment};
    use std::time::Duration;
    use veil_config::{merge, ProtectionFlag};
    use veil_presentation::{ContentStyle, ManualClock, OverlaySeverity};
    use veil_signals::KeyEvent;

    fn config(flags: &[ProtectionFlag]) -> ProtectionConfig {
        flags
            .iter()
            .fold(ProtectionConfig::default(), |config, flag| config.with(*flag))
    }

    fn viewer_with(
        env: RecordingEnvironment,
        flags: &[ProtectionFlag],
    ) -> (Arc<ManualClock>, ProtectedViewer<RecordingEnvironment>) {
        let clock = Arc::new(ManualClock::starting_now());
        let viewer = ProtectedViewer::new(env, config(flags), PolicyTimings::default(), clock.clone());
        (clock, viewer)
    }

    fn viewer(flags: &[ProtectionFlag]) -> (Arc<ManualClock>, ProtectedViewer<RecordingEnvironment>) {
        viewer_with(RecordingEnvironment::new(), flags)
    }

    fn key(event: KeyEvent) -> RawEvent {
        RawEvent::KeyDown(event)
    }

    #[test]
    fn test_higher_tier_cannot_be_downgraded() {
        let page = config(&[ProtectionFlag::AntiScreenshot]);
        let effective = merge(
            &ProtectionConfig::default(),
            &ProtectionConfig::default(),
            &page,
            &ProtectionConfig::default(),
        );

        let (_, mut viewer) = viewer(&[]);
        viewer.apply_config(effective).unwrap();
        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();
        assert_eq!(viewer.surface_state(), SurfaceState::PenaltyLocked);
    }

    #[test]
    fn test_screenshot_penalty_end_to_end() {
        let (clock, mut viewer) = viewer(&[
            ProtectionFlag::AntiScreenshot,
            ProtectionFlag::BlockPrintScreen,
            ProtectionFlag::TabFocusProtection,
        ]);

        let decisions = viewer
            .handle_event(&key(KeyEvent::new("PrintScreen")))
            .unwrap();
        assert!(matches!(decisions[0], Decision::ApplyPenalty { .. }));

        // Hidden and blocked before handle_event returned
        assert_eq!(viewer.environment().default_prevented(), 1);
        assert_eq!(viewer.environment().count(&EnvCall::ClearClipboard), 1);
        assert!(!viewer.state().content_visible);
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::HIDDEN));
        let overlay = viewer.environment().overlay().unwrap();
        assert_eq!(overlay.severity, OverlaySeverity::PenaltyBlock);

        // Focus and visibility churn inside the window changes nothing
        for event in [
            RawEvent::WindowBlur,
            RawEvent::WindowFocus,
            RawEvent::VisibilityChange { hidden: true },
            RawEvent::VisibilityChange { hidden: false },
            RawEvent::WindowFocus,
        ] {
            clock.advance(Duration::from_millis(500));
            viewer.handle_event(&event).unwrap();
            viewer.advance().unwrap();
            assert_eq!(viewer.surface_state(), SurfaceState::PenaltyLocked);
        }

        clock.advance(Duration::from_millis(500));
        let fired = viewer.advance().unwrap();
        assert!(fired.contains(&TimerPurpose::Penalty));
        assert!(viewer.state().content_visible);
        assert!(viewer.environment().overlay().is_none());
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::VISIBLE));
    }

    #[test]
    fn test_repeat_screenshot_restarts_penalty() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::BlockPrintScreen]);

        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();
        clock.advance(Duration::from_millis(2500));
        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();

        clock.advance(Duration::from_millis(500));
        viewer.advance().unwrap();
        assert!(!viewer.state().content_visible);

        clock.advance(Duration::from_millis(2500));
        viewer.advance().unwrap();
        assert!(viewer.state().content_visible);
    }

    #[test]
    fn test_screenshot_chord_prevented_without_protection() {
        let (_, mut viewer) = viewer(&[]);

        let decisions = viewer
            .handle_event(&key(KeyEvent::new("s").ctrl().shift()))
            .unwrap();
        assert!(decisions.iter().all(Decision::is_noop));
        assert_eq!(viewer.environment().default_prevented(), 1);
        assert!(viewer.state().content_visible);
    }

    #[test]
    fn test_overlapping_chord_triggers_both_paths() {
        let chord = KeyEvent::new("S").ctrl().shift();

        let (_, mut both) = viewer(&[ProtectionFlag::AntiScreenshot, ProtectionFlag::BlockShortcuts]);
        both.handle_event(&key(chord.clone())).unwrap();
        assert!(both.state().penalty_active);
        assert!(both.state().warning.is_some());
        assert_eq!(both.environment().default_prevented(), 1);

        let (_, mut shortcuts_only) = viewer(&[ProtectionFlag::BlockShortcuts]);
        shortcuts_only.handle_event(&key(chord.clone())).unwrap();
        assert!(!shortcuts_only.state().penalty_active);
        assert!(shortcuts_only.state().warning.is_some());

        let (_, mut screenshot_only) = viewer(&[ProtectionFlag::AntiScreenshot]);
        screenshot_only.handle_event(&key(chord)).unwrap();
        assert!(screenshot_only.state().penalty_active);
        assert!(screenshot_only.state().warning.is_none());
    }

    #[test]
    fn test_warning_prevents_default() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::BlockRightClick]);

        viewer.handle_event(&RawEvent::ContextMenu).unwrap();
        assert_eq!(viewer.environment().default_prevented(), 1);
        assert!(viewer.environment().warning().is_some());
        assert!(viewer.state().content_visible);

        clock.advance(Duration::from_secs(20));
        viewer.advance().unwrap();
        assert!(viewer.environment().warning().is_none());
    }

    #[test]
    fn test_tab_hidden_end_to_end() {
        let (_, mut viewer) = viewer_with(
            RecordingEnvironment::new().with_media_playing(),
            &[ProtectionFlag::TabFocusProtection],
        );

        viewer
            .handle_event(&RawEvent::VisibilityChange { hidden: true })
            .unwrap();
        assert!(!viewer.environment().media_playing());
        assert!(!viewer.state().content_visible);
        assert!(viewer.environment().overlay().is_none());

        viewer
            .handle_event(&RawEvent::VisibilityChange { hidden: false })
            .unwrap();
        assert!(viewer.state().content_visible);
    }

    #[test]
    fn test_focus_restore_is_deferred() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::AntiScreenshot]);

        viewer.handle_event(&RawEvent::WindowBlur).unwrap();
        assert!(viewer.state().blurred);

        viewer.handle_event(&RawEvent::WindowFocus).unwrap();
        assert!(!viewer.state().content_visible);

        clock.advance(Duration::from_millis(50));
        viewer.advance().unwrap();
        assert!(viewer.state().content_visible);
        assert!(!viewer.state().blurred);
    }

    #[test]
    fn test_penalty_inside_defer_window_wins() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::AntiScreenshot]);

        viewer.handle_event(&RawEvent::WindowBlur).unwrap();
        viewer.handle_event(&RawEvent::WindowFocus).unwrap();
        clock.advance(Duration::from_millis(10));
        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();

        clock.advance(Duration::from_millis(100));
        viewer.advance().unwrap();
        assert_eq!(viewer.surface_state(), SurfaceState::PenaltyLocked);
    }

    #[test]
    fn test_recording_block_end_to_end() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::BlockMediaRecorder]);

        viewer.handle_event(&RawEvent::WindowBlur).unwrap();
        assert!(viewer.state().recording_block_active);
        assert!(viewer.state().content_visible);
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::HIDDEN));

        clock.advance(Duration::from_millis(2000));
        viewer.advance().unwrap();
        assert!(!viewer.state().recording_block_active);
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::VISIBLE));
    }

    #[test]
    fn test_recording_block_held_while_hidden_ends_on_return() {
        let (clock, mut viewer) = viewer(&[ProtectionFlag::BlockMediaRecorder]);

        viewer.handle_event(&RawEvent::WindowBlur).unwrap();
        viewer
            .handle_event(&RawEvent::VisibilityChange { hidden: true })
            .unwrap();

        clock.advance(Duration::from_millis(2000));
        viewer.advance().unwrap();
        assert!(viewer.state().recording_block_active);
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::HIDDEN));

        viewer
            .handle_event(&RawEvent::VisibilityChange { hidden: false })
            .unwrap();
        viewer.handle_event(&RawEvent::WindowFocus).unwrap();

        clock.advance(Duration::from_secs(600));
        viewer.advance().unwrap();
        assert!(!viewer.state().recording_block_active);
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::VISIBLE));
        assert_eq!(viewer.surface_state(), SurfaceState::Visible);
        assert!(viewer.next_deadline().is_none());
    }

    #[test]
    fn test_capture_api_disabled_with_config() {
        let (_, mut viewer) = viewer(&[]);
        assert!(!viewer.environment().capture_api_overridden());

        viewer
            .apply_config(config(&[ProtectionFlag::BlockMediaRecorder, ProtectionFlag::BlockPip]))
            .unwrap();
        assert!(viewer.environment().capture_api_overridden());
        assert!(viewer.state().capture_api_disabled);
        assert!(!viewer.environment().picture_in_picture_allowed());

        let decisions = viewer.handle_event(&RawEvent::CaptureApiInvoked).unwrap();
        assert_eq!(decisions, vec![Decision::NoOp]);
        assert_eq!(viewer.environment().count(&EnvCall::DisableCaptureApi), 1);
    }

    #[test]
    fn test_missing_capture_api_is_skipped() {
        let (_, mut viewer) = viewer_with(
            RecordingEnvironment::new().without_capture_api(),
            &[ProtectionFlag::BlockMediaRecorder],
        );

        assert!(!viewer.state().capture_api_disabled);
        assert!(viewer.handle_event(&RawEvent::CaptureApiInvoked).is_ok());
    }

    #[test]
    fn test_missing_dom_and_clipboard_are_tolerated() {
        let (clock, mut viewer) = viewer_with(
            RecordingEnvironment::new().unmounted().without_clipboard(),
            &[ProtectionFlag::BlockPrintScreen],
        );

        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();
        assert!(viewer.state().penalty_active);
        assert_eq!(viewer.environment().content_style(), None);

        viewer.environment_mut().mount_content();
        clock.advance(Duration::from_millis(3000));
        viewer.advance().unwrap();
        assert_eq!(viewer.environment().content_style(), Some(ContentStyle::VISIBLE));
    }

    #[test]
    fn test_teardown_cancels_timers() {
        let (clock, mut viewer) = viewer(&ProtectionFlag::ALL);

        viewer.handle_event(&key(KeyEvent::new("PrintScreen"))).unwrap();
        viewer.handle_event(&RawEvent::ContextMenu).unwrap();
        viewer.handle_event(&RawEvent::WindowBlur).unwrap();
        assert!(viewer.next_deadline().is_some());

        assert_eq!(viewer.teardown(), 3);
        assert_eq!(viewer.teardown(), 0);
        assert!(viewer.next_deadline().is_none());

        viewer.environment_mut().take_calls();
        clock.advance(Duration::from_secs(60));
        assert!(matches!(viewer.advance(), Err(CoreError::SessionClosed)));
        assert!(matches!(
            viewer.handle_event(&RawEvent::WindowFocus),
            Err(CoreError::SessionClosed)
        ));
        assert!(viewer.environment().calls().is_empty());
    }

    #[test]
    fn test_snapshot_reports_watermarks() {
        let (_, viewer) = viewer(&[ProtectionFlag::VisualWatermark, ProtectionFlag::ForensicWatermark]);
        let snapshot = viewer.snapshot();

        assert_eq!(snapshot.session_id, viewer.session_id());
        assert_eq!(snapshot.surface, SurfaceState::Visible);
        assert!(snapshot.watermarks.visual);
        assert!(snapshot.watermarks.forensic);
        assert!(!snapshot.watermarks.overlay);
        assert!(!snapshot.closed);
    }
}
