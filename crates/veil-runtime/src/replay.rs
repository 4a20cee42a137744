//! Scripted replays
//!
//! Runs a timed event script against a viewer on a manual clock. Timers
//! fire at their exact deadlines between steps, so a replay is
//! deterministic and finishes instantly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use veil_core::{
    Clock, Decision, EnvCall, ManualClock, PolicyTimings, ProtectedViewer, ProtectionConfig,
    RawEvent, RecordingEnvironment, TimerPurpose, ViewerSnapshot,
};

use crate::error::RuntimeError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub config: ProtectionConfig,
    #[serde(default)]
    pub timings: PolicyTimings,
    pub steps: Vec<ReplayStep>,
    /// Keep firing timers up to this offset after the last step
    #[serde(default)]
    pub until_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStep {
    pub at_ms: u64,
    pub event: RawEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventEntry {
    pub at_ms: u64,
    pub event: RawEvent,
    pub decisions: Vec<Decision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerEntry {
    pub at_ms: u64,
    pub purpose: TimerPurpose,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: Vec<EventEntry>,
    pub timers: Vec<TimerEntry>,
    pub calls: Vec<EnvCall>,
    pub snapshot: ViewerSnapshot,
}

impl ReplayScript {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| RuntimeError::InvalidScript(e.to_string()))
    }
}

struct Replayer {
    clock: Arc<ManualClock>,
    origin: DateTime<Utc>,
    viewer: ProtectedViewer<RecordingEnvironment>,
    timers: Vec<TimerEntry>,
}

impl Replayer {
    fn at(&self, ms: u64) -> Result<DateTime<Utc>> {
        i64::try_from(ms)
            .ok()
            .and_then(|ms| {
                self.origin
                    .checked_add_signed(chrono::Duration::milliseconds(ms))
            })
            .ok_or_else(|| RuntimeError::InvalidScript(format!("offset {}ms out of range", ms)))
    }

    fn offset_ms(&self, at: DateTime<Utc>) -> u64 {
        u64::try_from((at - self.origin).num_milliseconds()).unwrap_or(0)
    }

    /// Fire every timer due at or before `until`, each at its own deadline
    fn run_until(&mut self, until: DateTime<Utc>) -> Result<()> {
        while let Some(deadline) = self.viewer.next_deadline().filter(|d| *d <= until) {
            self.clock.set(deadline);
            let at_ms = self.offset_ms(deadline);

            for purpose in self.viewer.advance()? {
                self.timers.push(TimerEntry { at_ms, purpose });
            }
        }

        self.clock.set(until.max(self.clock.now()));
        Ok(())
    }
}

pub fn replay(script: &ReplayScript) -> Result<ReplayReport> {
    let clock = Arc::new(ManualClock::starting_now());
    let origin = clock.now();
    let viewer = ProtectedViewer::new(
        RecordingEnvironment::new(),
        script.config,
        script.timings,
        clock.clone(),
    );

    let mut replayer = Replayer {
        clock,
        origin,
        viewer,
        timers: Vec::new(),
    };

    let mut steps: Vec<&ReplayStep> = script.steps.iter().collect();
    steps.sort_by_key(|step| step.at_ms);

    let mut events = Vec::with_capacity(steps.len());
    for step in steps {
        let at = replayer.at(step.at_ms)?;
        replayer.run_until(at)?;

        let decisions = replayer.viewer.handle_event(&step.event)?;
        events.push(EventEntry {
            at_ms: step.at_ms,
            event: step.event.clone(),
            decisions,
        });
    }

    if let Some(until_ms) = script.until_ms {
        let until = replayer.at(until_ms)?;
        replayer.run_until(until)?;
    }

    tracing::info!(
        session_id = %replayer.viewer.session_id(),
        events = events.len(),
        timers = replayer.timers.len(),
        "Replay finished"
    );

    let snapshot = replayer.viewer.snapshot();
    let calls = replayer.viewer.environment_mut().take_calls();

    Ok(ReplayReport {
        events,
        timers: replayer.timers,
        calls,
        snapshot,
    })
}
