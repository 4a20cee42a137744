//! Timer registry
//!
//! One slot per purpose. Arming a purpose that is already pending
//! replaces its deadline, so two expiries for the same purpose can never
//! both fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    Penalty,
    Warning,
    RecordingFlash,
    FocusRestoreDefer,
}

impl TimerPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPurpose::Penalty => "penalty",
            TimerPurpose::Warning => "warning",
            TimerPurpose::RecordingFlash => "recording_flash",
            TimerPurpose::FocusRestoreDefer => "focus_restore_defer",
        }
    }
}

impl std::fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTimer {
    pub purpose: TimerPurpose,
    pub deadline: DateTime<Utc>,
    /// Increases on every arm; breaks ties between equal deadlines
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: HashMap<TimerPurpose, ScheduledTimer>,
    next_generation: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `purpose` at `deadline`, returning the timer it replaced
    pub fn arm(&mut self, purpose: TimerPurpose, deadline: DateTime<Utc>) -> Option<ScheduledTimer> {
        self.next_generation += 1;
        let timer = ScheduledTimer {
            purpose,
            deadline,
            generation: self.next_generation,
        };

        let replaced = self.timers.insert(purpose, timer);

        tracing::debug!(
            timer = %purpose,
            deadline = %deadline,
            replaced = replaced.is_some(),
            "Armed timer"
        );

        replaced
    }

    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        let cancelled = self.timers.remove(&purpose).is_some();
        if cancelled {
            tracing::debug!(timer = %purpose, "Cancelled timer");
        }
        cancelled
    }

    /// Cancel every pending timer, returning how many were pending
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        if count > 0 {
            tracing::debug!(count, "Cancelled all timers");
        }
        count
    }

    pub fn is_armed(&self, purpose: TimerPurpose) -> bool {
        self.timers.contains_key(&purpose)
    }

    pub fn get(&self, purpose: TimerPurpose) -> Option<&ScheduledTimer> {
        self.timers.get(&purpose)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn take_expired(&mut self, now: DateTime<Utc>) -> Vec<ScheduledTimer> {
        let due: Vec<TimerPurpose> = self
            .timers
            .values()
            .filter(|t| t.deadline <= now)
            .map(|t| t.purpose)
            .collect();

        let mut expired: Vec<ScheduledTimer> = due
            .into_iter()
            .filter_map(|purpose| self.timers.remove(&purpose))
            .collect();

        expired.sort_by_key(|t| (t.deadline, t.generation));
        expired
    }
}
