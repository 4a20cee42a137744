//! Clock backed by tokio time

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

use veil_core::Clock;

/// Wall time derived from `tokio::time::Instant`, so paused or
/// auto-advanced tokio time drives viewer timers too
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    origin_wall: DateTime<Utc>,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: Utc::now(),
        }
    }

    /// Instant at which the wall-clock `deadline` is reached
    pub fn instant_for(&self, deadline: DateTime<Utc>) -> Instant {
        let offset = (deadline - self.origin_wall).to_std().unwrap_or_default();

        self.origin
            .checked_add(offset)
            .unwrap_or_else(|| self.origin + FAR_FUTURE)
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::days(365 * 30));

        self.origin_wall
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_follows_paused_time() {
        let clock = TokioClock::new();
        let start = clock.now();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let elapsed = clock.now() - start;
        assert!(elapsed >= chrono::Duration::milliseconds(1500));
        assert!(elapsed < chrono::Duration::milliseconds(1510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_for_deadline() {
        let clock = TokioClock::new();
        let deadline = clock.now() + chrono::Duration::milliseconds(3000);

        assert_eq!(
            clock.instant_for(deadline) - Instant::now(),
            Duration::from_millis(3000)
        );
        assert!(clock.instant_for(DateTime::<Utc>::MAX_UTC) > Instant::now());
    }
}
