//! Timestamp of the last user activity.

use embassy_time::{Duration, Instant};

/// Records when the user last pressed a key or moved the pointer.
///
/// Only activity events write the timestamp; the power evaluation only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityClock {
    last_activity: Instant,
}

impl ActivityClock {
    pub fn new(now: Instant) -> Self {
        Self { last_activity: now }
    }

    /// Mark `now` as the latest activity
    pub fn reset(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Time elapsed since the last activity.
    ///
    /// Saturates to zero if `now` is earlier than the recorded activity.
    pub fn idle_duration(&self, now: Instant) -> Duration {
        now.checked_duration_since(self.last_activity)
            .unwrap_or(Duration::from_ticks(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_duration() {
        let start = Instant::from_millis(1000);
        let mut clock = ActivityClock::new(start);
        assert_eq!(clock.idle_duration(start), Duration::from_ticks(0));
        assert_eq!(
            clock.idle_duration(Instant::from_millis(6000)),
            Duration::from_millis(5000)
        );

        clock.reset(Instant::from_millis(6000));
        assert_eq!(clock.last_activity(), Instant::from_millis(6000));
        assert_eq!(
            clock.idle_duration(Instant::from_millis(7500)),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_idle_duration_never_negative() {
        let clock = ActivityClock::new(Instant::from_millis(2000));
        assert_eq!(clock.idle_duration(Instant::from_millis(1000)), Duration::from_ticks(0));
    }
}
