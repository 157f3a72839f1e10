use embassy_time::{Duration, Instant, Timer};

/// Capability to run a single delayed power evaluation.
///
/// There is at most one pending request: scheduling again replaces the pending one, `cancel` drops it. Cancelling an
/// evaluation which is already running only prevents it from firing again.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration);

    fn cancel(&mut self);

    fn is_pending(&self) -> bool;
}

/// [`Scheduler`] backed by a single deadline, awaited by the power task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Schedule at an absolute time
    pub fn schedule_at(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }
}

impl Scheduler for DeadlineTimer {
    fn schedule_after(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Wait until `deadline`, forever if there is none
pub(crate) async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => Timer::at(deadline).await,
        None => core::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_replaces_pending() {
        let mut timer = DeadlineTimer::new();
        assert!(!timer.is_pending());

        timer.schedule_at(Instant::from_millis(5000));
        timer.schedule_at(Instant::from_millis(2000));
        assert_eq!(timer.deadline(), Some(Instant::from_millis(2000)));

        timer.cancel();
        assert!(!timer.is_pending());
        assert_eq!(timer.deadline(), None);
    }
}
