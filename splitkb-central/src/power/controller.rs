use embassy_time::{Duration, Instant};

use super::policy::{ConnectionProfile, PowerMode, next_boundary, target_mode};
use super::{PowerState, Scheduler};
use crate::activity::ActivityClock;
use crate::config::PowerConfig;
use crate::event::ConnectionEvent;
use crate::link::{SplitLink, UsbPower};

/// Owner of the split link's power state.
///
/// All transitions happen through the `on_*` methods and [`evaluate`](Self::evaluate). Time is passed in explicitly,
/// the only asynchronous part is the connection parameter update on the link.
pub struct PowerModeController<L: SplitLink, U: UsbPower, S: Scheduler> {
    config: PowerConfig,
    mode: PowerMode,
    link: Option<L>,
    activity: ActivityClock,
    usb: U,
    scheduler: S,
}

impl<L: SplitLink, U: UsbPower, S: Scheduler> PowerModeController<L, U, S> {
    pub fn new(config: PowerConfig, usb: U, scheduler: S, now: Instant) -> Self {
        Self {
            config,
            mode: PowerMode::Active,
            link: None,
            activity: ActivityClock::new(now),
            usb,
            scheduler,
        }
    }

    /// Track a link which was established before the controller was built.
    ///
    /// A link which is not the split link is dropped. Call [`start`](Self::start) afterwards to arm the first
    /// evaluation.
    pub fn with_link(mut self, link: L) -> Self {
        if link.info().is_split_peripheral() {
            self.link = Some(link);
        }
        self
    }

    /// Arm the first evaluation for a link tracked since construction
    pub fn start(&mut self, now: Instant) {
        self.activity.reset(now);
        self.scheduler.cancel();
        if self.link.is_some() {
            self.mode = PowerMode::Active;
            self.scheduler.schedule_after(self.config.sleep1_timeout);
        }
    }

    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    pub fn state(&self) -> PowerState {
        match self.link {
            Some(_) => self.mode.into(),
            None => PowerState::NoLink,
        }
    }

    pub fn link(&self) -> Option<&L> {
        self.link.as_ref()
    }

    pub fn config(&self) -> &PowerConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityClock {
        &self.activity
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// A connection was established.
    ///
    /// Failed connections and connections other than the split link are ignored. A previously tracked link is
    /// released before the new one is stored.
    pub fn on_connected(&mut self, link: L, error: Option<u8>, now: Instant) {
        let info = link.info();
        if let Some(status) = error {
            warn!("Connection {} failed with status {}, ignored", info.handle, status);
            return;
        }
        if !info.is_split_peripheral() {
            debug!("Connection {} is not the split link, ignored", info.handle);
            return;
        }

        if let Some(old) = self.link.take() {
            info!("Releasing split link {}", old.handle());
        }
        info!("Split link {} connected", info.handle);
        self.link = Some(link);
        self.activity.reset(now);
        self.mode = PowerMode::Active;
        self.scheduler.cancel();
        self.scheduler.schedule_after(self.config.sleep1_timeout);
    }

    /// A connection is gone, only the tracked link's handle has an effect
    pub fn on_disconnected(&mut self, handle: u16, reason: u8) {
        if self.link.as_ref().map(|link| link.handle()) != Some(handle) {
            debug!("Connection {} disconnected, not the split link", handle);
            return;
        }

        info!("Split link {} disconnected, reason {}", handle, reason);
        self.scheduler.cancel();
        self.link = None;
        self.mode = PowerMode::Active;
    }

    pub fn on_connection_event(&mut self, event: ConnectionEvent<L>, now: Instant) {
        match event {
            ConnectionEvent::Connected { link, error } => self.on_connected(link, error, now),
            ConnectionEvent::Disconnected { handle, reason } => self.on_disconnected(handle, reason),
        }
    }

    /// A key or the pointer moved.
    ///
    /// Out of a sleep mode the link is brought back to active right away, in active mode the first sleep threshold
    /// is re-armed.
    pub async fn on_activity(&mut self, now: Instant) {
        self.activity.reset(now);
        self.scheduler.cancel();
        if self.link.is_none() {
            return;
        }

        if self.mode != PowerMode::Active {
            debug!("Activity detected in {} mode", self.mode.name());
            self.evaluate(now).await;
        } else {
            self.scheduler.schedule_after(self.config.sleep1_timeout);
        }
    }

    /// One evaluation step: pick the mode for the current idle time and USB state, apply it, and arm the next
    /// evaluation.
    pub async fn evaluate(&mut self, now: Instant) {
        if self.link.is_none() {
            return;
        }

        if self.usb.is_powered() {
            if self.mode != PowerMode::Active {
                info!("USB power present, restoring active mode");
                self.apply(PowerMode::Active).await;
            }
            self.scheduler.cancel();
            self.scheduler.schedule_after(self.config.usb_poll_interval);
            return;
        }

        let idle = self.activity.idle_duration(now);
        let target = target_mode(&self.config, idle, false);
        if target == self.mode {
            self.schedule_next_transition(idle);
            return;
        }

        info!("Entering {} mode - updating connection parameters", target.name());
        if self.apply(target).await {
            info!("{} mode activated", target.name());
            self.schedule_next_transition(idle);
        }
    }

    /// Request the profile of `mode` on the link, the mode is only changed if the link accepts it
    async fn apply(&mut self, mode: PowerMode) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };

        let profile = ConnectionProfile::for_mode(&self.config, mode);
        debug!(
            "Requesting interval {}us, latency {}, timeout {}ms",
            profile.interval().as_micros(),
            profile.latency,
            profile.timeout().as_millis()
        );
        match link.update_conn_params(&profile).await {
            Ok(()) => {
                self.mode = mode;
                true
            }
            Err(e) => {
                warn!("Failed to update connection parameters for {} mode: {:?}", mode.name(), e);
                false
            }
        }
    }

    fn schedule_next_transition(&mut self, idle: Duration) {
        self.scheduler.cancel();
        if let Some(remaining) = next_boundary(&self.config, self.mode, idle) {
            debug!("Next power evaluation in {}ms", remaining.as_millis());
            self.scheduler.schedule_after(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embassy_futures::block_on;

    use super::*;
    use crate::error::LinkError;
    use crate::link::{ConnectionKind, ConnectionRole, LinkInfo};

    #[derive(Default)]
    struct LinkLog {
        updates: Vec<ConnectionProfile>,
        reject: bool,
        released: bool,
    }

    struct FakeLink {
        info: LinkInfo,
        log: Rc<RefCell<LinkLog>>,
    }

    impl FakeLink {
        fn split(handle: u16) -> (Self, Rc<RefCell<LinkLog>>) {
            let log = Rc::new(RefCell::new(LinkLog::default()));
            let link = FakeLink {
                info: LinkInfo {
                    handle,
                    role: ConnectionRole::Central,
                    kind: ConnectionKind::Le,
                },
                log: log.clone(),
            };
            (link, log)
        }
    }

    impl Drop for FakeLink {
        fn drop(&mut self) {
            self.log.borrow_mut().released = true;
        }
    }

    impl SplitLink for FakeLink {
        fn info(&self) -> LinkInfo {
            self.info
        }

        async fn update_conn_params(&mut self, profile: &ConnectionProfile) -> Result<(), LinkError> {
            let mut log = self.log.borrow_mut();
            if log.reject {
                return Err(LinkError::Rejected(0x3b));
            }
            log.updates.push(*profile);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        pending: Option<Duration>,
        cancels: usize,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule_after(&mut self, delay: Duration) {
            self.pending = Some(delay);
        }

        fn cancel(&mut self) {
            self.pending = None;
            self.cancels += 1;
        }

        fn is_pending(&self) -> bool {
            self.pending.is_some()
        }
    }

    type TestController<'a> = PowerModeController<FakeLink, &'a AtomicBool, RecordingScheduler>;

    fn at(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn controller(usb: &AtomicBool) -> TestController<'_> {
        PowerModeController::new(PowerConfig::default(), usb, RecordingScheduler::default(), at(0))
    }

    fn profile(mode: PowerMode) -> ConnectionProfile {
        ConnectionProfile::for_mode(&PowerConfig::default(), mode)
    }

    #[test]
    fn test_idle_walks_through_sleep_modes() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        assert_eq!(controller.state(), PowerState::Active);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));

        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.state(), PowerState::Sleep1);
        assert_eq!(controller.scheduler().pending, Some(ms(10_000)));

        block_on(controller.evaluate(at(15_000)));
        assert_eq!(controller.state(), PowerState::Sleep2);
        assert_eq!(controller.scheduler().pending, Some(ms(15_000)));

        block_on(controller.evaluate(at(30_000)));
        assert_eq!(controller.state(), PowerState::Sleep3);
        assert!(!controller.scheduler().is_pending());

        // USB plugged in
        usb.store(true, Ordering::Release);
        block_on(controller.evaluate(at(31_000)));
        assert_eq!(controller.state(), PowerState::Active);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));

        assert_eq!(
            log.borrow().updates,
            [
                profile(PowerMode::Sleep1),
                profile(PowerMode::Sleep2),
                profile(PowerMode::Sleep3),
                profile(PowerMode::Active)
            ]
        );
    }

    #[test]
    fn test_link_acquired_resets_clock() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(3);

        controller.on_connected(link, None, at(42_000));
        assert_eq!(controller.mode(), PowerMode::Active);
        assert_eq!(controller.activity().idle_duration(at(42_000)), ms(0));
        assert_eq!(controller.link().map(|l| l.handle()), Some(3));
        assert!(log.borrow().updates.is_empty());
    }

    #[test]
    fn test_disconnect_during_sleep2() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(7);

        controller.on_connected(link, None, at(0));
        block_on(controller.evaluate(at(20_000)));
        assert_eq!(controller.state(), PowerState::Sleep2);
        assert!(controller.scheduler().is_pending());

        controller.on_disconnected(7, 0x13);
        assert_eq!(controller.state(), PowerState::NoLink);
        assert_eq!(controller.mode(), PowerMode::Active);
        assert!(!controller.scheduler().is_pending());
        assert!(log.borrow().released);

        // NoLink is sticky
        block_on(controller.evaluate(at(40_000)));
        block_on(controller.on_activity(at(41_000)));
        assert_eq!(controller.state(), PowerState::NoLink);
        assert!(!controller.scheduler().is_pending());
        assert_eq!(log.borrow().updates, [profile(PowerMode::Sleep2)]);
    }

    #[test]
    fn test_disconnect_of_other_connection_is_ignored() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        controller.on_disconnected(2, 0x13);
        assert_eq!(controller.state(), PowerState::Active);
        assert!(controller.scheduler().is_pending());
        assert!(!log.borrow().released);
    }

    #[test]
    fn test_failed_update_keeps_mode() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        log.borrow_mut().reject = true;
        controller.scheduler_mut().cancel();

        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.mode(), PowerMode::Active);
        assert!(!controller.scheduler().is_pending());

        // Next activity retries with the current conditions
        log.borrow_mut().reject = false;
        block_on(controller.on_activity(at(6000)));
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        block_on(controller.evaluate(at(11_000)));
        assert_eq!(controller.mode(), PowerMode::Sleep1);
    }

    #[test]
    fn test_activity_returns_to_active_immediately() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        block_on(controller.evaluate(at(30_000)));
        assert_eq!(controller.mode(), PowerMode::Sleep3);

        block_on(controller.on_activity(at(45_000)));
        assert_eq!(controller.mode(), PowerMode::Active);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        assert_eq!(log.borrow().updates.last(), Some(&profile(PowerMode::Active)));
    }

    #[test]
    fn test_activity_while_active_rearms_timer() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        let cancels = controller.scheduler().cancels;
        block_on(controller.on_activity(at(4000)));
        assert_eq!(controller.scheduler().cancels, cancels + 1);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        assert!(log.borrow().updates.is_empty());

        // Thresholds count from the last activity
        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.mode(), PowerMode::Active);
        assert_eq!(controller.scheduler().pending, Some(ms(4000)));
    }

    #[test]
    fn test_late_evaluation_skips_modes() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        block_on(controller.evaluate(at(20_000)));
        assert_eq!(controller.mode(), PowerMode::Sleep2);
        assert_eq!(controller.scheduler().pending, Some(ms(10_000)));
        assert_eq!(log.borrow().updates, [profile(PowerMode::Sleep2)]);
    }

    #[test]
    fn test_usb_power_polls_without_updates() {
        let usb = AtomicBool::new(true);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        for t in [5000, 10_000, 60_000] {
            block_on(controller.evaluate(at(t)));
            assert_eq!(controller.mode(), PowerMode::Active);
            assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        }
        assert!(log.borrow().updates.is_empty());

        // Unplugged, thresholds still count from the last activity
        usb.store(false, Ordering::Release);
        block_on(controller.evaluate(at(65_000)));
        assert_eq!(controller.mode(), PowerMode::Sleep3);
    }

    #[test]
    fn test_new_link_replaces_old_one() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (first, first_log) = FakeLink::split(1);
        let (second, second_log) = FakeLink::split(2);

        controller.on_connected(first, None, at(0));
        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.mode(), PowerMode::Sleep1);

        controller.on_connection_event(
            ConnectionEvent::Connected {
                link: second,
                error: None,
            },
            at(6000),
        );
        assert!(first_log.borrow().released);
        assert!(!second_log.borrow().released);
        assert_eq!(controller.mode(), PowerMode::Active);
        assert_eq!(controller.link().map(|l| l.handle()), Some(2));

        // The old handle is no longer tracked
        controller.on_connection_event(ConnectionEvent::Disconnected { handle: 1, reason: 0x08 }, at(7000));
        assert_eq!(controller.state(), PowerState::Active);
    }

    #[test]
    fn test_non_split_connections_are_ignored() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);

        let (mut host, host_log) = FakeLink::split(4);
        host.info.role = ConnectionRole::Peripheral;
        controller.on_connected(host, None, at(0));
        assert_eq!(controller.state(), PowerState::NoLink);
        assert!(host_log.borrow().released);

        let (failed, _) = FakeLink::split(5);
        controller.on_connected(failed, Some(0x3e), at(0));
        assert_eq!(controller.state(), PowerState::NoLink);
        assert!(!controller.scheduler().is_pending());
    }

    #[test]
    fn test_start_with_existing_link() {
        let usb = AtomicBool::new(false);
        let (link, _log) = FakeLink::split(9);
        let mut controller = controller(&usb).with_link(link);
        assert_eq!(controller.state(), PowerState::Active);
        assert!(!controller.scheduler().is_pending());

        controller.start(at(100));
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        block_on(controller.evaluate(at(5100)));
        assert_eq!(controller.mode(), PowerMode::Sleep1);
    }

    #[test]
    fn test_usb_poll_rearmed_when_update_fails() {
        let usb = AtomicBool::new(false);
        let mut controller = controller(&usb);
        let (link, log) = FakeLink::split(1);

        controller.on_connected(link, None, at(0));
        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.mode(), PowerMode::Sleep1);

        usb.store(true, Ordering::Release);
        log.borrow_mut().reject = true;
        block_on(controller.evaluate(at(7000)));
        assert_eq!(controller.mode(), PowerMode::Sleep1);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));

        // The next poll retries
        log.borrow_mut().reject = false;
        block_on(controller.evaluate(at(12_000)));
        assert_eq!(controller.mode(), PowerMode::Active);
        assert_eq!(controller.scheduler().pending, Some(ms(5000)));
        assert_eq!(
            log.borrow().updates,
            [profile(PowerMode::Sleep1), profile(PowerMode::Active)]
        );
    }

    #[test]
    fn test_with_link_drops_non_split_link() {
        let usb = AtomicBool::new(false);
        let (mut host, log) = FakeLink::split(4);
        host.info.kind = ConnectionKind::BrEdr;

        let mut controller = controller(&usb).with_link(host);
        assert!(log.borrow().released);
        assert_eq!(controller.state(), PowerState::NoLink);

        controller.start(at(0));
        assert!(!controller.scheduler().is_pending());
        block_on(controller.evaluate(at(5000)));
        assert_eq!(controller.state(), PowerState::NoLink);
        assert!(log.borrow().updates.is_empty());
    }
}
