use embassy_futures::select::{Either3, select3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::signal::Signal;
use embassy_time::Instant;

use super::scheduler::wait_deadline;
use super::{DeadlineTimer, PowerModeController, Scheduler};
use crate::event::{ConnectionEvent, EventListener, EventResult, PointingEvent, PositionEvent};
use crate::link::{SplitLink, UsbPower};

/// Drive a power controller forever.
///
/// Waits for whichever comes first: the controller's pending evaluation, user activity on `activity`, or a
/// connection event. Everything runs in this one task, so an evaluation never overlaps with another handler.
pub async fn run_power_manager<L: SplitLink, U: UsbPower, M: RawMutex, const N: usize>(
    controller: &mut PowerModeController<L, U, DeadlineTimer>,
    activity: &Signal<M, ()>,
    connections: Receiver<'_, M, ConnectionEvent<L>, N>,
) -> ! {
    info!("Power manager started");
    loop {
        let deadline = controller.scheduler().deadline();
        match select3(wait_deadline(deadline), activity.wait(), connections.receive()).await {
            Either3::First(_) => {
                controller.scheduler_mut().cancel();
                controller.evaluate(Instant::now()).await;
            }
            Either3::Second(_) => controller.on_activity(Instant::now()).await,
            Either3::Third(event) => controller.on_connection_event(event, Instant::now()),
        }
    }
}

/// Forwards key and pointer activity to the power task.
///
/// Every pointing report counts as activity. Never consumes an event.
pub struct ActivityListener<'a, M: RawMutex> {
    signal: &'a Signal<M, ()>,
}

impl<'a, M: RawMutex> ActivityListener<'a, M> {
    pub fn new(signal: &'a Signal<M, ()>) -> Self {
        Self { signal }
    }
}

impl<M: RawMutex> EventListener<PositionEvent> for ActivityListener<'_, M> {
    fn on_event(&mut self, _event: &PositionEvent) -> EventResult {
        self.signal.signal(());
        EventResult::Bubble
    }
}

impl<M: RawMutex> EventListener<PointingEvent> for ActivityListener<'_, M> {
    fn on_event(&mut self, _event: &PointingEvent) -> EventResult {
        self.signal.signal(());
        EventResult::Bubble
    }
}
