#![allow(dead_code)]

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Wake;

use embassy_time::{Duration, Instant, MockDriver};
use splitkb_central::LinkError;
use splitkb_central::event::KeycodeEvent;
use splitkb_central::link::{ConnectionKind, ConnectionRole, LinkInfo, SplitLink};
use splitkb_central::power::ConnectionProfile;
use splitkb_central::splitkb_types::keycode::{KeyCode, keys};
use splitkb_central::splitkb_types::modifier::HidModifiers;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Upper bound of simulated time for one test
const MAX_SIMULATED_TIME: Duration = Duration::from_secs(600);

struct WakeFlag(AtomicBool);

impl Wake for WakeFlag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Run `future` to completion on the mock clock.
///
/// While the future makes progress it is polled again at the same instant, once it is stuck the clock advances by
/// one millisecond. Timers therefore fire exactly at their deadline.
pub fn test_block_on<F: Future>(future: F) -> F::Output {
    let flag = Arc::new(WakeFlag(AtomicBool::new(false)));
    let waker = Waker::from(flag.clone());
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);
    let start = Instant::now();

    loop {
        flag.0.store(false, Ordering::SeqCst);
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
        if !flag.0.load(Ordering::SeqCst) {
            assert!(
                Instant::now() - start < MAX_SIMULATED_TIME,
                "test did not finish within the simulated time limit"
            );
            MockDriver::get().advance(Duration::from_millis(1));
        }
    }
}

/// Parameter updates seen by a [`TestLink`], with the time since `origin` in milliseconds
pub struct LinkRecord {
    pub origin: Instant,
    pub updates: Vec<(u64, ConnectionProfile)>,
    pub released: bool,
}

impl LinkRecord {
    pub fn new(origin: Instant) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            origin,
            updates: Vec::new(),
            released: false,
        }))
    }
}

/// A split link which accepts every update
pub struct TestLink {
    pub info: LinkInfo,
    pub record: Rc<RefCell<LinkRecord>>,
}

impl TestLink {
    pub fn split(handle: u16, record: Rc<RefCell<LinkRecord>>) -> Self {
        Self {
            info: LinkInfo {
                handle,
                role: ConnectionRole::Central,
                kind: ConnectionKind::Le,
            },
            record,
        }
    }
}

impl Drop for TestLink {
    fn drop(&mut self) {
        self.record.borrow_mut().released = true;
    }
}

impl SplitLink for TestLink {
    fn info(&self) -> LinkInfo {
        self.info
    }

    async fn update_conn_params(&mut self, profile: &ConnectionProfile) -> Result<(), LinkError> {
        let mut record = self.record.borrow_mut();
        let elapsed = (Instant::now() - record.origin).as_millis();
        record.updates.push((elapsed, *profile));
        Ok(())
    }
}

/// The host side of the HID link: current modifiers and pressed keys
#[derive(Default, Debug)]
pub struct Host {
    pub modifiers: HidModifiers,
    pub keys: Vec<KeyCode>,
    /// Everything typed, as (keycode, shift held) at each key press
    pub typed: Vec<(KeyCode, bool)>,
}

impl Host {
    pub fn apply(&mut self, event: &KeycodeEvent) {
        let keycode = event.keycode;
        if keycode == keys::LEFT_SHIFT {
            self.modifiers.set_left_shift(event.pressed);
        } else if keycode == keys::RIGHT_SHIFT {
            self.modifiers.set_right_shift(event.pressed);
        } else if event.pressed {
            self.keys.push(keycode);
            self.typed.push((keycode, self.modifiers.any_shift()));
        } else {
            self.keys.retain(|k| *k != keycode);
        }
    }
}
