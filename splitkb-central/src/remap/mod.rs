//! Keycode remapping with Shift bookkeeping.
//!
//! A keyboard with US legends typing on a host set to a JIS layout produces the wrong symbols: on JIS, Shift+2
//! is `"`, not `@`. The [`RemapEngine`] replaces every affected keycode with the JIS key which produces the
//! printed symbol, and adjusts Shift around the substitute so the host sees exactly the combination it needs.
//!
//! For a substitute which must be typed without Shift while the user holds Shift, the held Shift keys are
//! released before the substitute is pressed and pressed again after it is released. For a substitute which
//! needs Shift while the user holds none, a left Shift is pressed around it.
//!
//! Shift adjustments are decided against the Shift state the host currently sees, not the physical one, so
//! substitutes pressed while another substitute is held still get the Shift state they need.

mod shift;
pub mod table;

use heapless::Vec;
use splitkb_types::keycode::{KeyCode, keys};

pub use self::shift::ShiftState;
use self::table::{Substitute, lookup};
use crate::REMAP_MAX_HELD_KEYS;
use crate::config::RemapConfig;
use crate::event::{EventListener, EventOrigin, EventPublisher, EventResult, KeycodeEvent};

/// Shift change made when a substitute was pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum ShiftAdjust {
    None,
    /// The held Shift keys were released
    Suppressed,
    /// A left Shift was pressed
    Injected,
}

impl ShiftAdjust {
    fn for_substitute(shift_active: bool, substitute: &Substitute) -> Self {
        match (shift_active, substitute.shift) {
            (true, false) => ShiftAdjust::Suppressed,
            (false, true) => ShiftAdjust::Injected,
            _ => ShiftAdjust::None,
        }
    }
}

/// A remapped key which is still held
#[derive(Clone, Copy, Debug)]
struct HeldRemap {
    source: KeyCode,
    target: KeyCode,
    adjust: ShiftAdjust,
}

/// Translates keycode events through a remap table.
pub struct RemapEngine {
    config: RemapConfig,
    /// Physical Shift keys
    shift: ShiftState,
    /// Shift keys as seen by the host, after our own adjustments
    host: ShiftState,
    held: Vec<HeldRemap, REMAP_MAX_HELD_KEYS>,
}

impl RemapEngine {
    pub fn new(config: RemapConfig) -> Self {
        Self {
            config,
            shift: ShiftState::new(),
            host: ShiftState::new(),
            held: Vec::new(),
        }
    }

    /// Physical Shift state as seen by the engine
    pub fn shift_state(&self) -> ShiftState {
        self.shift
    }

    /// Shift state the host sees
    pub fn host_shift_state(&self) -> ShiftState {
        self.host
    }

    /// Number of remapped keys currently held
    pub fn held_keys(&self) -> usize {
        self.held.len()
    }

    /// Handle one keycode event.
    ///
    /// Substitute events are published through `publisher` in the order the host has to see them. Returns
    /// [`EventResult::Handled`] if the event was replaced, in which case it must not reach the host itself.
    pub fn process<P: EventPublisher<KeycodeEvent>>(&mut self, event: &KeycodeEvent, publisher: &P) -> EventResult {
        // Our own output, already translated
        if event.origin == EventOrigin::Remap {
            return EventResult::Bubble;
        }

        let keycode = event.keycode;
        if keycode.is_shift() {
            if keycode == keys::LEFT_SHIFT {
                self.shift.set_left(event.pressed);
                self.host.set_left(event.pressed);
            } else {
                self.shift.set_right(event.pressed);
                self.host.set_right(event.pressed);
            }
            return EventResult::Bubble;
        }

        if keycode == keys::CAPS_LOCK {
            return match self.config.caps_lock_target {
                Some(target) => {
                    publisher.publish(KeycodeEvent::remapped(target, event.pressed));
                    EventResult::Handled
                }
                None => EventResult::Bubble,
            };
        }

        if event.pressed {
            self.press(keycode, publisher)
        } else {
            self.release(keycode, publisher)
        }
    }

    fn press<P: EventPublisher<KeycodeEvent>>(&mut self, source: KeyCode, publisher: &P) -> EventResult {
        let Some(entry) = lookup(self.config.table, source) else {
            return EventResult::Bubble;
        };

        let substitute = entry.resolve(self.shift.is_active());
        let adjust = ShiftAdjust::for_substitute(self.host.is_active(), &substitute);
        debug!("Remap {:?} to {:?}, shift {}", source, substitute.keycode, substitute.shift);

        match adjust {
            ShiftAdjust::Suppressed => self.set_host_shift(false, false, publisher),
            ShiftAdjust::Injected => {
                let right = self.host.right();
                self.set_host_shift(true, right, publisher)
            }
            ShiftAdjust::None => {}
        }
        publisher.publish(KeycodeEvent::remapped(substitute.keycode, true));

        // A repeated press without release replaces the old record
        self.forget(source);
        let held = HeldRemap {
            source,
            target: substitute.keycode,
            adjust,
        };
        if self.held.push(held).is_err() {
            warn!("Too many remapped keys held, {:?} falls back to a fresh lookup on release", source);
        }

        EventResult::Handled
    }

    fn release<P: EventPublisher<KeycodeEvent>>(&mut self, source: KeyCode, publisher: &P) -> EventResult {
        let (target, adjust) = match self.forget(source) {
            Some(held) => (held.target, held.adjust),
            None => {
                let Some(entry) = lookup(self.config.table, source) else {
                    return EventResult::Bubble;
                };
                let substitute = entry.resolve(self.shift.is_active());
                (
                    substitute.keycode,
                    ShiftAdjust::for_substitute(self.host.is_active(), &substitute),
                )
            }
        };

        publisher.publish(KeycodeEvent::remapped(target, false));
        // Back to the physical state, which may have changed while the key was held
        if adjust != ShiftAdjust::None {
            let physical = self.shift;
            self.set_host_shift(physical.left(), physical.right(), publisher);
        }

        EventResult::Handled
    }

    /// Move the host's Shift keys to the given state, only changed sides are published
    fn set_host_shift<P: EventPublisher<KeycodeEvent>>(&mut self, left: bool, right: bool, publisher: &P) {
        if self.host.left() != left {
            publisher.publish(KeycodeEvent::remapped(keys::LEFT_SHIFT, left));
            self.host.set_left(left);
        }
        if self.host.right() != right {
            publisher.publish(KeycodeEvent::remapped(keys::RIGHT_SHIFT, right));
            self.host.set_right(right);
        }
    }

    fn forget(&mut self, source: KeyCode) -> Option<HeldRemap> {
        let index = self.held.iter().position(|held| held.source == source)?;
        Some(self.held.remove(index))
    }
}

/// [`RemapEngine`] in the keycode listener chain, substitutes go to `publisher`
pub struct RemapListener<'p, P: EventPublisher<KeycodeEvent>> {
    engine: RemapEngine,
    publisher: &'p P,
}

impl<'p, P: EventPublisher<KeycodeEvent>> RemapListener<'p, P> {
    pub fn new(engine: RemapEngine, publisher: &'p P) -> Self {
        Self { engine, publisher }
    }

    pub fn engine(&self) -> &RemapEngine {
        &self.engine
    }
}

impl<P: EventPublisher<KeycodeEvent>> EventListener<KeycodeEvent> for RemapListener<'_, P> {
    fn on_event(&mut self, event: &KeycodeEvent) -> EventResult {
        self.engine.process(event, self.publisher)
    }
}
