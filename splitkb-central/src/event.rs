//! Event types and the listener chain.
//!
//! Events from the host framework are passed through an ordered chain of [`EventListener`]s. Each listener either
//! lets the event continue ([`EventResult::Bubble`]) or consumes it ([`EventResult::Handled`]), in which case the
//! remaining listeners never see it.
//!
//! Listeners which emit events of their own do so through an [`EventPublisher`], which is implemented for the
//! embassy-sync channels and for a plain recording buffer.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel;
use embassy_sync::pubsub::ImmediatePublisher;
use heapless::Vec;
use splitkb_types::keycode::KeyCode;

use crate::error::DispatchError;

/// Whether an event continues down the listener chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventResult {
    /// Pass the event on to the next listener
    Bubble,
    /// The event is consumed
    Handled,
}

/// Where a keycode event comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventOrigin {
    /// Produced by the keymap from the physical key matrix
    Physical,
    /// Emitted by the remap engine as a substitute
    Remap,
}

/// A keycode was pressed or released
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeycodeEvent {
    pub keycode: KeyCode,
    pub pressed: bool,
    pub origin: EventOrigin,
}

impl KeycodeEvent {
    pub fn press(keycode: KeyCode) -> Self {
        Self {
            keycode,
            pressed: true,
            origin: EventOrigin::Physical,
        }
    }

    pub fn release(keycode: KeyCode) -> Self {
        Self {
            keycode,
            pressed: false,
            origin: EventOrigin::Physical,
        }
    }

    /// An event emitted by the remap engine
    pub fn remapped(keycode: KeyCode, pressed: bool) -> Self {
        Self {
            keycode,
            pressed,
            origin: EventOrigin::Remap,
        }
    }
}

/// Position of a key in the matrix
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

/// A key in the matrix changed its state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionEvent {
    pub pos: KeyPos,
    pub pressed: bool,
}

impl PositionEvent {
    pub fn key(row: u8, col: u8, pressed: bool) -> Self {
        Self {
            pos: KeyPos { row, col },
            pressed,
        }
    }
}

/// Relative motion reported by the trackball or another pointing device
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointingEvent {
    pub dx: i16,
    pub dy: i16,
}

/// Connection lifecycle notification from the BLE host stack
#[derive(Debug)]
pub enum ConnectionEvent<L> {
    /// A connection was established, or failed to establish when `error` is set
    Connected { link: L, error: Option<u8> },
    /// The connection with `handle` is gone
    Disconnected { handle: u16, reason: u8 },
}

/// A listener in the event chain
pub trait EventListener<E> {
    fn on_event(&mut self, event: &E) -> EventResult;
}

/// Ordered chain of listeners for events of type `E`.
///
/// Listeners are called in registration order until one of them returns [`EventResult::Handled`].
pub struct Dispatcher<'a, E, const N: usize> {
    listeners: Vec<&'a mut dyn EventListener<E>, N>,
}

impl<'a, E, const N: usize> Default for Dispatcher<'a, E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E, const N: usize> Dispatcher<'a, E, N> {
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    /// Append a listener to the end of the chain
    pub fn register(&mut self, listener: &'a mut dyn EventListener<E>) -> Result<(), DispatchError> {
        self.listeners.push(listener).map_err(|_| DispatchError::Full)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Run `event` through the chain, returns `Handled` if any listener consumed it
    pub fn dispatch(&mut self, event: &E) -> EventResult {
        for listener in self.listeners.iter_mut() {
            if listener.on_event(event) == EventResult::Handled {
                return EventResult::Handled;
            }
        }
        EventResult::Bubble
    }
}

/// Trait for event publishers
///
/// Emission order is preserved by every implementation.
pub trait EventPublisher<T> {
    fn publish(&self, message: T);
}

impl<T: EventPublisher<E> + ?Sized, E> EventPublisher<E> for &T {
    fn publish(&self, message: E) {
        (**self).publish(message)
    }
}

// Implementations for embassy-sync PubSubChannel
impl<'a, M: RawMutex, T: Clone, const CAP: usize, const SUBS: usize, const PUBS: usize> EventPublisher<T>
    for ImmediatePublisher<'a, M, T, CAP, SUBS, PUBS>
{
    fn publish(&self, message: T) {
        self.publish_immediate(message);
    }
}

// Implementation for embassy-sync Channel
impl<'a, M: RawMutex, T, const N: usize> EventPublisher<T> for channel::Sender<'a, M, T, N> {
    fn publish(&self, message: T) {
        if self.try_send(message).is_err() {
            error!("Send event to Channel error, channel is full");
        }
    }
}

// Recording buffer, drained by the caller
impl<T, const N: usize> EventPublisher<T> for RefCell<Vec<T, N>> {
    fn publish(&self, message: T) {
        if self.borrow_mut().push(message).is_err() {
            error!("Event buffer is full, event dropped");
        }
    }
}
