//! The split link and the host services the power controller depends on.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::LinkError;
use crate::power::ConnectionProfile;

/// Role of the local device in a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionRole {
    Central,
    Peripheral,
}

/// Transport of a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionKind {
    /// Bluetooth Low Energy
    Le,
    /// Bluetooth BR/EDR
    BrEdr,
    /// Synchronous connection, SCO or eSCO
    Sco,
}

/// What the host stack reports about a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkInfo {
    /// Connection handle assigned by the controller
    pub handle: u16,
    pub role: ConnectionRole,
    pub kind: ConnectionKind,
}

impl LinkInfo {
    /// The central half talks to its peripheral half as LE central; every other connection (hosts, scanners, ...)
    /// is not the split link.
    pub fn is_split_peripheral(&self) -> bool {
        self.role == ConnectionRole::Central && self.kind == ConnectionKind::Le
    }
}

/// A reference to an established connection.
///
/// The power controller holds at most one of these. Dropping it releases the reference.
pub trait SplitLink {
    fn info(&self) -> LinkInfo;

    fn handle(&self) -> u16 {
        self.info().handle
    }

    /// Request new connection parameters, either all of them are applied or none.
    async fn update_conn_params(&mut self, profile: &ConnectionProfile) -> Result<(), LinkError>;
}

/// Whether the keyboard is powered over USB
pub trait UsbPower {
    fn is_powered(&self) -> bool;
}

impl UsbPower for AtomicBool {
    fn is_powered(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: UsbPower + ?Sized> UsbPower for &T {
    fn is_powered(&self) -> bool {
        (**self).is_powered()
    }
}

/// Wrap a closure as a [`UsbPower`] source, e.g. one which reads the VBUS detect register.
pub struct UsbPowerFn<F: Fn() -> bool>(pub F);

impl<F: Fn() -> bool> UsbPower for UsbPowerFn<F> {
    fn is_powered(&self) -> bool {
        (self.0)()
    }
}
