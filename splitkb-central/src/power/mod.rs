//! Idle-driven power modes of the split link.
//!
//! The longer the user stays idle, the longer the connection interval between the two halves gets, see
//! [`ConnectionProfile::for_mode`]. [`PowerModeController`] holds the state, [`run_power_manager`] drives it from
//! activity, connection events and its own timer.

mod controller;
mod policy;
mod scheduler;
mod task;

pub use controller::PowerModeController;
pub use policy::{ConnectionProfile, PowerMode, next_boundary, target_mode};
pub use scheduler::{DeadlineTimer, Scheduler};
pub use task::{ActivityListener, run_power_manager};

/// Observable state of the controller, `NoLink` while no split link is tracked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    NoLink,
    Active,
    Sleep1,
    Sleep2,
    Sleep3,
}

impl From<PowerMode> for PowerState {
    fn from(mode: PowerMode) -> Self {
        match mode {
            PowerMode::Active => PowerState::Active,
            PowerMode::Sleep1 => PowerState::Sleep1,
            PowerMode::Sleep2 => PowerState::Sleep2,
            PowerMode::Sleep3 => PowerState::Sleep3,
        }
    }
}
