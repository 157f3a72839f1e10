//! Error types of the central firmware core.
//!
//! Nothing here is fatal: a failed link update is logged and retried by the next natural event, and configuration
//! errors are reported before the controller is constructed.

use core::fmt;

/// Failure reported by the link when a connection parameter update is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The controller or the peer rejected the request, carrying the HCI status code
    Rejected(u8),
    /// The link is already gone
    Disconnected,
    /// No response for the update procedure
    Timeout,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Rejected(status) => write!(f, "connection parameter update rejected, status {:#04x}", status),
            LinkError::Disconnected => write!(f, "link disconnected"),
            LinkError::Timeout => write!(f, "connection parameter update timed out"),
        }
    }
}

/// Invalid power management configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Validation error with context
    Validation { field: &'static str, message: &'static str },
    /// A value is out of its allowed range
    InvalidValue {
        field: &'static str,
        value: u32,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Validation { field, message } => {
                write!(f, "Validation error in '{}': {}", field, message)
            }
            ConfigError::InvalidValue { field, value, expected } => {
                write!(f, "Invalid value '{}' for '{}', expected: {}", value, field, expected)
            }
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error when registering a listener into a [`Dispatcher`](crate::event::Dispatcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// All listener slots are taken
    Full,
}
