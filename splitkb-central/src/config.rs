//! Tunable configuration of the central firmware core.

use embassy_time::Duration;
use splitkb_types::keycode::{KeyCode, keys};

use crate::error::{ConfigError, ConfigResult};
use crate::power::{ConnectionProfile, PowerMode};
use crate::remap::table::{RemapEntry, US_ON_JIS};

/// Smallest connection interval allowed by Bluetooth LE, in 1.25 ms units
pub const BLE_MIN_CONN_INTERVAL: u16 = 6;
/// Largest connection interval allowed by Bluetooth LE, in 1.25 ms units
pub const BLE_MAX_CONN_INTERVAL: u16 = 3200;
/// Largest peripheral latency allowed by Bluetooth LE, in connection events
pub const BLE_MAX_CONN_LATENCY: u16 = 499;
/// Supervision timeout range allowed by Bluetooth LE, in 10 ms units
pub const BLE_MIN_SUPERVISION_TIMEOUT: u16 = 10;
pub const BLE_MAX_SUPERVISION_TIMEOUT: u16 = 3200;

/// The config struct of the central firmware core.
#[derive(Clone, Copy, Debug, Default)]
pub struct CentralConfig {
    pub power: PowerConfig,
    pub remap: RemapConfig,
}

/// Configuration of the idle-driven power modes.
///
/// The connection parameters of the active mode are the preferred parameters of the split link, deeper modes are
/// derived from them, see [`ConnectionProfile::for_mode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// Preferred connection interval of the split link, in 1.25 ms units
    pub conn_interval: u16,
    /// Preferred peripheral latency of the split link, in connection events
    pub conn_latency: u16,
    /// Supervision timeout of the split link, in 10 ms units
    pub supervision_timeout: u16,
    /// Idle time after which the link enters [`PowerMode::Sleep1`]
    pub sleep1_timeout: Duration,
    /// Idle time after which the link enters [`PowerMode::Sleep2`]
    pub sleep2_timeout: Duration,
    /// Idle time after which the link enters [`PowerMode::Sleep3`]
    pub sleep3_timeout: Duration,
    /// Re-evaluation period while USB power is present
    pub usb_poll_interval: Duration,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            conn_interval: 6,
            conn_latency: 30,
            supervision_timeout: 400,
            sleep1_timeout: Duration::from_millis(5000),
            sleep2_timeout: Duration::from_millis(15000),
            sleep3_timeout: Duration::from_millis(30000),
            usb_poll_interval: Duration::from_millis(5000),
        }
    }
}

impl PowerConfig {
    /// Idle time after which `mode` is entered, zero for [`PowerMode::Active`]
    pub fn threshold(&self, mode: PowerMode) -> Duration {
        match mode {
            PowerMode::Active => Duration::from_ticks(0),
            PowerMode::Sleep1 => self.sleep1_timeout,
            PowerMode::Sleep2 => self.sleep2_timeout,
            PowerMode::Sleep3 => self.sleep3_timeout,
        }
    }

    /// Check the configuration against the BLE limits and the ordering of the sleep thresholds.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sleep1_timeout.as_ticks() == 0 {
            return Err(ConfigError::Validation {
                field: "sleep1_timeout",
                message: "must be larger than zero",
            });
        }
        if self.sleep2_timeout <= self.sleep1_timeout || self.sleep3_timeout <= self.sleep2_timeout {
            return Err(ConfigError::Validation {
                field: "sleep_timeout",
                message: "sleep thresholds must be strictly increasing",
            });
        }
        if self.usb_poll_interval.as_ticks() == 0 {
            return Err(ConfigError::Validation {
                field: "usb_poll_interval",
                message: "must be larger than zero",
            });
        }

        let deepest_interval = self.conn_interval as u32 * PowerMode::Sleep3.interval_multiplier() as u32;
        if self.conn_interval < BLE_MIN_CONN_INTERVAL || deepest_interval > BLE_MAX_CONN_INTERVAL as u32 {
            return Err(ConfigError::InvalidValue {
                field: "conn_interval",
                value: self.conn_interval as u32,
                expected: "6 to 400, so that the sleep3 interval stays within 3200",
            });
        }
        if self.conn_latency > BLE_MAX_CONN_LATENCY {
            return Err(ConfigError::InvalidValue {
                field: "conn_latency",
                value: self.conn_latency as u32,
                expected: "0 to 499",
            });
        }
        if self.supervision_timeout < BLE_MIN_SUPERVISION_TIMEOUT
            || self.supervision_timeout > BLE_MAX_SUPERVISION_TIMEOUT
        {
            return Err(ConfigError::InvalidValue {
                field: "supervision_timeout",
                value: self.supervision_timeout as u32,
                expected: "10 to 3200",
            });
        }

        for mode in PowerMode::ALL {
            if !ConnectionProfile::for_mode(self, mode).is_timeout_sufficient() {
                return Err(ConfigError::Validation {
                    field: "supervision_timeout",
                    message: "must exceed (1 + latency) * interval * 2 in every power mode",
                });
            }
        }

        Ok(())
    }
}

/// Configuration of the keycode remap engine
#[derive(Clone, Copy, Debug)]
pub struct RemapConfig {
    /// The remap table, keyed by source keycode
    pub table: &'static [RemapEntry],
    /// Keycode which replaces CapsLock, `None` lets CapsLock pass through
    pub caps_lock_target: Option<KeyCode>,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            table: US_ON_JIS,
            caps_lock_target: Some(keys::INTERNATIONAL1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PowerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_thresholds_must_increase() {
        let config = PowerConfig {
            sleep2_timeout: Duration::from_millis(5000),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "sleep_timeout",
                ..
            })
        ));

        let config = PowerConfig {
            sleep1_timeout: Duration::from_millis(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deepest_interval_must_fit() {
        let config = PowerConfig {
            conn_interval: 401,
            supervision_timeout: 3200,
            conn_latency: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "conn_interval",
                value: 401,
                expected: "6 to 400, so that the sleep3 interval stays within 3200",
            })
        );
    }

    #[test]
    fn test_supervision_timeout_too_short() {
        // Active: (1 + 30) * 6 = 186 >= 4 * 40
        let config = PowerConfig {
            supervision_timeout: 40,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "supervision_timeout",
                ..
            })
        ));
    }

    #[test]
    fn test_threshold_lookup() {
        let config = PowerConfig::default();
        assert_eq!(config.threshold(PowerMode::Active), Duration::from_ticks(0));
        assert_eq!(config.threshold(PowerMode::Sleep2), Duration::from_millis(15000));
    }
}
