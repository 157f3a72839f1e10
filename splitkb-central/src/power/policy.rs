use embassy_time::Duration;

use crate::config::PowerConfig;

/// Power modes of the split link, ordered from most responsive to most power saving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Active,
    Sleep1,
    Sleep2,
    Sleep3,
}

impl PowerMode {
    pub const ALL: [PowerMode; 4] = [PowerMode::Active, PowerMode::Sleep1, PowerMode::Sleep2, PowerMode::Sleep3];

    /// Factor applied to the preferred connection interval in this mode
    pub const fn interval_multiplier(self) -> u16 {
        match self {
            PowerMode::Active => 1,
            PowerMode::Sleep1 => 2,
            PowerMode::Sleep2 => 4,
            PowerMode::Sleep3 => 8,
        }
    }

    /// The next deeper mode, `None` for the deepest one
    pub const fn deeper(self) -> Option<PowerMode> {
        match self {
            PowerMode::Active => Some(PowerMode::Sleep1),
            PowerMode::Sleep1 => Some(PowerMode::Sleep2),
            PowerMode::Sleep2 => Some(PowerMode::Sleep3),
            PowerMode::Sleep3 => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PowerMode::Active => "active",
            PowerMode::Sleep1 => "sleep1",
            PowerMode::Sleep2 => "sleep2",
            PowerMode::Sleep3 => "sleep3",
        }
    }
}

/// BLE connection parameters requested for one power mode.
///
/// Units follow the HCI command: intervals in 1.25 ms, latency in connection events, timeout in 10 ms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionProfile {
    pub interval_min: u16,
    pub interval_max: u16,
    pub latency: u16,
    pub supervision_timeout: u16,
}

impl ConnectionProfile {
    /// Derive the parameters of `mode` from the preferred parameters in `config`.
    ///
    /// The interval is multiplied by 1/2/4/8, the latency is divided by the same factor rounding up, so the time the
    /// peripheral may stay silent stays roughly constant. The supervision timeout is the same in every mode.
    pub fn for_mode(config: &PowerConfig, mode: PowerMode) -> Self {
        let multiplier = mode.interval_multiplier();
        let interval = config.conn_interval.saturating_mul(multiplier);
        let latency = config.conn_latency.saturating_add(multiplier - 1) / multiplier;
        Self {
            interval_min: interval,
            interval_max: interval,
            latency,
            supervision_timeout: config.supervision_timeout,
        }
    }

    /// Maximum connection interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_max as u64 * 1250)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.supervision_timeout as u64 * 10)
    }

    /// The supervision timeout has to be larger than `(1 + latency) * interval_max * 2`
    pub fn is_timeout_sufficient(&self) -> bool {
        // timeout * 10ms > (1 + latency) * interval * 1.25ms * 2
        self.supervision_timeout as u32 * 4 > (1 + self.latency as u32) * self.interval_max as u32
    }
}

/// Select the power mode for the given idle time.
///
/// Every threshold is measured from the last activity, and the deepest mode whose threshold is reached wins. With USB
/// power present the link always stays active.
pub fn target_mode(config: &PowerConfig, idle: Duration, usb_powered: bool) -> PowerMode {
    if usb_powered {
        return PowerMode::Active;
    }

    if idle >= config.sleep3_timeout {
        PowerMode::Sleep3
    } else if idle >= config.sleep2_timeout {
        PowerMode::Sleep2
    } else if idle >= config.sleep1_timeout {
        PowerMode::Sleep1
    } else {
        PowerMode::Active
    }
}

/// Time left until the threshold of the mode one level deeper than `mode`.
///
/// Returns `None` when `mode` is the deepest mode or the boundary is already reached.
pub fn next_boundary(config: &PowerConfig, mode: PowerMode, idle: Duration) -> Option<Duration> {
    let deeper = mode.deeper()?;
    config
        .threshold(deeper)
        .checked_sub(idle)
        .filter(|remaining| remaining.as_ticks() > 0)
}
