//! # splitkb central
//!
//! Firmware logic for the central half of a split wireless keyboard:
//!
//! - [`power`] - Idle-driven power modes. The BLE connection parameters of the split link are relaxed step by step
//!   while the user is idle and restored as soon as a key or the trackball moves.
//! - [`remap`] - Keycode remapping which makes a US-printed keyboard type what its legends say on a host configured
//!   for the JIS layout, including the Shift bookkeeping around every substitution.
//!
//! Both parts are driven by events from the host framework, see [`event`] for the event types and the listener
//! chain, and [`link`] for the connection abstraction.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod activity;
pub mod config;
pub mod error;
pub mod event;
pub mod link;
pub mod power;
pub mod remap;

pub use config::{CentralConfig, PowerConfig, RemapConfig};
pub use error::{ConfigError, LinkError};
pub use power::{PowerMode, PowerModeController, PowerState};
pub use remap::RemapEngine;
pub use splitkb_types;

/// Raw mutex type used by channels and signals of this crate
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Capacity of the connection event channel between the host's BLE callbacks and the power task
pub const CONNECTION_EVENT_CHANNEL_SIZE: usize = 4;
/// Number of simultaneously held remapped keys whose press-time resolution is remembered
pub const REMAP_MAX_HELD_KEYS: usize = 10;
