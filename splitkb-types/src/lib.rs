//! # splitkb types
//!
//! Value types shared by the central firmware and its tests.
//!
//! - [`keycode`] - Encoded keycodes (usage page, usage id and implicit modifiers) and named constants
//! - [`modifier`] - HID modifier bitfield

#![no_std]

pub mod keycode;
pub mod modifier;
