//! Board-agnostic core logic for the Galvani power monitor
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - The power sensor trait the driver crate implements
//! - The persisted calibration record, its schema migration, and the
//!   settings store
//! - Battery metrics derived from a reading (charge percentage, hours
//!   remaining, charging heuristic)
//! - The dispatcher: one framed request in, one reply out

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod battery;
pub mod dispatch;
pub mod settings;
pub mod traits;

pub use dispatch::{DispatchState, Dispatcher};
pub use settings::{CalibrationConfig, SettingsStore};
pub use traits::{PowerSensor, SensorError};
