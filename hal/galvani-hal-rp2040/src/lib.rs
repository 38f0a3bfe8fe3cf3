//! RP2040-specific HAL for the Galvani power monitor
//!
//! This crate provides RP2040 implementations of the shared `galvani-hal`
//! traits over `embassy-rp`:
//!
//! - Blocking I2C bus for the INA226 (implements `galvani_hal::I2cBus`)
//! - Settings block in the last flash sector (implements
//!   `galvani_hal::SettingsFlash`)

#![no_std]

pub mod flash;
pub mod i2c;

pub use flash::Rp2040SettingsFlash;
pub use i2c::Rp2040I2cBus;

// Re-export shared traits from galvani-hal for convenience
pub use galvani_hal::{I2cBus as I2cBusTrait, SettingsFlash as SettingsFlashTrait};
