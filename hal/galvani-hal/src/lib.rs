//! Galvani Hardware Abstraction Layer
//!
//! This crate defines the hardware contracts the telemetry core relies on,
//! implemented by chip-specific HALs. The core never touches a peripheral
//! register directly; it sees exactly two capabilities:
//!
//! - [`i2c::I2cBus`] - blocking two-wire transactions with the power sensor
//! - [`flash::SettingsFlash`] - one fixed block of non-volatile storage for
//!   the persisted calibration record
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (galvani-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  galvani-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  galvani-hal-rp2040                     │
//! └─────────────────────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, SettingsFlash};
pub use i2c::I2cBus;
