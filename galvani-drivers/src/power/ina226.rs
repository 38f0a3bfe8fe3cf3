//! INA226 bus voltage / current / power monitor
//!
//! TI's INA226 samples the voltage across a shunt resistor and the bus
//! rail, and multiplies them on-chip once a calibration scalar tells it
//! how to map shunt counts to amperes.
//!
//! # Register access
//!
//! All registers are 16 bits, big-endian on the wire. A write is the
//! register pointer followed by two data bytes; a read writes the pointer
//! and reads two bytes back in one repeated-start transaction.
//!
//! # Calibration
//!
//! ```text
//! current_lsb = max_current / 32768        (A/LSB)
//! power_lsb   = 25 * current_lsb           (W/LSB)
//! cal         = 0.00512 / (current_lsb * shunt_ohms), rounded
//! ```
//!
//! `cal` must land in the register's [1, 65535] range or the shunt and
//! full-scale pairing is not representable and init fails.

use galvani_core::traits::{PowerSensor, SensorError};
use galvani_hal::I2cBus;

/// INA226 register addresses
pub mod reg {
    /// Averaging, conversion time, operating mode
    pub const CONFIG: u8 = 0x00;
    /// Shunt voltage drop (signed)
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    /// Bus voltage
    pub const BUS_VOLTAGE: u8 = 0x02;
    /// On-chip power product
    pub const POWER: u8 = 0x03;
    /// On-chip current (signed)
    pub const CURRENT: u8 = 0x04;
    /// Current calibration scalar
    pub const CALIBRATION: u8 = 0x05;
}

/// Default 7-bit address (A0 and A1 strapped to GND)
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Bus voltage register LSB in volts (fixed by the part: 1.25 mV)
pub const BUS_VOLTAGE_LSB_V: f32 = 1.25e-3;

/// Shunt voltage register LSB in volts (fixed by the part: 2.5 uV)
pub const SHUNT_VOLTAGE_LSB_V: f32 = 2.5e-6;

/// AVG=16, VBUSCT=1.1ms, VSHCT=1.1ms, MODE=111 (continuous shunt+bus)
///
/// 16-sample averaging trades ~18 ms of latency for readings quiet enough
/// to derive a stable charge percentage from.
const CONFIG_WORD: u16 = (0b100 << 9) | (0b100 << 6) | (0b100 << 3) | 0b111;

/// INA226 wiring parameters
#[derive(Debug, Clone)]
pub struct Ina226Config {
    /// 7-bit I2C address
    pub address: u8,
    /// Shunt resistance in ohms
    pub shunt_ohms: f32,
    /// Full-scale current in amperes
    pub max_current_a: f32,
}

impl Default for Ina226Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            shunt_ohms: 0.1,
            max_current_a: 2.0,
        }
    }
}

/// Errors from device initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ina226Error {
    /// Calibration scalar falls outside [1, 65535] for this shunt and
    /// full-scale pairing
    CalibrationOutOfRange,
    /// The device did not answer on the bus
    Bus,
}

/// Compute the calibration register value, or `None` if the pairing is
/// not representable
pub fn calibration_scalar(current_lsb: f32, shunt_ohms: f32) -> Option<u16> {
    let cal = 0.00512 / (current_lsb * shunt_ohms);
    if !(1.0..=65535.0).contains(&cal) {
        return None;
    }
    Some((cal + 0.5) as u16)
}

/// A calibrated INA226
pub struct Ina226<I2C> {
    bus: I2C,
    address: u8,
    /// Amperes per LSB of the current register
    current_lsb: f32,
    /// Watts per LSB of the power register
    power_lsb: f32,
}

impl<I2C: I2cBus> Ina226<I2C> {
    /// Calibrate the device and start continuous conversion
    pub fn init(bus: I2C, config: Ina226Config) -> Result<Self, Ina226Error> {
        let current_lsb = config.max_current_a / 32768.0;
        let power_lsb = 25.0 * current_lsb;
        let cal = calibration_scalar(current_lsb, config.shunt_ohms)
            .ok_or(Ina226Error::CalibrationOutOfRange)?;

        let mut device = Self {
            bus,
            address: config.address,
            current_lsb,
            power_lsb,
        };
        device.write_register(reg::CALIBRATION, cal)?;
        device.write_register(reg::CONFIG, CONFIG_WORD)?;
        Ok(device)
    }

    /// Amperes per LSB of the current register
    pub fn current_lsb(&self) -> f32 {
        self.current_lsb
    }

    /// Watts per LSB of the power register
    pub fn power_lsb(&self) -> f32 {
        self.power_lsb
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), Ina226Error> {
        let [hi, lo] = value.to_be_bytes();
        self.bus
            .write(self.address, &[register, hi, lo])
            .map_err(|_| Ina226Error::Bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut raw = [0u8; 2];
        self.bus
            .write_read(self.address, &[register], &mut raw)
            .map_err(|_| SensorError::Bus)?;
        Ok(u16::from_be_bytes(raw))
    }

    fn read_register_signed(&mut self, register: u8) -> Result<i16, SensorError> {
        Ok(self.read_register(register)? as i16)
    }
}

impl<I2C: I2cBus> PowerSensor for Ina226<I2C> {
    fn bus_voltage_v(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_register(reg::BUS_VOLTAGE)? as f32 * BUS_VOLTAGE_LSB_V)
    }

    fn shunt_voltage_v(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_register_signed(reg::SHUNT_VOLTAGE)? as f32 * SHUNT_VOLTAGE_LSB_V)
    }

    fn current_a(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_register_signed(reg::CURRENT)? as f32 * self.current_lsb)
    }

    fn power_w(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_register(reg::POWER)? as f32 * self.power_lsb)
    }
}
