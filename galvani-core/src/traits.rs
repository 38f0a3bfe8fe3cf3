//! Hardware abstraction traits
//!
//! The dispatcher talks to the power sensor through this seam so the core
//! can be exercised on a host without an I2C bus.

/// Errors from sensor read operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// The register transaction failed
    ///
    /// Reads are single blocking transactions with no retry; the failure is
    /// reported to the host and the next query starts fresh.
    Bus,
}

/// A calibrated bus-voltage/current sensor
///
/// Every method performs one blocking register read and scales the raw
/// value to physical units. Implementations do not cache: a query is
/// answered from registers sampled at query time.
pub trait PowerSensor {
    /// Bus voltage in volts
    fn bus_voltage_v(&mut self) -> Result<f32, SensorError>;

    /// Voltage across the shunt resistor in volts
    fn shunt_voltage_v(&mut self) -> Result<f32, SensorError>;

    /// Current through the shunt in amperes (signed; negative = discharge
    /// direction reversed)
    fn current_a(&mut self) -> Result<f32, SensorError>;

    /// Power in watts
    fn power_w(&mut self) -> Result<f32, SensorError>;
}
