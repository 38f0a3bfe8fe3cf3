//! Battery metrics derived from a sensor reading
//!
//! Nothing here is persisted; every query takes a fresh reading and the
//! derived values fall out of the live calibration window.

use crate::settings::CalibrationConfig;
use crate::traits::{PowerSensor, SensorError};

/// Current above this is treated as "charging"
///
/// The margin keeps measurement noise around zero from flapping the flag.
pub const CHARGING_THRESHOLD_A: f32 = 0.05;

/// One sample of the power rail, taken at query time
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Bus voltage in volts
    pub bus_voltage_v: f32,
    /// Signed current in amperes
    pub current_a: f32,
    /// Power in watts; only sampled when the query asks for it
    pub power_w: Option<f32>,
}

impl SensorReading {
    /// Take one fresh sample
    ///
    /// Voltage and current are always read; the charge percentage, hours
    /// remaining, and charging flag all derive from this single sample so
    /// one reply is internally consistent.
    pub fn sample<P: PowerSensor>(sensor: &mut P, with_power: bool) -> Result<Self, SensorError> {
        let bus_voltage_v = sensor.bus_voltage_v()?;
        let current_a = sensor.current_a()?;
        let power_w = if with_power {
            Some(sensor.power_w()?)
        } else {
            None
        };
        Ok(Self {
            bus_voltage_v,
            current_a,
            power_w,
        })
    }

    /// Charge percentage: the voltage's position inside the calibration
    /// window, clamped to [0, 100]
    pub fn charge_pct(&self, config: &CalibrationConfig) -> f32 {
        let span = config.max_v - config.min_v;
        100.0 * ((self.bus_voltage_v - config.min_v) / span).clamp(0.0, 1.0)
    }

    /// Estimated runtime left, assuming capacity scales linearly with charge
    pub fn hours_remaining(&self, config: &CalibrationConfig) -> f32 {
        config.capacity_hours * self.charge_pct(config) / 100.0
    }

    /// Charging-direction heuristic
    pub fn is_charging(&self) -> bool {
        self.current_a > CHARGING_THRESHOLD_A
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reading(bus_voltage_v: f32) -> SensorReading {
        SensorReading {
            bus_voltage_v,
            current_a: 0.0,
            power_w: None,
        }
    }

    fn config(min_v: f32, max_v: f32, capacity_hours: f32) -> CalibrationConfig {
        CalibrationConfig {
            min_v,
            max_v,
            capacity_hours,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn test_charge_pct_inside_window() {
        let config = config(20.0, 30.0, 10.0);
        assert_eq!(reading(25.0).charge_pct(&config), 50.0);
        assert_eq!(reading(20.0).charge_pct(&config), 0.0);
        assert_eq!(reading(30.0).charge_pct(&config), 100.0);
    }

    #[test]
    fn test_charge_pct_clamps_outside_window() {
        let config = config(20.0, 30.0, 10.0);
        assert_eq!(reading(-500.0).charge_pct(&config), 0.0);
        assert_eq!(reading(500.0).charge_pct(&config), 100.0);
    }

    #[test]
    fn test_hours_remaining_scales_with_charge() {
        let config = config(20.0, 30.0, 10.0);
        assert_eq!(reading(25.0).hours_remaining(&config), 5.0);
        assert_eq!(reading(30.0).hours_remaining(&config), 10.0);
        assert_eq!(reading(0.0).hours_remaining(&config), 0.0);
    }

    #[test]
    fn test_charging_threshold() {
        let mut sample = reading(25.0);
        sample.current_a = 0.051;
        assert!(sample.is_charging());
        sample.current_a = 0.05;
        assert!(!sample.is_charging());
        sample.current_a = -1.2;
        assert!(!sample.is_charging());
    }

    proptest! {
        #[test]
        fn charge_pct_always_in_bounds(volts in -10_000.0f32..10_000.0) {
            let config = config(20.0, 30.0, 10.0);
            let pct = reading(volts).charge_pct(&config);
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }
}
