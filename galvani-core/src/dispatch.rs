//! Request dispatch
//!
//! The dispatcher is the single owner of all mutable application state:
//! the live calibration values, the sensor (its absence is the health
//! flag), and the settings store. One framed object goes in, exactly one
//! reply line comes out, and handling is synchronous - there is no queue
//! and no second request in flight.

use galvani_hal::SettingsFlash;
use galvani_protocol::request::{self, ConfigUpdate, FieldSet, QueryField, Request};
use galvani_protocol::response::{
    error_reply, Reply, ReplyWriter, ResponseError, AMPS_DECIMALS, HOURS_DECIMALS,
    PERCENT_DECIMALS, VOLTS_DECIMALS, WATTS_DECIMALS,
};

use crate::battery::SensorReading;
use crate::settings::{CalibrationConfig, SettingsStore};
use crate::traits::PowerSensor;

/// Error code for a failed register transaction
pub const READ_ERROR_CODE: &str = "i2c_read";

/// Error code marking a reply answered without a sensor
pub const SENSOR_MISSING_CODE: &str = "ina226_not_found";

/// Dispatcher states
///
/// Handling is synchronous and single-threaded, so a new object can never
/// arrive while one is being handled; the state exists so the loop's shape
/// is explicit rather than implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    /// Waiting for the framer to yield an object
    Idle,
    /// Computing and emitting one reply
    Handling,
}

/// The control loop's brain: routes requests to the sensor and the
/// settings store and serializes the reply
pub struct Dispatcher<P: PowerSensor, F: SettingsFlash> {
    config: CalibrationConfig,
    /// `None` when the sensor failed to initialize at boot; queries then
    /// degrade instead of hanging
    sensor: Option<P>,
    store: SettingsStore<F>,
    state: DispatchState,
    /// Version tag answered for the `fw` field
    fw_tag: &'static str,
}

impl<P: PowerSensor, F: SettingsFlash> Dispatcher<P, F> {
    /// Create a dispatcher, loading (and migrating) the persisted settings
    pub fn new(sensor: Option<P>, mut store: SettingsStore<F>, fw_tag: &'static str) -> Self {
        let config = store.load();
        Self {
            config,
            sensor,
            store,
            state: DispatchState::Idle,
            fw_tag,
        }
    }

    /// Current state (Idle between requests)
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Live calibration values
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Whether the sensor initialized at boot
    pub fn sensor_available(&self) -> bool {
        self.sensor.is_some()
    }

    /// Handle one framed object and produce its reply line
    pub fn dispatch(&mut self, raw: &[u8]) -> Reply {
        self.state = DispatchState::Handling;
        let reply = self.handle(raw);
        self.state = DispatchState::Idle;
        reply
    }

    fn handle(&mut self, raw: &[u8]) -> Reply {
        let Ok(text) = core::str::from_utf8(raw) else {
            return error_reply(request::RequestError::BadRequest.code());
        };
        match request::parse(text) {
            Err(error) => error_reply(error.code()),
            Ok(Request::Configure(update)) => self.handle_configure(&update),
            Ok(Request::Query(fields)) => self.handle_query(&fields),
        }
    }

    /// Apply a configure and echo the (possibly unchanged) current values
    fn handle_configure(&mut self, update: &ConfigUpdate) -> Reply {
        if !update.is_empty() {
            self.config = self.config.apply(update);
            // Persist immediately; a failed save leaves the RAM values
            // live until reboot and surfaces as a defaults fallback then
            let _ = self.store.save(&self.config);
        }
        finish_or_bail(self.configure_reply())
    }

    fn configure_reply(&self) -> Result<Reply, ResponseError> {
        let mut writer = ReplyWriter::new();
        writer.boolean("ok", true)?;
        writer.number("min_v", self.config.min_v, VOLTS_DECIMALS)?;
        writer.number("max_v", self.config.max_v, VOLTS_DECIMALS)?;
        writer.number("hrs_capacity", self.config.capacity_hours, HOURS_DECIMALS)?;
        writer.finish()
    }

    fn handle_query(&mut self, fields: &FieldSet) -> Reply {
        let reading = match self.sensor.as_mut() {
            None => None,
            Some(sensor) => {
                match SensorReading::sample(sensor, fields.contains(QueryField::Power)) {
                    Ok(reading) => Some(reading),
                    Err(_) => return error_reply(READ_ERROR_CODE),
                }
            }
        };
        finish_or_bail(self.query_reply(fields, reading.as_ref()))
    }

    /// Serialize a query reply
    ///
    /// Without a reading (sensor absent), sensor-derived fields are omitted
    /// entirely - never zero-filled - and the reply carries the
    /// sensor-missing marker alongside whatever can still be answered.
    fn query_reply(
        &self,
        fields: &FieldSet,
        reading: Option<&SensorReading>,
    ) -> Result<Reply, ResponseError> {
        let mut writer = ReplyWriter::new();

        match reading {
            None => {
                writer.string("error", SENSOR_MISSING_CODE)?;
            }
            Some(reading) => {
                if fields.contains(QueryField::BusVoltage) {
                    writer.number("v", reading.bus_voltage_v, VOLTS_DECIMALS)?;
                }
                if fields.contains(QueryField::Current) {
                    writer.number("a", reading.current_a, AMPS_DECIMALS)?;
                }
                if let Some(power) = reading.power_w {
                    writer.number("w", power, WATTS_DECIMALS)?;
                }
                if fields.contains(QueryField::ChargePct) {
                    writer.number("pct", reading.charge_pct(&self.config), PERCENT_DECIMALS)?;
                }
                if fields.contains(QueryField::Charging) {
                    writer.boolean("charging", reading.is_charging())?;
                }
            }
        }

        if fields.contains(QueryField::MinVolts) {
            writer.number("min_v", self.config.min_v, VOLTS_DECIMALS)?;
        }
        if fields.contains(QueryField::MaxVolts) {
            writer.number("max_v", self.config.max_v, VOLTS_DECIMALS)?;
        }
        if fields.contains(QueryField::CapacityHours) {
            writer.number("hrs_capacity", self.config.capacity_hours, HOURS_DECIMALS)?;
        }
        if let (true, Some(reading)) = (fields.contains(QueryField::HoursRemaining), reading) {
            writer.number("hrs_remaining", reading.hours_remaining(&self.config), HOURS_DECIMALS)?;
        }
        if fields.contains(QueryField::FirmwareTag) {
            writer.string("fw", self.fw_tag)?;
        }

        writer.finish()
    }
}

/// A reply that does not fit the buffer cannot happen with the fixed field
/// set; if it ever does, keep the wire alive with an error line.
fn finish_or_bail(result: Result<Reply, ResponseError>) -> Reply {
    result.unwrap_or_else(|_| error_reply(request::RequestError::BadRequest.code()))
}
