//! Persisted calibration settings
//!
//! The host can tune the battery's voltage window and capacity; those
//! values survive power cycles in one fixed flash block. [`record`] owns
//! the binary layout and schema migration, [`store`] owns the load/save
//! discipline on top of the flash trait.

pub mod record;
pub mod store;

pub use record::{
    CalibrationConfig, DEFAULT_CAPACITY_HOURS, DEFAULT_MAX_V, DEFAULT_MIN_V, RECORD_LEN,
    SCHEMA_VERSION, SETTINGS_MAGIC,
};
pub use store::SettingsStore;
