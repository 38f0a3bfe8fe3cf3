//! Load/save discipline for the persisted settings record
//!
//! `load()` never fails: a block that does not hold a valid current-schema
//! record falls through a migration ladder (prior schema, then hard-coded
//! defaults) and the resolved values are re-saved immediately so the next
//! boot is a single direct hit. `save()` always replaces the whole block.

use galvani_hal::{FlashError, SettingsFlash};

use super::record::{CalibrationConfig, RECORD_LEN};

/// Settings persistence manager
///
/// Owns the flash block holding the calibration record.
pub struct SettingsStore<F: SettingsFlash> {
    flash: F,
}

impl<F: SettingsFlash> SettingsStore<F> {
    /// Create a store over the given settings block
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Load the calibration record, migrating or defaulting as needed
    ///
    /// Whenever the stored block did not already match the current schema
    /// exactly - an old-schema record, a corrupt block, an unreadable
    /// block - the resolved values are saved back before returning, so
    /// migration cannot be forgotten by a caller. A save failure here is
    /// swallowed: the returned config is still usable and the next boot
    /// will retry the same ladder.
    pub fn load(&mut self) -> CalibrationConfig {
        let mut block = [0u8; RECORD_LEN];
        if self.flash.read(&mut block).is_ok() {
            if let Some(config) = CalibrationConfig::decode(&block) {
                // Direct hit, nothing to rewrite
                return config;
            }
            if let Some(config) = CalibrationConfig::decode_v1(&block) {
                // Eager migration: rewrite under the current schema now
                let _ = self.save(&config);
                return config;
            }
        }
        let config = CalibrationConfig::default();
        let _ = self.save(&config);
        config
    }

    /// Persist the record, replacing the whole block
    pub fn save(&mut self, config: &CalibrationConfig) -> Result<(), FlashError> {
        self.flash.replace(&config.encode())
    }

    /// Access the underlying flash
    pub fn flash(&self) -> &F {
        &self.flash
    }
}
