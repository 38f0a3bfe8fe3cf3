//! Settings flash driver for RP2040
//!
//! The calibration record lives in the last 4KB sector of the 2MB flash,
//! well clear of the firmware image. Erase and program run from the ROM
//! routines and stall the core for their duration, which is acceptable:
//! a save happens only on a configure request and the reply goes out
//! afterwards.
//!
//! Implements the `SettingsFlash` trait from `galvani-hal`.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

use galvani_hal::{FlashError, SettingsFlash};

/// Total flash size (2MB on the RP2040-Zero and Pico boards we target)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Settings block is one erase sector
pub const SETTINGS_BLOCK_SIZE: usize = ERASE_SIZE;

/// Fixed offset of the settings block: the last sector
pub const SETTINGS_OFFSET: u32 = (FLASH_SIZE - SETTINGS_BLOCK_SIZE) as u32;

/// Records are programmed as one padded flash page
const PROGRAM_LEN: usize = 256;

/// RP2040 settings flash implementation
pub struct Rp2040SettingsFlash<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> Rp2040SettingsFlash<'d> {
    /// Take ownership of the flash peripheral
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }
}

impl SettingsFlash for Rp2040SettingsFlash<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError> {
        if buf.len() > SETTINGS_BLOCK_SIZE {
            return Err(FlashError::OutOfBounds);
        }
        self.flash
            .blocking_read(SETTINGS_OFFSET, buf)
            .map_err(|_| FlashError::Read)
    }

    fn replace(&mut self, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > PROGRAM_LEN {
            return Err(FlashError::OutOfBounds);
        }

        // Pad to a full page; unused bytes stay in erase state
        let mut page = [0xFF; PROGRAM_LEN];
        page[..data.len()].copy_from_slice(data);

        self.flash
            .blocking_erase(SETTINGS_OFFSET, SETTINGS_OFFSET + SETTINGS_BLOCK_SIZE as u32)
            .map_err(|_| FlashError::Erase)?;
        self.flash
            .blocking_write(SETTINGS_OFFSET, &page)
            .map_err(|_| FlashError::Program)
    }
}
