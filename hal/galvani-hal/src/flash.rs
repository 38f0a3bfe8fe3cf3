//! Settings flash abstractions
//!
//! The persisted calibration record lives in one fixed block of
//! non-volatile storage, sized to a single erase unit at a fixed offset
//! from the end of the addressable flash region. The layout of the record
//! itself belongs to `galvani-core`; this trait only moves raw bytes.
//!
//! There is no wear leveling and no journaling: a save erases the whole
//! block and programs the new record in place. A power loss mid-save can
//! leave the block invalid, which the settings store treats as "no valid
//! record" on the next boot.

/// Errors from settings flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Read from the settings block failed
    Read,
    /// Block erase failed
    Erase,
    /// Programming new data failed
    Program,
    /// Requested more bytes than the block holds
    OutOfBounds,
}

/// One fixed block of non-volatile storage for the settings record
///
/// Implementations own the block's offset and size. Both operations are
/// synchronous and block the caller for the duration of the flash
/// transaction; there is no cancellation once an erase or program begins.
pub trait SettingsFlash {
    /// Read `buf.len()` bytes from the start of the settings block
    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Atomically replace the block contents
    ///
    /// Erases the entire block, then programs `data` at its start. Never a
    /// partial in-place update: the old record is gone before the new one
    /// is written.
    fn replace(&mut self, data: &[u8]) -> Result<(), FlashError>;
}
