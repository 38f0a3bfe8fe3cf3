//! Binary layout of the persisted calibration record
//!
//! The record is a fixed-size little-endian blob in one flash block:
//!
//! ```text
//! ┌────────┬─────────┬───────┬───────┬──────────┬───────────┐
//! │ magic  │ version │ min_v │ max_v │ capacity │ magic_inv │
//! │ u32    │ u32     │ f32   │ f32   │ f32 (v2) │ u32       │
//! └────────┴─────────┴───────┴───────┴──────────┴───────────┘
//! ```
//!
//! Integrity is magic plus its bitwise inverse - enough to tell an erased
//! or grossly corrupted block from a record, not a checksum. Schema 1
//! (no capacity field) is a strict structural prefix of schema 2 apart
//! from the trailing inverted magic, so migration reads the old layout and
//! back-fills the capacity default.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Magic number identifying a settings record
pub const SETTINGS_MAGIC: u32 = 0x5354_4731; // "STG1"

/// Current record schema version
pub const SCHEMA_VERSION: u32 = 2;

/// First schema version; lacked the capacity field
pub const SCHEMA_VERSION_V1: u32 = 1;

/// Serialized record size, current schema
pub const RECORD_LEN: usize = 24;

/// Serialized record size, schema 1
pub const RECORD_LEN_V1: usize = 20;

/// Default minimum threshold voltage
pub const DEFAULT_MIN_V: f32 = 21.0;
/// Default maximum threshold voltage
pub const DEFAULT_MAX_V: f32 = 32.2;
/// Default battery capacity in hours
pub const DEFAULT_CAPACITY_HOURS: f32 = 10.0;

/// Thresholds must lie strictly inside this window to be believed
const THRESHOLD_FLOOR: f32 = -100.0;
const THRESHOLD_CEIL: f32 = 1000.0;

/// Capacity must be in `[0, CAPACITY_CEIL)`
const CAPACITY_CEIL: f32 = 10_000.0;

/// Largest capacity the configure clamp will store; just inside the
/// load-time gate so a clamped value survives the next boot
const CAPACITY_CLAMP: f32 = 9_999.9;

/// Live calibration values
///
/// Created from hard-coded defaults when no valid record exists, mutated
/// only by a configure request, persisted immediately on every accepted
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Voltage regarded as 0% charge
    pub min_v: f32,
    /// Voltage regarded as 100% charge
    pub max_v: f32,
    /// Battery capacity at full charge, in hours of runtime
    pub capacity_hours: f32,
    /// Schema this config conforms to (always current in memory)
    pub schema_version: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_v: DEFAULT_MIN_V,
            max_v: DEFAULT_MAX_V,
            capacity_hours: DEFAULT_CAPACITY_HOURS,
            schema_version: SCHEMA_VERSION,
        }
    }
}

impl CalibrationConfig {
    /// Range and ordering checks applied to any record read from flash
    pub fn is_valid(&self) -> bool {
        self.max_v > self.min_v
            && self.min_v > THRESHOLD_FLOOR
            && self.min_v < THRESHOLD_CEIL
            && self.max_v > THRESHOLD_FLOOR
            && self.max_v < THRESHOLD_CEIL
            && self.capacity_hours >= 0.0
            && self.capacity_hours < CAPACITY_CEIL
    }

    /// Serialize under the current schema
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[0..4].copy_from_slice(&SETTINGS_MAGIC.to_le_bytes());
        record[4..8].copy_from_slice(&SCHEMA_VERSION.to_le_bytes());
        record[8..12].copy_from_slice(&self.min_v.to_le_bytes());
        record[12..16].copy_from_slice(&self.max_v.to_le_bytes());
        record[16..20].copy_from_slice(&self.capacity_hours.to_le_bytes());
        record[20..24].copy_from_slice(&(!SETTINGS_MAGIC).to_le_bytes());
        record
    }

    /// Deserialize a current-schema record, or `None` if the block does not
    /// hold one (wrong magic, wrong version, out-of-range values)
    pub fn decode(block: &[u8]) -> Option<CalibrationConfig> {
        if block.len() < RECORD_LEN {
            return None;
        }
        if read_u32(block, 0) != SETTINGS_MAGIC
            || read_u32(block, 20) != !SETTINGS_MAGIC
            || read_u32(block, 4) != SCHEMA_VERSION
        {
            return None;
        }
        let config = CalibrationConfig {
            min_v: read_f32(block, 8),
            max_v: read_f32(block, 12),
            capacity_hours: read_f32(block, 16),
            schema_version: SCHEMA_VERSION,
        };
        config.is_valid().then_some(config)
    }

    /// Deserialize a schema-1 record, back-filling the capacity default
    ///
    /// The caller is expected to re-save the result under the current
    /// schema immediately.
    pub fn decode_v1(block: &[u8]) -> Option<CalibrationConfig> {
        if block.len() < RECORD_LEN_V1 {
            return None;
        }
        if read_u32(block, 0) != SETTINGS_MAGIC
            || read_u32(block, 16) != !SETTINGS_MAGIC
            || read_u32(block, 4) != SCHEMA_VERSION_V1
        {
            return None;
        }
        let config = CalibrationConfig {
            min_v: read_f32(block, 8),
            max_v: read_f32(block, 12),
            capacity_hours: DEFAULT_CAPACITY_HOURS,
            schema_version: SCHEMA_VERSION,
        };
        config.is_valid().then_some(config)
    }

    /// Apply a partial update from a configure request
    ///
    /// Reversed thresholds are swapped rather than rejected; capacity is
    /// clamped into its valid range. No further validation happens here -
    /// the load-time gate is the arbiter of what survives a reboot.
    pub fn apply(&self, update: &galvani_protocol::ConfigUpdate) -> CalibrationConfig {
        let mut next = *self;
        if let Some(value) = update.min_v {
            next.min_v = value;
        }
        if let Some(value) = update.max_v {
            next.max_v = value;
        }
        if let Some(value) = update.capacity_hours {
            next.capacity_hours = value;
        }
        if next.max_v <= next.min_v {
            core::mem::swap(&mut next.min_v, &mut next.max_v);
        }
        next.capacity_hours = next.capacity_hours.clamp(0.0, CAPACITY_CLAMP);
        next
    }
}

fn read_u32(block: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

fn read_f32(block: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use galvani_protocol::ConfigUpdate;

    /// Hand-build a schema-1 record
    fn v1_record(min_v: f32, max_v: f32) -> [u8; RECORD_LEN_V1] {
        let mut record = [0u8; RECORD_LEN_V1];
        record[0..4].copy_from_slice(&SETTINGS_MAGIC.to_le_bytes());
        record[4..8].copy_from_slice(&SCHEMA_VERSION_V1.to_le_bytes());
        record[8..12].copy_from_slice(&min_v.to_le_bytes());
        record[12..16].copy_from_slice(&max_v.to_le_bytes());
        record[16..20].copy_from_slice(&(!SETTINGS_MAGIC).to_le_bytes());
        record
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(CalibrationConfig::default().is_valid());
    }

    #[test]
    fn test_encode_layout() {
        let config = CalibrationConfig::default();
        let record = config.encode();
        assert_eq!(&record[0..4], &SETTINGS_MAGIC.to_le_bytes());
        assert_eq!(&record[4..8], &2u32.to_le_bytes());
        assert_eq!(&record[8..12], &21.0f32.to_le_bytes());
        assert_eq!(&record[12..16], &32.2f32.to_le_bytes());
        assert_eq!(&record[16..20], &10.0f32.to_le_bytes());
        assert_eq!(&record[20..24], &(!SETTINGS_MAGIC).to_le_bytes());
    }

    #[test]
    fn test_decode_roundtrip() {
        let config = CalibrationConfig {
            min_v: 20.5,
            max_v: 31.8,
            capacity_hours: 12.0,
            schema_version: SCHEMA_VERSION,
        };
        assert_eq!(CalibrationConfig::decode(&config.encode()), Some(config));
    }

    #[test]
    fn test_decode_rejects_erased_block() {
        assert_eq!(CalibrationConfig::decode(&[0xFF; RECORD_LEN]), None);
    }

    #[test]
    fn test_decode_rejects_corrupt_inverse_magic() {
        let mut record = CalibrationConfig::default().encode();
        record[20] ^= 0x01;
        assert_eq!(CalibrationConfig::decode(&record), None);
    }

    #[test]
    fn test_decode_rejects_out_of_range_thresholds() {
        let config = CalibrationConfig {
            min_v: 21.0,
            max_v: 5000.0,
            capacity_hours: 10.0,
            schema_version: SCHEMA_VERSION,
        };
        assert_eq!(CalibrationConfig::decode(&config.encode()), None);
    }

    #[test]
    fn test_decode_v1_backfills_capacity() {
        let config = CalibrationConfig::decode_v1(&v1_record(22.0, 29.5)).unwrap();
        assert_eq!(config.min_v, 22.0);
        assert_eq!(config.max_v, 29.5);
        assert_eq!(config.capacity_hours, DEFAULT_CAPACITY_HOURS);
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_decode_v1_rejects_current_schema() {
        // A v2 record must not be misread under the v1 layout
        let record = CalibrationConfig::default().encode();
        assert_eq!(CalibrationConfig::decode_v1(&record), None);
    }

    #[test]
    fn test_apply_swaps_reversed_thresholds() {
        let config = CalibrationConfig::default();
        let next = config.apply(&ConfigUpdate {
            min_v: Some(30.0),
            max_v: Some(20.0),
            capacity_hours: None,
        });
        assert_eq!(next.min_v, 20.0);
        assert_eq!(next.max_v, 30.0);
        assert!(next.max_v > next.min_v);
    }

    #[test]
    fn test_apply_partial_update_keeps_other_fields() {
        let config = CalibrationConfig::default();
        let next = config.apply(&ConfigUpdate {
            min_v: None,
            max_v: None,
            capacity_hours: Some(24.0),
        });
        assert_eq!(next.min_v, config.min_v);
        assert_eq!(next.max_v, config.max_v);
        assert_eq!(next.capacity_hours, 24.0);
    }

    #[test]
    fn test_apply_clamps_capacity() {
        let config = CalibrationConfig::default();
        let next = config.apply(&ConfigUpdate {
            min_v: None,
            max_v: None,
            capacity_hours: Some(-4.0),
        });
        assert_eq!(next.capacity_hours, 0.0);

        let next = config.apply(&ConfigUpdate {
            min_v: None,
            max_v: None,
            capacity_hours: Some(1.0e9),
        });
        assert!(next.capacity_hours < CAPACITY_CEIL);
        assert!(next.is_valid());
    }
}
