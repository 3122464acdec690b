//! # tessel-types
//!
//! Shared domain types used across the Tessel workspace: cell identities,
//! areas, profiles and the commands accepted by the resolution engine.

pub mod area;
pub mod cell;
pub mod command;
pub mod profile;

/// Surrogate row id of an area.
pub type AreaId = i64;

/// Surrogate row id of a profile.
pub type ProfileId = i64;

/// Surrogate row id of a cell (not the radio cell identifier).
pub type CellRowId = i64;

/// Row id used where no row is referenced.
pub const ROW_NONE: i64 = -1;

/// Well-known id of the Default Area. It always exists and cannot be
/// renamed, deleted or learned into.
pub const DEFAULT_AREA_ID: AreaId = 0;

/// Errors raised when decoding persisted or wire representations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("unknown network type code: {0}")]
    UnknownNetworkType(i64),

    #[error("unknown ringer mode code: {0}")]
    UnknownRingerMode(i64),

    #[error("stored volume out of range: {0}")]
    VolumeOutOfRange(i64),

    #[error("invalid wifi setting: {0}")]
    InvalidWifiSetting(i64),
}

pub type Result<T> = std::result::Result<T, TypesError>;
