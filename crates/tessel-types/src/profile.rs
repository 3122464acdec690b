//! Sound profiles.
//!
//! A profile stores four volume levels, a ringer mode and a wifi setting.
//! Each value can be stored without being applied, so the user's chosen
//! position survives while the device keeps its current value.

use serde::{Deserialize, Serialize};

use crate::{ProfileId, Result, TypesError};

/// Offset subtracted from a stored volume that must not be applied.
pub const VOLUME_SUPPRESS_OFFSET: i64 = 100;

/// Highest volume level that survives the stored encoding.
pub const MAX_VOLUME_LEVEL: u32 = (VOLUME_SUPPRESS_OFFSET - 1) as u32;

/// A profile volume: either applied to the device, or only remembered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Applied(u32),
    Suppressed(u32),
}

impl Volume {
    pub fn new(level: u32, apply: bool) -> Result<Self> {
        if level > MAX_VOLUME_LEVEL {
            return Err(TypesError::VolumeOutOfRange(i64::from(level)));
        }
        Ok(if apply {
            Self::Applied(level)
        } else {
            Self::Suppressed(level)
        })
    }

    /// Decode the integer persisted in the `profile` table.
    pub fn from_stored(value: i64) -> Result<Self> {
        if (0..VOLUME_SUPPRESS_OFFSET).contains(&value) {
            Ok(Self::Applied(value as u32))
        } else if (-VOLUME_SUPPRESS_OFFSET..0).contains(&value) {
            Ok(Self::Suppressed((value + VOLUME_SUPPRESS_OFFSET) as u32))
        } else {
            Err(TypesError::VolumeOutOfRange(value))
        }
    }

    /// Encode for the `profile` table.
    pub fn to_stored(self) -> i64 {
        match self {
            Self::Applied(level) => i64::from(level),
            Self::Suppressed(level) => i64::from(level) - VOLUME_SUPPRESS_OFFSET,
        }
    }

    /// The level the user chose, whether or not it is applied.
    pub fn level(self) -> u32 {
        match self {
            Self::Applied(level) | Self::Suppressed(level) => level,
        }
    }

    /// Level to write to the device, if any.
    pub fn applied_level(self) -> Option<u32> {
        match self {
            Self::Applied(level) => Some(level),
            Self::Suppressed(_) => None,
        }
    }
}

/// Audio stream a volume belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeChannel {
    Ring,
    Notification,
    Media,
    Alarm,
}

/// Ringer mode, with a sentinel to leave the device's mode alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingerMode {
    Keep,
    Silent,
    Vibrate,
    Normal,
}

impl RingerMode {
    pub fn code(self) -> i64 {
        match self {
            Self::Keep => -1,
            Self::Silent => 0,
            Self::Vibrate => 1,
            Self::Normal => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            -1 => Ok(Self::Keep),
            0 => Ok(Self::Silent),
            1 => Ok(Self::Vibrate),
            2 => Ok(Self::Normal),
            other => Err(TypesError::UnknownRingerMode(other)),
        }
    }
}

/// Tri-state wifi setting of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiSetting {
    Keep,
    Enabled,
    Disabled,
}

impl WifiSetting {
    /// Stored as NULL / 1 / 0.
    pub fn to_stored(self) -> Option<i64> {
        match self {
            Self::Keep => None,
            Self::Enabled => Some(1),
            Self::Disabled => Some(0),
        }
    }

    pub fn from_stored(value: Option<i64>) -> Result<Self> {
        match value {
            None => Ok(Self::Keep),
            Some(1) => Ok(Self::Enabled),
            Some(0) => Ok(Self::Disabled),
            Some(other) => Err(TypesError::InvalidWifiSetting(other)),
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Keep => None,
            Self::Enabled => Some(true),
            Self::Disabled => Some(false),
        }
    }
}

/// Editable settings of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub ringtone_volume: Volume,
    pub notification_volume: Volume,
    pub media_volume: Volume,
    pub alarm_volume: Volume,
    pub wifi: WifiSetting,
    pub ringer_mode: RingerMode,
}

impl ProfileSettings {
    /// Settings of a freshly created profile: nothing is applied.
    pub fn untouched() -> Self {
        Self {
            ringtone_volume: Volume::Suppressed(0),
            notification_volume: Volume::Suppressed(0),
            media_volume: Volume::Suppressed(0),
            alarm_volume: Volume::Suppressed(0),
            wifi: WifiSetting::Keep,
            ringer_mode: RingerMode::Keep,
        }
    }

    /// Volumes paired with their channel, in application order.
    pub fn volumes(&self) -> [(VolumeChannel, Volume); 4] {
        [
            (VolumeChannel::Ring, self.ringtone_volume),
            (VolumeChannel::Notification, self.notification_volume),
            (VolumeChannel::Media, self.media_volume),
            (VolumeChannel::Alarm, self.alarm_volume),
        ]
    }
}

/// A stored profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    #[serde(flatten)]
    pub settings: ProfileSettings,
}
