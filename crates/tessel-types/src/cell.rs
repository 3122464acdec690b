//! Cell identities and raw radio readings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TypesError};

/// Value reported by the radio when a field carries no cell.
pub const NO_SIGNAL: i64 = -1;

/// Radio network family. Fixed when the observer is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Gsm,
    Cdma,
}

impl NetworkType {
    /// Integer stored in `cell.cell_type`.
    pub fn code(self) -> i64 {
        match self {
            Self::Gsm => 1,
            Self::Cdma => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Gsm),
            2 => Ok(Self::Cdma),
            other => Err(TypesError::UnknownNetworkType(other)),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gsm => write!(f, "gsm"),
            Self::Cdma => write!(f, "cdma"),
        }
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gsm" => Ok(Self::Gsm),
            "cdma" => Ok(Self::Cdma),
            other => Err(format!("unknown network type: {other}")),
        }
    }
}

/// Normalized cell identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub cell_id: i64,
    pub network_type: NetworkType,
}

impl CellKey {
    pub fn new(cell_id: i64, network_type: NetworkType) -> Self {
        Self {
            cell_id,
            network_type,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network_type, self.cell_id)
    }
}

/// Raw location reading as delivered by the network observer.
///
/// GSM radios fill `cid`, CDMA radios fill `base_station_id`; the unused
/// field (and a lost signal) carries [`NO_SIGNAL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCellLocation {
    #[serde(default = "no_signal")]
    pub cid: i64,
    #[serde(default = "no_signal")]
    pub base_station_id: i64,
}

fn no_signal() -> i64 {
    NO_SIGNAL
}

impl RawCellLocation {
    pub fn gsm(cid: i64) -> Self {
        Self {
            cid,
            base_station_id: NO_SIGNAL,
        }
    }

    pub fn cdma(base_station_id: i64) -> Self {
        Self {
            cid: NO_SIGNAL,
            base_station_id,
        }
    }

    pub fn no_signal() -> Self {
        Self {
            cid: NO_SIGNAL,
            base_station_id: NO_SIGNAL,
        }
    }
}
