//! Sighting normalization.

use tessel_types::cell::{CellKey, NetworkType, RawCellLocation};

/// Turns raw radio readings into cell keys.
///
/// The network type is fixed when the observer is registered and is never
/// re-derived from a reading.
#[derive(Debug, Clone, Copy)]
pub struct SightingNormalizer {
    network_type: NetworkType,
}

impl SightingNormalizer {
    pub fn new(network_type: NetworkType) -> Self {
        Self { network_type }
    }

    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    /// Extract the cell key, or `None` when the reading carries no signal.
    pub fn normalize(&self, raw: &RawCellLocation) -> Option<CellKey> {
        let cell_id = match self.network_type {
            NetworkType::Cdma => raw.base_station_id,
            NetworkType::Gsm => raw.cid,
        };
        if cell_id < 0 {
            tracing::debug!(network = %self.network_type, "no signal");
            return None;
        }
        Some(CellKey::new(cell_id, self.network_type))
    }
}
