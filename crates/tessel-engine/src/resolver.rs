//! Cell to (area name, profile) resolution.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use tessel_db::queries::cells;
use tessel_types::profile::Profile;
use tessel_types::{AreaId, CellRowId};

use crate::Result;

fn default_unknown_area() -> String {
    "Unknown area".to_string()
}

fn default_no_profile() -> String {
    "No profile".to_string()
}

/// Fallback labels shown when resolution comes up empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    /// Shown when the cell cannot be resolved to an area.
    #[serde(default = "default_unknown_area")]
    pub unknown_area: String,
    /// Shown when the area has no profile bound.
    #[serde(default = "default_no_profile")]
    pub no_profile: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            unknown_area: default_unknown_area(),
            no_profile: default_no_profile(),
        }
    }
}

/// What a cell resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// `None` when the cell is unknown.
    pub area_id: Option<AreaId>,
    pub area_name: String,
    pub profile: Option<Profile>,
    /// Profile name, or the no-profile label.
    pub profile_label: String,
}

impl Resolution {
    /// Resolution of a cell that is not in the store.
    pub fn unknown(labels: &Labels) -> Self {
        Self {
            area_id: None,
            area_name: labels.unknown_area.clone(),
            profile: None,
            profile_label: labels.no_profile.clone(),
        }
    }
}

/// Resolve a cell row to its area and the area's profile.
///
/// `None` resolves like an unknown cell.
pub fn resolve(conn: &Connection, cell: Option<CellRowId>, labels: &Labels) -> Result<Resolution> {
    let Some(cell_row_id) = cell else {
        return Ok(Resolution::unknown(labels));
    };
    let Some(binding) = cells::area_binding(conn, cell_row_id)? else {
        tracing::warn!(cell_row_id, "resolved cell is missing from the store");
        return Ok(Resolution::unknown(labels));
    };

    let profile_label = binding
        .profile
        .as_ref()
        .map_or_else(|| labels.no_profile.clone(), |p| p.name.clone());
    Ok(Resolution {
        area_id: Some(binding.area_id),
        area_name: binding.area_name,
        profile: binding.profile,
        profile_label,
    })
}
