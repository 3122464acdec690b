//! Areas: named places that profiles are bound to.

use serde::{Deserialize, Serialize};

use crate::{AreaId, ProfileId, DEFAULT_AREA_ID};

/// A stored area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub profile_id: Option<ProfileId>,
    pub wifi_enabled: bool,
    pub bluetooth_enabled: bool,
}

impl Area {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_AREA_ID
    }
}

/// Area row joined with the name of its profile, for listing views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub id: AreaId,
    pub name: String,
    pub profile_name: String,
}
