//! Commands accepted by the resolution engine.

use serde::{Deserialize, Serialize};

use crate::AreaId;

/// Asynchronous command delivered to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Assign every cell seen during the next `duration_secs` to the target.
    StartLearning {
        target_area_id: AreaId,
        duration_secs: u64,
    },
    /// Re-apply the profile of the last known cell.
    Refresh,
    /// Assign every cell seen during the last `window_secs` (and at least
    /// the most recent one) to the target.
    ReassignHistorical {
        target_area_id: AreaId,
        window_secs: u64,
    },
}

/// Direction of a learn-area request.
///
/// `Forward` learns upcoming cells for the given time; `Backward` claims the
/// cells already seen during it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnWindow {
    Forward { secs: u64 },
    Backward { secs: u64 },
}

impl LearnWindow {
    /// Signed seconds: positive looks forward, negative looks back.
    pub fn from_signed_secs(secs: i64) -> Self {
        if secs > 0 {
            Self::Forward {
                secs: secs.unsigned_abs(),
            }
        } else {
            Self::Backward {
                secs: secs.unsigned_abs(),
            }
        }
    }
}
