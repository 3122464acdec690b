//! Process-wide resolution state.
//!
//! Written by the sighting workers and the command path concurrently. The
//! current area and cell are atomics; the learning session is replaced as a
//! whole under a small lock. Nothing here is persisted: a restart begins with
//! no current area, no current cell and no learning session.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tessel_types::{AreaId, CellRowId, ROW_NONE};

use crate::learning::LearningSession;

#[derive(Debug)]
pub struct ResolutionState {
    current_area: AtomicI64,
    current_cell: AtomicI64,
    learning: Mutex<Option<LearningSession>>,
}

/// Point-in-time copy of [`ResolutionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub current_area_id: Option<AreaId>,
    pub current_cell_row_id: Option<CellRowId>,
    pub learning: Option<LearningSession>,
}

fn row(value: i64) -> Option<i64> {
    (value != ROW_NONE).then_some(value)
}

impl ResolutionState {
    pub fn new() -> Self {
        Self {
            current_area: AtomicI64::new(ROW_NONE),
            current_cell: AtomicI64::new(ROW_NONE),
            learning: Mutex::new(None),
        }
    }

    pub fn current_area(&self) -> Option<AreaId> {
        row(self.current_area.load(Ordering::Acquire))
    }

    /// Set the current area, returning the previous one.
    pub fn swap_current_area(&self, area_id: AreaId) -> Option<AreaId> {
        row(self.current_area.swap(area_id, Ordering::AcqRel))
    }

    pub fn current_cell(&self) -> Option<CellRowId> {
        row(self.current_cell.load(Ordering::Acquire))
    }

    pub fn set_current_cell(&self, cell_row_id: CellRowId) {
        self.current_cell.store(cell_row_id, Ordering::Release);
    }

    /// Start (or replace) the learning session.
    pub fn start_learning(&self, target: AreaId, until_ms: u64) -> LearningSession {
        let session = LearningSession {
            target_area_id: target,
            until_ms,
        };
        *self.learning.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
        session
    }

    /// End the session if it targets `area_id`. Returns whether one was ended.
    pub fn end_learning_for(&self, area_id: AreaId) -> bool {
        let mut learning = self.learning.lock().unwrap_or_else(PoisonError::into_inner);
        if learning.is_some_and(|session| session.target_area_id == area_id) {
            *learning = None;
            return true;
        }
        false
    }

    /// The last session started, active or not.
    pub fn learning_session(&self) -> Option<LearningSession> {
        *self.learning.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Target area if a session is active at `now_ms`.
    pub fn learning_target(&self, now_ms: u64) -> Option<AreaId> {
        self.learning_session()
            .filter(|session| session.is_active(now_ms))
            .map(|session| session.target_area_id)
    }

    pub fn snapshot(&self, now_ms: u64) -> StateSnapshot {
        StateSnapshot {
            current_area_id: self.current_area(),
            current_cell_row_id: self.current_cell(),
            learning: self
                .learning_session()
                .filter(|session| session.is_active(now_ms)),
        }
    }
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self::new()
    }
}
