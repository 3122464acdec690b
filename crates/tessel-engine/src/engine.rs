//! The resolution engine.
//!
//! Sighting flow: resolve the cell in the store (consulting the learning
//! session), log the sighting, then apply the area's profile if the area
//! changed. Resolution state is only touched after the storage writes
//! succeed, so a failed sighting leaves it as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::Mutex;

use tessel_db::queries::{areas, cell_log, cells};
use tessel_types::cell::CellKey;
use tessel_types::command::{Command, LearnWindow};
use tessel_types::{AreaId, CellRowId, DEFAULT_AREA_ID};

use crate::applier::ProfileApplier;
use crate::clock::{duration_millis, Clock};
use crate::learning::LearningSession;
use crate::resolver::{self, Labels, Resolution};
use crate::state::{ResolutionState, StateSnapshot};
use crate::{EngineError, Result};

/// Result of processing one sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SightingOutcome {
    pub ticket: u64,
    pub key: CellKey,
    pub cell_row_id: CellRowId,
    pub area_id: AreaId,
    /// The cell was seen for the first time.
    pub created: bool,
    /// A learning session assigned the area.
    pub learned: bool,
    /// The current area changed and the profile was applied.
    pub applied: bool,
    /// A newer resolution was already applied; state was left alone.
    pub superseded: bool,
}

/// Result of a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    LearningStarted(LearningSession),
    Refreshed(Resolution),
    Reassigned { target_area_id: AreaId, cells: usize },
}

/// Result of [`Engine::learn_area`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnOutcome {
    /// Set for forward learning.
    pub session: Option<LearningSession>,
    pub cells_reassigned: usize,
}

/// Current state together with what the current cell resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    #[serde(flatten)]
    pub state: StateSnapshot,
    pub resolution: Resolution,
}

pub struct Engine {
    db: Arc<Mutex<Connection>>,
    state: ResolutionState,
    clock: Arc<dyn Clock>,
    applier: ProfileApplier,
    labels: Labels,
    tickets: AtomicU64,
}

impl Engine {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        clock: Arc<dyn Clock>,
        applier: ProfileApplier,
        labels: Labels,
    ) -> Self {
        Self {
            db,
            state: ResolutionState::new(),
            clock,
            applier,
            labels,
            tickets: AtomicU64::new(0),
        }
    }

    /// Shared database handle.
    pub fn db(&self) -> &Arc<Mutex<Connection>> {
        &self.db
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Take the next start-order ticket.
    pub fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Process one normalized sighting.
    ///
    /// `ticket` must have been taken with [`Engine::next_ticket`] when the
    /// sighting was received.
    pub async fn process_sighting(&self, ticket: u64, key: CellKey) -> Result<SightingOutcome> {
        let learn_target = self.state.learning_target(self.clock.monotonic_millis());

        let (resolved, resolution, learn_target) = {
            let conn = self.db.lock().await;
            let learn_target = self.live_target(&conn, learn_target)?;
            let resolved = cells::resolve_or_create(&conn, key, learn_target)?;
            cell_log::append(&conn, resolved.cell_row_id, self.clock.unix_millis())?;
            let resolution = resolver::resolve(&conn, Some(resolved.cell_row_id), &self.labels)?;
            (resolved, resolution, learn_target)
        };

        let mut outcome = SightingOutcome {
            ticket,
            key,
            cell_row_id: resolved.cell_row_id,
            area_id: resolved.area_id,
            created: resolved.created,
            learned: learn_target.is_some(),
            applied: false,
            superseded: false,
        };
        if resolved.created {
            tracing::debug!(cell = %key, area_id = resolved.area_id, "new cell stored");
        }

        let Some(permit) = self.applier.admit(ticket).await else {
            outcome.superseded = true;
            return Ok(outcome);
        };
        let previous = self.state.swap_current_area(resolved.area_id);
        self.state.set_current_cell(resolved.cell_row_id);

        if previous != Some(resolved.area_id) {
            tracing::info!(
                cell = %key,
                area = %resolution.area_name,
                profile = %resolution.profile_label,
                "area changed"
            );
            permit.apply(&resolution);
            outcome.applied = true;
        }
        Ok(outcome)
    }

    /// Dispatch a [`Command`].
    pub async fn handle_command(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::StartLearning {
                target_area_id,
                duration_secs,
            } => {
                let session = self
                    .start_learning(target_area_id, Duration::from_secs(duration_secs))
                    .await?;
                Ok(CommandOutcome::LearningStarted(session))
            }
            Command::Refresh => Ok(CommandOutcome::Refreshed(self.refresh().await?)),
            Command::ReassignHistorical {
                target_area_id,
                window_secs,
            } => {
                let cells = self
                    .reassign_since(target_area_id, Duration::from_secs(window_secs))
                    .await?;
                Ok(CommandOutcome::Reassigned {
                    target_area_id,
                    cells,
                })
            }
        }
    }

    /// Start a learning session, replacing any session in flight.
    pub async fn start_learning(
        &self,
        target: AreaId,
        duration: Duration,
    ) -> Result<LearningSession> {
        if duration.is_zero() {
            return Err(EngineError::InvalidCommand(
                "learning duration must be positive".into(),
            ));
        }
        self.check_target(target).await?;

        let until_ms = self
            .clock
            .monotonic_millis()
            .saturating_add(duration_millis(duration));
        let session = self.state.start_learning(target, until_ms);
        tracing::info!(
            target_area_id = target,
            duration_secs = duration.as_secs(),
            "learning started"
        );
        Ok(session)
    }

    /// Re-apply the profile of the last known cell.
    ///
    /// Takes no ticket: a sighting still in flight is applied after this.
    pub async fn refresh(&self) -> Result<Resolution> {
        let permit = self.applier.reapply().await;
        let cell = self.state.current_cell();
        let resolution = {
            let conn = self.db.lock().await;
            resolver::resolve(&conn, cell, &self.labels)?
        };
        if let Some(area_id) = resolution.area_id {
            self.state.swap_current_area(area_id);
        }
        permit.apply(&resolution);
        Ok(resolution)
    }

    /// Delete an area, ending any learning session that targets it, then
    /// refresh. Returns the number of cells moved to the default area.
    pub async fn delete_area(&self, area_id: AreaId) -> Result<usize> {
        if area_id == DEFAULT_AREA_ID {
            return Err(EngineError::DefaultAreaProtected);
        }
        let moved = {
            let conn = self.db.lock().await;
            let moved = areas::delete(&conn, area_id)?;
            if self.state.end_learning_for(area_id) {
                tracing::info!(area_id, "learning session ended with its area");
            }
            moved
        };
        tracing::info!(area_id, cells_moved = moved, "area deleted");
        self.refresh().await?;
        Ok(moved)
    }

    /// Assign the most recent cell and every cell seen within `window` to
    /// `target`, then refresh. Returns the number of cells updated.
    pub async fn reassign_since(&self, target: AreaId, window: Duration) -> Result<usize> {
        self.check_target(target).await?;

        let window_ms = i64::try_from(duration_millis(window)).unwrap_or(i64::MAX);
        let since = self.clock.unix_millis().saturating_sub(window_ms);
        let changed = {
            let conn = self.db.lock().await;
            cells::reassign_since(&conn, target, since)?
        };
        tracing::info!(target_area_id = target, since, cells = changed, "cells reassigned");

        self.refresh().await?;
        Ok(changed)
    }

    /// Teach the engine an area.
    ///
    /// Forward: learn upcoming cells for the window and claim the current
    /// cell now. Backward: claim every cell seen during the window.
    pub async fn learn_area(&self, target: AreaId, window: LearnWindow) -> Result<LearnOutcome> {
        match window {
            LearnWindow::Forward { secs } => {
                let session = self.start_learning(target, Duration::from_secs(secs)).await?;
                let cells_reassigned = self.reassign_since(target, Duration::ZERO).await?;
                Ok(LearnOutcome {
                    session: Some(session),
                    cells_reassigned,
                })
            }
            LearnWindow::Backward { secs } => {
                let cells_reassigned = self.reassign_since(target, Duration::from_secs(secs)).await?;
                Ok(LearnOutcome {
                    session: None,
                    cells_reassigned,
                })
            }
        }
    }

    /// Snapshot of the resolution state and what the current cell resolves to.
    pub async fn status(&self) -> Result<EngineStatus> {
        let state = self.state.snapshot(self.clock.monotonic_millis());
        let resolution = {
            let conn = self.db.lock().await;
            resolver::resolve(&conn, state.current_cell_row_id, &self.labels)?
        };
        Ok(EngineStatus { state, resolution })
    }

    /// Drop a learning target whose area no longer exists.
    fn live_target(&self, conn: &Connection, target: Option<AreaId>) -> Result<Option<AreaId>> {
        match target {
            Some(area_id) if !areas::exists(conn, area_id)? => {
                self.state.end_learning_for(area_id);
                tracing::warn!(area_id, "learning target is gone, session ended");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn check_target(&self, target: AreaId) -> Result<()> {
        if target == DEFAULT_AREA_ID {
            return Err(EngineError::DefaultAreaProtected);
        }
        let conn = self.db.lock().await;
        if !areas::exists(&conn, target)? {
            return Err(EngineError::UnknownArea(target));
        }
        Ok(())
    }
}
