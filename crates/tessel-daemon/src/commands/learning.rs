//! Engine command handlers: learning, reassignment, refresh and status.

use std::sync::Arc;

use serde_json::Value;

use tessel_engine::engine::CommandOutcome;
use tessel_types::command::{Command, LearnWindow};

use super::{required_i64, to_json};
use crate::events::{Event, CELLS_REASSIGNED, LEARNING_STARTED};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn required_secs(params: &Value, name: &str) -> std::result::Result<u64, RpcError> {
    params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} must be a non-negative integer")))
}

/// Start a learning session.
pub async fn start_learning(state: &Arc<DaemonState>, params: &Value) -> Result {
    let command = Command::StartLearning {
        target_area_id: required_i64(params, "target_area_id")?,
        duration_secs: required_secs(params, "duration_secs")?,
    };
    let outcome = state.engine.handle_command(command).await?;
    if let CommandOutcome::LearningStarted(session) = &outcome {
        state
            .event_bus
            .emit(Event::now(LEARNING_STARTED, to_json(session)?));
    }
    to_json(&outcome)
}

/// Learn an area: positive `secs` looks forward, negative looks back.
pub async fn learn_area(state: &Arc<DaemonState>, params: &Value) -> Result {
    let target = required_i64(params, "target_area_id")?;
    let window = LearnWindow::from_signed_secs(required_i64(params, "secs")?);

    let outcome = state.engine.learn_area(target, window).await?;
    if let Some(session) = &outcome.session {
        state
            .event_bus
            .emit(Event::now(LEARNING_STARTED, to_json(session)?));
    }
    state.event_bus.emit(Event::now(
        CELLS_REASSIGNED,
        serde_json::json!({"target_area_id": target, "cells": outcome.cells_reassigned}),
    ));
    to_json(&outcome)
}

/// Assign everything seen in the last `window_secs` to an area.
pub async fn reassign_historical(state: &Arc<DaemonState>, params: &Value) -> Result {
    let command = Command::ReassignHistorical {
        target_area_id: required_i64(params, "target_area_id")?,
        window_secs: required_secs(params, "window_secs")?,
    };
    let outcome = state.engine.handle_command(command).await?;
    if let CommandOutcome::Reassigned {
        target_area_id,
        cells,
    } = &outcome
    {
        state.event_bus.emit(Event::now(
            CELLS_REASSIGNED,
            serde_json::json!({"target_area_id": target_area_id, "cells": cells}),
        ));
    }
    to_json(&outcome)
}

/// Re-apply the current profile.
pub async fn refresh(state: &Arc<DaemonState>) -> Result {
    let outcome = state.engine.handle_command(Command::Refresh).await?;
    to_json(&outcome)
}

/// Current area, cell, learning session and status line.
pub async fn get_status(state: &Arc<DaemonState>) -> Result {
    let status = state.engine.status().await?;
    Ok(serde_json::json!({
        "engine": to_json(&status)?,
        "display": to_json(&state.indicator.current())?,
    }))
}
