//! Area management command handlers.
//!
//! Every successful mutation re-applies the current profile, since the
//! current cell's area or its binding may have changed.

use std::sync::Arc;

use serde_json::Value;

use tessel_db::queries::areas;
use tessel_types::DEFAULT_AREA_ID;

use super::{required_bool, required_i64, required_name, to_json};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// List areas with the name of their profile.
pub async fn list_areas(state: &Arc<DaemonState>) -> Result {
    let db = state.db.lock().await;
    let summaries = areas::list_summaries(&db, &state.config.labels.no_profile)?;
    to_json(&summaries)
}

/// Get one area.
pub async fn get_area(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "area_id")?;
    let db = state.db.lock().await;
    to_json(&areas::get(&db, id)?)
}

/// Create an area with no profile.
pub async fn create_area(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name = required_name(params, "name")?;
    let id = {
        let db = state.db.lock().await;
        areas::insert(&db, name)?
    };
    tracing::info!(area_id = id, name, "area created");
    Ok(serde_json::json!({"area_id": id}))
}

/// Rename an area. The default area keeps its name.
pub async fn rename_area(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "area_id")?;
    let name = required_name(params, "name")?;
    {
        let db = state.db.lock().await;
        areas::rename(&db, id, name)?;
    }
    state.engine.refresh().await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Bind a profile to an area, or unbind with a null `profile_id`.
pub async fn set_area_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "area_id")?;
    let profile_id = match params.get("profile_id") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_i64()
                .ok_or_else(|| RpcError::invalid_params("profile_id must be an integer"))?,
        ),
    };
    {
        let db = state.db.lock().await;
        areas::set_profile(&db, id, profile_id)?;
    }
    state.engine.refresh().await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Store the wifi and bluetooth preferences of an area.
pub async fn set_area_radios(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "area_id")?;
    let wifi = required_bool(params, "wifi_enabled")?;
    let bluetooth = required_bool(params, "bluetooth_enabled")?;
    {
        let db = state.db.lock().await;
        areas::set_radios(&db, id, wifi, bluetooth)?;
    }
    state.engine.refresh().await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Delete an area; its cells fall back to the default area.
pub async fn delete_area(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "area_id")?;
    if id == DEFAULT_AREA_ID {
        return Ok(serde_json::json!({"deleted": false, "cells_moved": 0}));
    }
    let moved = state.engine.delete_area(id).await?;
    Ok(serde_json::json!({"deleted": true, "cells_moved": moved}))
}
