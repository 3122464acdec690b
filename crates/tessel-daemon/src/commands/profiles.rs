//! Profile management command handlers.

use std::sync::Arc;

use serde_json::Value;

use tessel_db::queries::profiles;
use tessel_types::profile::{ProfileSettings, Volume};

use super::{required_i64, required_name, to_json};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// List all profiles.
pub async fn list_profiles(state: &Arc<DaemonState>) -> Result {
    let db = state.db.lock().await;
    to_json(&profiles::list(&db)?)
}

/// Get one profile.
pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "profile_id")?;
    let db = state.db.lock().await;
    to_json(&profiles::get(&db, id)?)
}

/// Create a profile that changes nothing until edited.
pub async fn create_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name = required_name(params, "name")?;
    let id = {
        let db = state.db.lock().await;
        profiles::insert(&db, name, &ProfileSettings::untouched())?
    };
    tracing::info!(profile_id = id, name, "profile created");
    Ok(serde_json::json!({"profile_id": id}))
}

/// Rename a profile.
pub async fn rename_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "profile_id")?;
    let name = required_name(params, "name")?;
    {
        let db = state.db.lock().await;
        profiles::rename(&db, id, name)?;
    }
    state.engine.refresh().await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Replace the settings of a profile.
pub async fn update_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "profile_id")?;
    let settings = params
        .get("settings")
        .cloned()
        .ok_or_else(|| RpcError::invalid_params("settings required"))?;
    let settings: ProfileSettings = serde_json::from_value(settings)
        .map_err(|e| RpcError::invalid_params(&format!("settings: {e}")))?;
    validate_volumes(&settings)?;

    {
        let db = state.db.lock().await;
        profiles::update_settings(&db, id, &settings)?;
    }
    state.engine.refresh().await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Delete a profile; areas bound to it are left without one.
pub async fn delete_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_i64(params, "profile_id")?;
    {
        let db = state.db.lock().await;
        profiles::delete(&db, id)?;
    }
    tracing::info!(profile_id = id, "profile deleted");
    state.engine.refresh().await?;
    Ok(serde_json::json!({"deleted": true}))
}

fn validate_volumes(settings: &ProfileSettings) -> std::result::Result<(), RpcError> {
    for (channel, volume) in settings.volumes() {
        let apply = matches!(volume, Volume::Applied(_));
        Volume::new(volume.level(), apply)
            .map_err(|e| RpcError::invalid_params(&format!("{channel:?} volume: {e}")))?;
    }
    Ok(())
}
