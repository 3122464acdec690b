//! Diagnostics command handlers.

use std::sync::Arc;

use serde_json::Value;

use tessel_db::queries::cell_log;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Version, configuration and storage counters.
pub async fn get_daemon_info(state: &Arc<DaemonState>) -> Result {
    let (sightings, latest) = {
        let db = state.db.lock().await;
        (cell_log::count(&db)?, cell_log::latest(&db)?)
    };

    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": tessel_db::SCHEMA_VERSION,
        "started_at": state.started_at,
        "network_type": state.config.radio.network_type,
        "workers": state.config.engine.workers,
        "sightings_logged": sightings,
        "last_sighting": latest,
        "events_emitted": state.event_bus.sequence(),
    }))
}

/// Ask the daemon to stop after draining queued sightings.
pub async fn shutdown(state: &Arc<DaemonState>) -> Result {
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"shutting_down": true}))
}
