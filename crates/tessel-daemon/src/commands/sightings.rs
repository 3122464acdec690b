//! Network observer command handlers.

use std::sync::Arc;

use serde_json::Value;

use tessel_types::cell::{RawCellLocation, NO_SIGNAL};

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Report the cell the radio is camped on.
///
/// Params: `cid` and/or `base_station_id` (missing fields mean no signal),
/// optional `wait` to block until the sighting has been processed.
pub async fn report_cell_location(state: &Arc<DaemonState>, params: &Value) -> Result {
    let field = |name: &str| -> std::result::Result<i64, RpcError> {
        match params.get(name) {
            None | Some(Value::Null) => Ok(NO_SIGNAL),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| RpcError::invalid_params(&format!("{name} must be an integer"))),
        }
    };
    let raw = RawCellLocation {
        cid: field("cid")?,
        base_station_id: field("base_station_id")?,
    };
    let wait = params.get("wait").and_then(Value::as_bool).unwrap_or(false);

    if wait {
        let outcome = state.dispatcher.dispatch_and_wait(&raw).await?;
        return match outcome {
            Some(outcome) => Ok(serde_json::json!({"accepted": true, "outcome": outcome})),
            None => Ok(serde_json::json!({"accepted": false, "reason": "no_signal"})),
        };
    }

    match state.dispatcher.dispatch(&raw).await? {
        Some(ticket) => Ok(serde_json::json!({"accepted": true, "ticket": ticket})),
        None => Ok(serde_json::json!({"accepted": false, "reason": "no_signal"})),
    }
}
