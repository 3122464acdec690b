//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category.

pub mod areas;
pub mod diagnostics;
pub mod learning;
pub mod profiles;
pub mod sightings;

use serde_json::Value;

use crate::rpc::RpcError;

fn required_i64(params: &Value, name: &str) -> Result<i64, RpcError> {
    params
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

fn required_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

fn required_bool(params: &Value, name: &str) -> Result<bool, RpcError> {
    params
        .get(name)
        .and_then(Value::as_bool)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// A non-empty, trimmed name.
fn required_name<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    let value = required_str(params, name)?.trim();
    if value.is_empty() {
        return Err(RpcError::invalid_params(&format!("{name} must not be empty")));
    }
    Ok(value)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode: {e}")))
}
