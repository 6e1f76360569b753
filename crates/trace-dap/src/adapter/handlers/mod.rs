//! Request handlers grouped by DAP area.
//! - initialize: capabilities + initialized event
//! - lifecycle: launch/attach/configurationDone/disconnect
//! - breakpoints: setBreakpoints
//! - threads: the synthetic thread
//! - stack_trace: frames of the current suspension
//! - scopes: per-frame scope handles
//! - run_control: continue/next/stepIn
//!
//! `variables` lives with the rest of the variable code.

mod breakpoints;
mod initialize;
mod lifecycle;
mod run_control;
mod scopes;
mod stack_trace;
mod threads;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HandlerError;
use crate::protocol::Request;

/// Decode a request's arguments. Absent or `null` arguments decode like an
/// empty object so all-optional argument structs still succeed.
pub(in crate::adapter) fn parse_arguments<T: DeserializeOwned>(
    request: &Request<Value>,
) -> Result<T, HandlerError> {
    let arguments = match request.arguments.clone() {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(arguments).map_err(|err| HandlerError::InvalidArguments {
        command: request.command.clone(),
        reason: err.to_string(),
    })
}
