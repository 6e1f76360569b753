//! Debug adapter module map.
//! - core: session loops, dispatch, envelopes, line hook
//! - framer: Content-Length framing
//! - transport: byte channel to the client
//! - protocol_io: wire transcript logging
//! - control: suspend/resume state machine
//! - breakpoints: line breakpoint table
//! - snapshot: frames captured at a suspension
//! - handlers: DAP request handlers by area
//! - variables: handle registry, listing, formatting
//! - util: small shared helpers
//! - tests: adapter unit tests

mod breakpoints;
mod control;
mod core;
mod framer;
mod handlers;
mod protocol_io;
mod snapshot;
mod transport;
mod util;
mod variables;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::time::Instant;

use serde_json::Value;

use crate::config::AdapterConfig;
use crate::error::HandlerError;
use crate::protocol::ProtocolMessage;

use self::control::ExecutionController;
use self::framer::MessageFramer;
use self::protocol_io::ProtocolLog;

pub use self::control::{ControllerState, StopReason};
pub use self::transport::{Poll, TcpTransport, Transport};

/// The single synthetic thread reported to the client.
const THREAD_ID: u32 = 1;

/// Program details recorded from `launch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LaunchTarget {
    program: Option<String>,
    args: Vec<String>,
}

/// Protocol session bound to one client connection.
///
/// The adapter is also the [`crate::trace::LineHook`] a trace provider
/// reports lines to, so message dispatch and line checks share one owner and
/// never run concurrently.
pub struct DebugAdapter {
    transport: Box<dyn Transport>,
    framer: MessageFramer,
    inbox: VecDeque<ProtocolMessage>,
    config: AdapterConfig,
    next_seq: u32,
    controller: ExecutionController,
    launch: Option<LaunchTarget>,
    protocol_log: Option<ProtocolLog>,
    last_running_poll: Instant,
}

/// What a handler produced: a response body plus events that must reach the
/// client before the response.
#[derive(Debug, Default)]
struct DispatchOutcome {
    body: Option<Value>,
    events: Vec<Value>,
}

type HandlerResult = Result<DispatchOutcome, HandlerError>;
