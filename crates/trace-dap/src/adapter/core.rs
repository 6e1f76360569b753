//! Adapter core loop + request dispatch.
//! - DebugAdapter::new/start/finish: session lifecycle
//! - run_setup/wait_for_resume/poll_while_running: the three read regimes
//! - dispatch_request/route: command table with fault capture
//! - envelope helpers: ok_response/error_response/event
//! - LineHook impl: per-line stop checks

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::error::HandlerError;
use crate::protocol::{
    Event, MessageType, ProtocolMessage, Request, Response, StoppedEventBody,
    TerminatedEventBody, ThreadEventBody,
};
use crate::trace::{FrameRef, LineHook, TraceFlow};

use super::control::{ControllerState, ExecutionController, StopReason};
use super::framer::{encode_message, MessageFramer};
use super::protocol_io::{ProtocolLog, INCOMING, OUTGOING};
use super::transport::{Poll, Transport};
use super::{DebugAdapter, DispatchOutcome, HandlerResult, THREAD_ID};

const READ_CHUNK: usize = 8 * 1024;

impl DispatchOutcome {
    pub(super) fn empty() -> Self {
        Self::default()
    }

    pub(super) fn with_body<T: Serialize>(body: T) -> Self {
        Self {
            body: serde_json::to_value(body).ok(),
            events: Vec::new(),
        }
    }
}

impl DebugAdapter {
    #[must_use]
    pub fn new(transport: impl Transport + 'static, config: AdapterConfig) -> Self {
        let protocol_log = config.protocol_log.as_deref().and_then(ProtocolLog::open);
        Self {
            transport: Box::new(transport),
            framer: MessageFramer::new(),
            inbox: VecDeque::new(),
            config,
            next_seq: 1,
            controller: ExecutionController::new(),
            launch: None,
            protocol_log,
            last_running_poll: Instant::now(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.controller.state() == ControllerState::Stopped
    }

    /// Normalized program path from the last `launch`, if any.
    #[must_use]
    pub fn launch_program(&self) -> Option<&str> {
        self.launch.as_ref().and_then(|launch| launch.program.as_deref())
    }

    /// Program arguments from the last `launch`.
    #[must_use]
    pub fn launch_args(&self) -> &[String] {
        self.launch
            .as_ref()
            .map(|launch| launch.args.as_slice())
            .unwrap_or_default()
    }

    /// Announce the thread and handle setup requests until
    /// `configurationDone`, a `disconnect`, or the client going away.
    pub fn start(&mut self) {
        let started = self.event(
            "thread",
            Some(ThreadEventBody {
                reason: "started".to_string(),
                thread_id: THREAD_ID,
            }),
        );
        self.send(&started);
        self.run_setup();
        match self.controller.state() {
            ControllerState::Running => info!("configuration done, debuggee may run"),
            state => info!(?state, "session ended during setup"),
        }
    }

    /// Called once the debuggee has finished. Tells a still-connected client
    /// the session is over.
    pub fn finish(&mut self) {
        if self.is_stopped() {
            return;
        }
        let terminated = self.event("terminated", Some(TerminatedEventBody { restart: None }));
        self.send(&terminated);
        self.controller.stop();
        info!("debuggee finished");
    }

    fn run_setup(&mut self) {
        while self.controller.state() == ControllerState::Idle {
            let Some(message) = self.next_message(true) else {
                break;
            };
            self.handle_message(message);
        }
    }

    /// Serve requests until a resume command or the end of the session.
    fn wait_for_resume(&mut self) {
        while self.controller.state() == ControllerState::Suspended {
            match self.next_message(false) {
                Some(message) => self.handle_message(message),
                None if self.controller.state() == ControllerState::Suspended => {
                    thread::sleep(self.config.poll_interval);
                }
                None => {}
            }
        }
    }

    /// Drain requests that arrived while the debuggee was running, at most
    /// once per `running_poll_interval`.
    fn poll_while_running(&mut self) {
        let Some(interval) = self.config.running_poll_interval else {
            return;
        };
        if self.last_running_poll.elapsed() < interval {
            return;
        }
        self.last_running_poll = Instant::now();
        while self.controller.state() == ControllerState::Running {
            let Some(message) = self.next_message(false) else {
                break;
            };
            self.handle_message(message);
        }
    }

    fn next_message(&mut self, blocking: bool) -> Option<ProtocolMessage> {
        loop {
            if let Some(message) = self.inbox.pop_front() {
                return Some(message);
            }
            if self.is_stopped() {
                return None;
            }
            let mut buf = [0u8; READ_CHUNK];
            let read = if blocking {
                self.transport.read(&mut buf).map(|n| match n {
                    0 => Poll::Closed,
                    n => Poll::Data(n),
                })
            } else {
                self.transport.poll_read(&mut buf)
            };
            match read {
                Ok(Poll::Data(n)) => self.ingest(&buf[..n]),
                Ok(Poll::Empty) => return None,
                Ok(Poll::Closed) => {
                    if self.framer.pending_len() > 0 {
                        warn!(
                            bytes = self.framer.pending_len(),
                            "connection closed inside a frame"
                        );
                    }
                    info!("client closed the connection");
                    self.controller.stop();
                    return None;
                }
                Err(err) => {
                    warn!(%err, "transport read failed");
                    self.controller.stop();
                    return None;
                }
            }
        }
    }

    fn ingest(&mut self, bytes: &[u8]) {
        for frame in self.framer.push(bytes) {
            match frame {
                Ok(frame) => {
                    self.record_payload(INCOMING, &frame.payload);
                    self.inbox.push_back(frame.message);
                }
                Err(err) => warn!(%err, "dropping malformed frame"),
            }
        }
    }

    fn handle_message(&mut self, message: ProtocolMessage) {
        match message {
            ProtocolMessage::Request(request) => {
                for outgoing in self.dispatch_request(request) {
                    self.send(&outgoing);
                }
            }
            ProtocolMessage::Response(response) => {
                debug!(command = %response.command, "ignoring client response");
            }
            ProtocolMessage::Event(event) => {
                debug!(event = %event.event, "ignoring client event");
            }
        }
    }

    /// Run one request through the command table. Returns the messages to
    /// write, in order: handler events first, then the response.
    pub(super) fn dispatch_request(&mut self, request: Request<Value>) -> Vec<Value> {
        if request.message_type != MessageType::Request {
            return Vec::new();
        }
        debug!(seq = request.seq, command = %request.command, "dispatch");

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.route(&request)))
            .unwrap_or_else(|payload| {
                Err(HandlerError::Internal {
                    command: request.command.clone(),
                    detail: panic_detail(payload.as_ref()),
                })
            });

        match result {
            Ok(outcome) => {
                let mut messages = outcome.events;
                messages.push(self.ok_response(&request, outcome.body));
                messages
            }
            Err(err) => {
                warn!(command = %request.command, %err, "request failed");
                vec![self.error_response(&request, &err.to_string())]
            }
        }
    }

    fn route(&mut self, request: &Request<Value>) -> HandlerResult {
        match request.command.as_str() {
            "initialize" => self.handle_initialize(request),
            "launch" => self.handle_launch(request),
            "attach" => self.handle_attach(request),
            "setBreakpoints" => self.handle_set_breakpoints(request),
            "configurationDone" => self.handle_configuration_done(request),
            "threads" => self.handle_threads(request),
            "stackTrace" => self.handle_stack_trace(request),
            "scopes" => self.handle_scopes(request),
            "variables" => self.handle_variables(request),
            "continue" => self.handle_continue(request),
            "next" => self.handle_next(request),
            "stepIn" => self.handle_step_in(request),
            "disconnect" => self.handle_disconnect(request),
            other => Err(HandlerError::UnsupportedCommand(other.to_string())),
        }
    }

    pub(super) fn emit_stopped(&mut self, reason: StopReason) {
        let stopped = self.event(
            "stopped",
            Some(StoppedEventBody {
                reason: reason.as_str().to_string(),
                thread_id: Some(THREAD_ID),
                all_threads_stopped: Some(true),
            }),
        );
        self.send(&stopped);
    }

    fn send(&mut self, message: &Value) {
        let payload = message.to_string();
        self.record_payload(OUTGOING, &payload);
        if let Err(err) = self.transport.write_all(&encode_message(&payload)) {
            warn!(%err, "transport write failed");
            self.controller.stop();
        }
    }

    /// Append to the transcript. The first failed write disables it.
    fn record_payload(&mut self, direction: &str, payload: &str) {
        let Some(log) = self.protocol_log.as_mut() else {
            return;
        };
        if let Err(err) = log.record(direction, payload) {
            warn!(%err, "protocol log write failed, transcript disabled");
            self.protocol_log = None;
        }
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        seq
    }

    pub(super) fn ok_response(&mut self, request: &Request<Value>, body: Option<Value>) -> Value {
        let response = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq: request.seq,
            success: true,
            command: request.command.clone(),
            message: None,
            body,
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    pub(super) fn error_response(&mut self, request: &Request<Value>, message: &str) -> Value {
        let response = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq: request.seq,
            success: false,
            command: request.command.clone(),
            message: Some(message.to_string()),
            body: Some(serde_json::json!({ "error": message })),
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    pub(super) fn event<T>(&mut self, name: &str, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let event = Event {
            seq: self.next_seq(),
            message_type: MessageType::Event,
            event: name.to_string(),
            body,
        };
        serde_json::to_value(event).unwrap_or(Value::Null)
    }

    fn flow(&self) -> TraceFlow {
        if self.is_stopped() {
            TraceFlow::Detach
        } else {
            TraceFlow::Continue
        }
    }
}

impl LineHook for DebugAdapter {
    fn on_line(&mut self, frame: &FrameRef) -> TraceFlow {
        match self.controller.state() {
            ControllerState::Stopped => return TraceFlow::Detach,
            ControllerState::Idle | ControllerState::Suspended => return TraceFlow::Continue,
            ControllerState::Running => {}
        }
        self.poll_while_running();
        let Some(reason) = self.controller.check_line(frame.as_ref()) else {
            return self.flow();
        };
        if self.controller.suspend(frame, reason) {
            info!(
                reason = reason.as_str(),
                path = frame.path(),
                line = frame.line(),
                "suspended"
            );
            self.emit_stopped(reason);
            self.wait_for_resume();
        }
        self.flow()
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
