//! Debug Adapter Protocol server driven by a line-level execution trace.

mod adapter;
mod config;
mod error;
mod protocol;
mod replay;
mod server;
mod trace;
mod value;

pub use adapter::{ControllerState, DebugAdapter, Poll, StopReason, TcpTransport, Transport};
pub use config::{AdapterConfig, PROTOCOL_LOG_ENV};
pub use error::{AdapterError, FrameError, HandlerError, RenderError, ReplayError};
pub use protocol::{
    AttachArguments, Breakpoint, Capabilities, ContinueResponseBody, DisconnectArguments, Event,
    InitializeArguments, LaunchArguments, MessageType, ProtocolMessage, Request, Response, Scope,
    ScopesArguments, ScopesResponseBody, SetBreakpointsArguments, SetBreakpointsResponseBody,
    Source, SourceBreakpoint, StackFrame, StackTraceArguments, StackTraceResponseBody,
    StoppedEventBody, TerminatedEventBody, Thread, ThreadArguments, ThreadEventBody,
    ThreadsResponseBody, Variable, VariablesArguments, VariablesResponseBody,
};
pub use replay::{ReplayFrame, ReplayProvider};
pub use server::{run_session, serve};
pub use trace::{FrameKey, FrameRef, LineHook, TraceFlow, TraceFrame, TraceProvider};
pub use value::{Bindings, Value};
