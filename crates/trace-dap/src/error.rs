//! Error types for framing, dispatch, and trace loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while decoding a `Content-Length` frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame header has no Content-Length")]
    MissingContentLength,
    #[error("invalid Content-Length value '{0}'")]
    InvalidContentLength(String),
    #[error("frame header exceeds {limit} bytes without terminator")]
    HeaderTooLarge { limit: usize },
    #[error("frame body is not valid utf-8")]
    InvalidUtf8,
    #[error("frame body is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unrecognised message type {0}")]
    UnknownMessageType(String),
}

/// Failures raised by a request handler. Converted into a failed response at
/// the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("invalid {command} arguments: {reason}")]
    InvalidArguments { command: String, reason: String },
    #[error("setBreakpoints requires source.path")]
    MissingSourcePath,
    #[error("debuggee is not suspended")]
    NotSuspended,
    #[error("unknown frame id {0}")]
    UnknownFrame(u32),
    #[error("unsupported command '{0}'")]
    UnsupportedCommand(String),
    #[error("internal error while handling '{command}': {detail}")]
    Internal { command: String, detail: String },
}

/// Failures while loading a recorded execution trace.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed trace: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trace step {step} has an empty stack")]
    EmptyStack { step: usize },
    #[error("trace step {step} repeats frame key {key}")]
    DuplicateFrame { step: usize, key: u64 },
}

/// Fatal session-level failures.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A value that cannot produce a display string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value of type '{type_name}' has no display form")]
pub struct RenderError {
    pub type_name: String,
}
