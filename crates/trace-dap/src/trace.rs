//! Execution trace seam between a debuggee runtime and the adapter.

use std::fmt;
use std::sync::Arc;

use crate::value::Bindings;

/// Identity of a live activation record. Two reports with the same key come
/// from the same frame.
pub type FrameKey = u64;

/// Shared handle to a live frame owned by the trace provider.
pub type FrameRef = Arc<dyn TraceFrame>;

/// Read-only view of one activation record in the debuggee.
pub trait TraceFrame: fmt::Debug {
    fn key(&self) -> FrameKey;
    fn name(&self) -> &str;
    /// Absolute source path as reported by the runtime.
    fn path(&self) -> &str;
    /// 1-based line currently executing in this frame.
    fn line(&self) -> u32;
    fn column(&self) -> u32 {
        1
    }
    fn locals(&self) -> Bindings;
    fn globals(&self) -> Bindings;
    fn caller(&self) -> Option<FrameRef>;
}

/// What the provider should do after a line callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFlow {
    /// Keep reporting lines.
    Continue,
    /// The session is over; stop reporting lines.
    Detach,
}

/// Line-level instrumentation hook.
pub trait LineHook {
    /// Called before `frame` executes its current line. The debuggee must not
    /// make progress until this returns.
    fn on_line(&mut self, frame: &FrameRef) -> TraceFlow;
}

/// Drives a debuggee and reports each executed line to a hook.
pub trait TraceProvider {
    fn run(&mut self, hook: &mut dyn LineHook);
}
