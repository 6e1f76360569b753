//! Execution control state machine.
//! - check_line: decide whether a reported line suspends
//! - suspend/resume/stop: state transitions
//! - scopes_for_frame: memoized scope handles per suspension

use tracing::debug;

use crate::error::HandlerError;
use crate::trace::{FrameKey, FrameRef, TraceFrame};

use super::breakpoints::BreakpointTable;
use super::snapshot::{ScopeRefs, Suspension};
use super::variables::{VariableHandle, VariableHandles};

/// Debugger execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Session not configured yet; lines are not checked.
    Idle,
    /// Debuggee runs; each reported line is checked.
    Running,
    /// Debuggee is held until a resume command arrives.
    Suspended,
    /// Session is over.
    Stopped,
}

/// Why the debuggee was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint,
    Step,
}

impl StopReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakpoint => "breakpoint",
            Self::Step => "step",
        }
    }
}

/// Step armed by a resume command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingStep {
    /// Stop at the next line reported by this frame.
    Over(FrameKey),
    /// Stop at the next reported line, whatever the frame.
    Into,
}

/// Resume commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResumeAction {
    Continue,
    Next,
    StepIn,
}

#[derive(Debug)]
pub(crate) struct ExecutionController {
    pub(super) state: ControllerState,
    pub(super) pending_step: Option<PendingStep>,
    pub(super) breakpoints: BreakpointTable,
    pub(super) handles: VariableHandles,
    pub(super) suspension: Option<Suspension>,
}

impl ExecutionController {
    pub(crate) fn new() -> Self {
        Self {
            state: ControllerState::Idle,
            pending_step: None,
            breakpoints: BreakpointTable::default(),
            handles: VariableHandles::default(),
            suspension: None,
        }
    }

    pub(crate) fn state(&self) -> ControllerState {
        self.state
    }

    pub(crate) fn suspension(&self) -> Option<&Suspension> {
        self.suspension.as_ref()
    }

    pub(crate) fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    pub(crate) fn breakpoints_mut(&mut self) -> &mut BreakpointTable {
        &mut self.breakpoints
    }

    /// Start checking lines. Only leaves `Idle`.
    pub(crate) fn arm(&mut self) {
        if self.state == ControllerState::Idle {
            self.state = ControllerState::Running;
        }
    }

    /// Terminal transition; nothing afterwards is checked or resolved.
    pub(crate) fn stop(&mut self) {
        self.state = ControllerState::Stopped;
        self.pending_step = None;
        self.suspension = None;
        self.handles.retire_all();
    }

    /// Breakpoints win over a pending step on the same line. A step that
    /// fires is consumed by the suspension that follows.
    pub(crate) fn check_line(&mut self, frame: &dyn TraceFrame) -> Option<StopReason> {
        if self.state != ControllerState::Running {
            return None;
        }
        if self.breakpoints.should_break(frame.path(), frame.line()) {
            return Some(StopReason::Breakpoint);
        }
        match self.pending_step {
            Some(PendingStep::Into) => Some(StopReason::Step),
            Some(PendingStep::Over(key)) if key == frame.key() => Some(StopReason::Step),
            _ => None,
        }
    }

    /// Capture a snapshot and enter `Suspended`. Returns false when no
    /// suspension happened, e.g. one is already in effect.
    pub(crate) fn suspend(&mut self, frame: &FrameRef, reason: StopReason) -> bool {
        if self.state != ControllerState::Running {
            return false;
        }
        self.pending_step = None;
        self.suspension = Some(Suspension::capture(frame, reason));
        self.state = ControllerState::Suspended;
        true
    }

    pub(crate) fn resume(&mut self, action: ResumeAction) -> Result<(), HandlerError> {
        if self.state != ControllerState::Suspended {
            return Err(HandlerError::NotSuspended);
        }
        let step = match action {
            ResumeAction::Continue => None,
            ResumeAction::Next => self
                .suspension
                .as_ref()
                .and_then(Suspension::innermost)
                .map(|frame| PendingStep::Over(frame.frame.key())),
            ResumeAction::StepIn => Some(PendingStep::Into),
        };
        debug!(?action, retired = self.handles.live(), "resume");
        self.pending_step = step;
        self.suspension = None;
        self.handles.retire_all();
        self.state = ControllerState::Running;
        Ok(())
    }

    /// Scope handles for a frame of the current suspension, allocated on
    /// first request and reused until the suspension ends.
    pub(crate) fn scopes_for_frame(&mut self, frame_id: u32) -> Result<ScopeRefs, HandlerError> {
        let Some(suspension) = self.suspension.as_mut() else {
            return Err(HandlerError::NotSuspended);
        };
        if suspension.frame(frame_id).is_none() {
            return Err(HandlerError::UnknownFrame(frame_id));
        }
        if let Some(refs) = suspension.scopes.get(&frame_id) {
            return Ok(*refs);
        }
        let refs = ScopeRefs {
            locals: self.handles.alloc(VariableHandle::Locals(frame_id)),
            globals: self.handles.alloc(VariableHandle::Globals(frame_id)),
        };
        suspension.scopes.insert(frame_id, refs);
        Ok(refs)
    }
}
