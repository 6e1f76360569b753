//! Continue/step handlers.
//! - handle_continue: resume without a step
//! - handle_next: step over within the current frame
//! - handle_step_in: stop at the next reported line

use serde_json::Value;

use crate::protocol::{ContinueResponseBody, Request, ThreadArguments};

use super::super::control::{ControllerState, ResumeAction};
use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::parse_arguments;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_continue(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let _args: ThreadArguments = parse_arguments(request)?;
        // Already running: nothing to resume.
        if self.controller.state() != ControllerState::Running {
            self.controller.resume(ResumeAction::Continue)?;
        }
        Ok(DispatchOutcome::with_body(ContinueResponseBody {
            all_threads_continued: Some(true),
        }))
    }

    pub(in crate::adapter) fn handle_next(&mut self, request: &Request<Value>) -> HandlerResult {
        let _args: ThreadArguments = parse_arguments(request)?;
        self.controller.resume(ResumeAction::Next)?;
        Ok(DispatchOutcome::empty())
    }

    pub(in crate::adapter) fn handle_step_in(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let _args: ThreadArguments = parse_arguments(request)?;
        self.controller.resume(ResumeAction::StepIn)?;
        Ok(DispatchOutcome::empty())
    }
}
