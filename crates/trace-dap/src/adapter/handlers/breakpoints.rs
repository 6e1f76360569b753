//! Breakpoint requests.
//! - handle_set_breakpoints: replace the breakpoints of one source

use serde_json::Value;
use tracing::debug;

use crate::error::HandlerError;
use crate::protocol::{
    Breakpoint, Request, SetBreakpointsArguments, SetBreakpointsResponseBody, Source,
};

use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::parse_arguments;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_set_breakpoints(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let args: SetBreakpointsArguments = parse_arguments(request)?;
        let Some(path) = args.source.path.clone().filter(|path| !path.is_empty()) else {
            return Err(HandlerError::MissingSourcePath);
        };
        let lines: Vec<u32> = match (&args.breakpoints, &args.lines) {
            (Some(breakpoints), _) => breakpoints.iter().map(|bp| bp.line).collect(),
            (None, Some(lines)) => lines.clone(),
            (None, None) => Vec::new(),
        };

        let entries = self.controller.breakpoints_mut().set_breakpoints(&path, &lines);
        debug!(
            path = %path,
            lines = ?self.controller.breakpoints().lines_for(&path),
            "breakpoints replaced"
        );

        let source = Source {
            path: Some(path),
            ..args.source
        };
        let breakpoints = entries
            .into_iter()
            .map(|entry| Breakpoint::verified(entry.id, entry.line, Some(source.clone())))
            .collect();
        Ok(DispatchOutcome::with_body(SetBreakpointsResponseBody {
            breakpoints,
        }))
    }
}
