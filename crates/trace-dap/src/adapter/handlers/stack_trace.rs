//! Stack trace request handling.
//! - handle_stack_trace: frames of the current suspension with client slicing

use serde_json::Value;
use tracing::debug;

use crate::protocol::{Request, Source, StackFrame, StackTraceArguments, StackTraceResponseBody};

use super::super::util::source_name;
use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::parse_arguments;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_stack_trace(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let args: StackTraceArguments = parse_arguments(request)?;
        let Some(suspension) = self.controller.suspension() else {
            return Ok(DispatchOutcome::with_body(StackTraceResponseBody {
                stack_frames: Vec::new(),
                total_frames: 0,
            }));
        };

        let total_frames = u32::try_from(suspension.frames.len()).unwrap_or(u32::MAX);
        debug!(reason = suspension.reason.as_str(), total_frames, "stack trace");
        let start = usize::try_from(args.start_frame.unwrap_or(0)).unwrap_or(usize::MAX);
        let levels = match args.levels {
            Some(0) | None => usize::MAX,
            Some(levels) => usize::try_from(levels).unwrap_or(usize::MAX),
        };
        let stack_frames = suspension
            .frames
            .iter()
            .skip(start)
            .take(levels)
            .map(|frame| StackFrame {
                id: frame.id,
                name: frame.name.clone(),
                source: Some(Source {
                    name: Some(source_name(&frame.path)),
                    path: Some(frame.path.clone()),
                    source_reference: None,
                }),
                line: frame.line,
                column: frame.column,
            })
            .collect();

        Ok(DispatchOutcome::with_body(StackTraceResponseBody {
            stack_frames,
            total_frames,
        }))
    }
}
