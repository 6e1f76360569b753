//! Session lifecycle handlers.
//! - handle_launch: record the program being debugged
//! - handle_attach: acknowledge
//! - handle_configuration_done: end of setup, arm line checks
//! - handle_disconnect: end the session

use serde_json::Value;
use tracing::info;

use crate::protocol::{AttachArguments, DisconnectArguments, LaunchArguments, Request};

use super::super::util::normalize_path;
use super::super::{DebugAdapter, DispatchOutcome, HandlerResult, LaunchTarget};
use super::parse_arguments;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_launch(&mut self, request: &Request<Value>) -> HandlerResult {
        let args: LaunchArguments = parse_arguments(request)?;
        let program = args.program.as_deref().map(normalize_path);
        info!(
            program = program.as_deref().unwrap_or("<none>"),
            args = ?args.args,
            "launch"
        );
        self.launch = Some(LaunchTarget {
            program,
            args: args.args,
        });
        Ok(DispatchOutcome::empty())
    }

    pub(in crate::adapter) fn handle_attach(&mut self, request: &Request<Value>) -> HandlerResult {
        let args: AttachArguments = parse_arguments(request)?;
        info!(keys = ?args.additional.keys().collect::<Vec<_>>(), "attach");
        Ok(DispatchOutcome::empty())
    }

    pub(in crate::adapter) fn handle_configuration_done(
        &mut self,
        _request: &Request<Value>,
    ) -> HandlerResult {
        self.controller.arm();
        Ok(DispatchOutcome::empty())
    }

    pub(in crate::adapter) fn handle_disconnect(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let args: DisconnectArguments = parse_arguments(request).unwrap_or_default();
        info!(
            terminate_debuggee = args.terminate_debuggee.unwrap_or(false),
            "disconnect"
        );
        self.controller.stop();
        Ok(DispatchOutcome::empty())
    }
}
