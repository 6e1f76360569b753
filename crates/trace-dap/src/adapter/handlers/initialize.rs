//! Initialize request.
//! - handle_initialize: advertise capabilities, queue `initialized`

use serde_json::Value;
use tracing::info;

use crate::protocol::{Capabilities, InitializeArguments, Request};

use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::parse_arguments;

fn capabilities() -> Capabilities {
    Capabilities {
        supports_configuration_done_request: true,
        support_terminate_debuggee: true,
        ..Capabilities::default()
    }
}

impl DebugAdapter {
    pub(in crate::adapter) fn handle_initialize(
        &mut self,
        request: &Request<Value>,
    ) -> HandlerResult {
        let args: InitializeArguments = parse_arguments(request)?;
        info!(
            client = args.client_id.as_deref().unwrap_or("<unknown>"),
            adapter = args.adapter_id.as_deref().unwrap_or("<unknown>"),
            "initialize"
        );
        let initialized = self.event::<Value>("initialized", None);
        let mut outcome = DispatchOutcome::with_body(capabilities());
        outcome.events.push(initialized);
        Ok(outcome)
    }
}
