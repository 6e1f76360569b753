//! Scope enumeration handler.
//! - handle_scopes: Locals/Globals for one snapshot frame

use serde_json::Value;

use crate::protocol::{Request, Scope, ScopesArguments, ScopesResponseBody};

use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::parse_arguments;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_scopes(&mut self, request: &Request<Value>) -> HandlerResult {
        let args: ScopesArguments = parse_arguments(request)?;
        let refs = self.controller.scopes_for_frame(args.frame_id)?;
        let scopes = vec![
            Scope {
                name: "Locals".to_string(),
                presentation_hint: Some("locals".to_string()),
                variables_reference: refs.locals,
                expensive: false,
            },
            Scope {
                name: "Globals".to_string(),
                presentation_hint: Some("globals".to_string()),
                variables_reference: refs.globals,
                expensive: true,
            },
        ];
        Ok(DispatchOutcome::with_body(ScopesResponseBody { scopes }))
    }
}
