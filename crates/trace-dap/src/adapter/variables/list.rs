//! Variables request + child enumeration.
//! - handle_variables: resolve variables for a reference
//! - list_variables: expand a registry entry into DAP variables
//! - variable_from_value: format a value, allocating a child reference lazily

use tracing::debug;

use crate::protocol::{Request, Variable, VariablesArguments, VariablesResponseBody};
use crate::trace::FrameRef;
use crate::value::{Bindings, Value};

use super::super::control::ExecutionController;
use super::super::handlers::parse_arguments;
use super::super::{DebugAdapter, DispatchOutcome, HandlerResult};
use super::format::format_value;
use super::handles::VariableHandle;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_variables(
        &mut self,
        request: &Request<serde_json::Value>,
    ) -> HandlerResult {
        let args: VariablesArguments = parse_arguments(request)?;
        let variables = self
            .controller
            .list_variables(args.variables_reference, self.config.max_value_len);
        Ok(DispatchOutcome::with_body(VariablesResponseBody { variables }))
    }
}

impl ExecutionController {
    pub(in crate::adapter) fn list_variables(
        &mut self,
        reference: u64,
        max_len: usize,
    ) -> Vec<Variable> {
        if reference == 0 {
            return Vec::new();
        }
        let Some(handle) = self.handles.get(reference).cloned() else {
            debug!(reference, "unknown or retired variables reference");
            return Vec::new();
        };
        let entries = match handle {
            VariableHandle::Locals(frame_id) => self
                .snapshot_frame(frame_id)
                .map(|frame| binding_entries(frame.locals()))
                .unwrap_or_default(),
            VariableHandle::Globals(frame_id) => self
                .snapshot_frame(frame_id)
                .map(|frame| {
                    let locals = frame.locals();
                    let mut globals = frame.globals();
                    globals.retain(|name, _| !locals.contains_key(name));
                    binding_entries(globals)
                })
                .unwrap_or_default(),
            VariableHandle::Value(value) => value.children(),
        };
        entries
            .into_iter()
            .map(|(name, value)| self.variable_from_value(name, value, max_len))
            .collect()
    }

    fn snapshot_frame(&self, frame_id: u32) -> Option<FrameRef> {
        self.suspension
            .as_ref()
            .and_then(|suspension| suspension.frame(frame_id))
            .map(|frame| FrameRef::clone(&frame.frame))
    }

    fn variable_from_value(&mut self, name: String, value: Value, max_len: usize) -> Variable {
        let display = format_value(&value, max_len);
        let r#type = Some(value.type_name().to_string());
        let variables_reference = if value.has_children() {
            self.handles.alloc(VariableHandle::Value(value))
        } else {
            0
        };
        Variable {
            name,
            value: display,
            r#type,
            variables_reference,
        }
    }
}

fn binding_entries(bindings: Bindings) -> Vec<(String, Value)> {
    bindings
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
