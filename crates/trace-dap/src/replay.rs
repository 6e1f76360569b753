//! Recorded execution traces.
//!
//! A trace file lists, for every executed line, the call stack at that moment
//! (innermost frame first). Replaying it drives a [`LineHook`] exactly as a
//! live runtime would, which is enough to debug a program after the fact or
//! to exercise the adapter without a language runtime.
//!
//! ```json
//! {
//!   "globals": { "LIMIT": 5 },
//!   "steps": [
//!     { "stack": [ { "key": 1, "name": "main", "path": "/w/app.src", "line": 3,
//!                    "locals": { "x": 10 } } ] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value as Json};
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::trace::{FrameKey, FrameRef, LineHook, TraceFlow, TraceFrame, TraceProvider};
use crate::value::{Bindings, Value};

#[derive(Debug, Deserialize)]
struct TraceFile {
    #[serde(default)]
    globals: Map<String, Json>,
    steps: Vec<TraceStep>,
}

#[derive(Debug, Deserialize)]
struct TraceStep {
    stack: Vec<FrameRecord>,
    #[serde(default)]
    globals: Option<Map<String, Json>>,
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    key: FrameKey,
    name: String,
    path: String,
    line: u32,
    #[serde(default = "first_column")]
    column: u32,
    #[serde(default)]
    locals: Map<String, Json>,
}

fn first_column() -> u32 {
    1
}

#[derive(Debug, Clone)]
struct FrameState {
    key: FrameKey,
    name: String,
    path: String,
    line: u32,
    column: u32,
    locals: Bindings,
}

#[derive(Debug)]
struct ReplayStep {
    /// Innermost first.
    stack: Vec<FrameState>,
    globals: Arc<Bindings>,
}

/// Frame handed to the hook during replay.
#[derive(Debug)]
pub struct ReplayFrame {
    state: FrameState,
    globals: Arc<Bindings>,
    caller: Option<FrameRef>,
}

impl TraceFrame for ReplayFrame {
    fn key(&self) -> FrameKey {
        self.state.key
    }

    fn name(&self) -> &str {
        &self.state.name
    }

    fn path(&self) -> &str {
        &self.state.path
    }

    fn line(&self) -> u32 {
        self.state.line
    }

    fn column(&self) -> u32 {
        self.state.column
    }

    fn locals(&self) -> Bindings {
        self.state.locals.clone()
    }

    fn globals(&self) -> Bindings {
        Bindings::clone(&self.globals)
    }

    fn caller(&self) -> Option<FrameRef> {
        self.caller.clone()
    }
}

/// Trace provider that replays a recorded trace file.
#[derive(Debug)]
pub struct ReplayProvider {
    steps: Vec<ReplayStep>,
}

impl ReplayProvider {
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let provider = Self::from_json_str(&text)?;
        info!(path = %path.display(), steps = provider.len(), "loaded trace");
        Ok(provider)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ReplayError> {
        let file: TraceFile = serde_json::from_str(text)?;
        let shared_globals = Arc::new(to_bindings(&file.globals));
        let mut steps = Vec::with_capacity(file.steps.len());
        for (index, step) in file.steps.into_iter().enumerate() {
            if step.stack.is_empty() {
                return Err(ReplayError::EmptyStack { step: index });
            }
            let mut seen = HashSet::new();
            for record in &step.stack {
                if !seen.insert(record.key) {
                    return Err(ReplayError::DuplicateFrame {
                        step: index,
                        key: record.key,
                    });
                }
            }
            let globals = match &step.globals {
                Some(globals) => Arc::new(to_bindings(globals)),
                None => Arc::clone(&shared_globals),
            };
            let stack = step
                .stack
                .into_iter()
                .map(|record| FrameState {
                    key: record.key,
                    name: record.name,
                    path: record.path,
                    line: record.line,
                    column: record.column,
                    locals: to_bindings(&record.locals),
                })
                .collect();
            steps.push(ReplayStep { stack, globals });
        }
        Ok(Self { steps })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl ReplayStep {
    /// Link the recorded frames into a caller chain and return the innermost.
    fn materialize(&self) -> Option<FrameRef> {
        let mut caller: Option<FrameRef> = None;
        for state in self.stack.iter().rev() {
            let frame: FrameRef = Arc::new(ReplayFrame {
                state: state.clone(),
                globals: Arc::clone(&self.globals),
                caller,
            });
            caller = Some(frame);
        }
        caller
    }
}

impl TraceProvider for ReplayProvider {
    fn run(&mut self, hook: &mut dyn LineHook) {
        for (index, step) in self.steps.iter().enumerate() {
            let Some(frame) = step.materialize() else {
                continue;
            };
            if hook.on_line(&frame) == TraceFlow::Detach {
                debug!(step = index, "hook detached, replay stopped");
                return;
            }
        }
        debug!("replay reached end of trace");
    }
}

fn to_bindings(map: &Map<String, Json>) -> Bindings {
    map.iter()
        .map(|(name, value)| (SmolStr::new(name), Value::from_json(value)))
        .collect()
}
