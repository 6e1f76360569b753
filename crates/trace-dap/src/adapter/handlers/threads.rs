//! Thread requests.
//! - handle_threads: the single debuggee thread

use serde_json::Value;

use crate::protocol::{Request, Thread, ThreadsResponseBody};

use super::super::{DebugAdapter, DispatchOutcome, HandlerResult, THREAD_ID};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_threads(&mut self, _request: &Request<Value>) -> HandlerResult {
        Ok(DispatchOutcome::with_body(ThreadsResponseBody {
            threads: vec![Thread {
                id: THREAD_ID,
                name: "main".to_string(),
            }],
        }))
    }
}
