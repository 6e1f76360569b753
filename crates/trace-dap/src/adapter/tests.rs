//! Adapter unit tests.
//! - direct dispatch: envelopes, ordering, failures
//! - scripted sessions: a replayed trace driven through a fake transport

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use super::framer::{encode_message, MessageFramer};
use super::*;
use crate::protocol::{MessageType, Request};
use crate::replay::ReplayProvider;
use crate::trace::{FrameKey, FrameRef, LineHook, TraceFrame, TraceProvider};
use crate::value::Bindings;

const TRACE: &str = r#"{
    "globals": {
        "x": 99,
        "LIMIT": 5,
        "origin": {"$object": "Point", "fields": {"a": 1, "_cache": 2}},
        "sock": {"$opaque": "Socket"}
    },
    "steps": [
        {"stack": [{"key": 1, "name": "main", "path": "/w/app.src", "line": 1}]},
        {"stack": [{"key": 1, "name": "main", "path": "/w/app.src", "line": 2, "locals": {"x": 1}}]},
        {"stack": [{"key": 1, "name": "main", "path": "/w/app.src", "line": 3, "locals": {"x": 1}}]},
        {"stack": [
            {"key": 2, "name": "helper", "path": "/w/app.src", "line": 10, "locals": {"n": 1}},
            {"key": 1, "name": "main", "path": "/w/app.src", "line": 3, "locals": {"x": 1}}
        ]},
        {"stack": [
            {"key": 2, "name": "helper", "path": "/w/app.src", "line": 11, "locals": {"n": 1, "r": 2}},
            {"key": 1, "name": "main", "path": "/w/app.src", "line": 3, "locals": {"x": 1}}
        ]},
        {"stack": [{"key": 1, "name": "main", "path": "/w/app.src", "line": 4, "locals": {"x": 1, "y": 2}}]},
        {"stack": [{"key": 1, "name": "main", "path": "/w/app.src", "line": 5, "locals": {"x": 1, "y": 2}}]}
    ]
}"#;

/// Hands out pre-recorded chunks, then reports the peer as gone.
struct ScriptedTransport {
    chunks: VecDeque<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
    fail_writes: bool,
}

impl ScriptedTransport {
    fn new(chunks: Vec<Vec<u8>>, output: Arc<Mutex<Vec<u8>>>) -> Self {
        Self {
            chunks: chunks.into(),
            output,
            fail_writes: false,
        }
    }

    fn take_chunk(&mut self, buf: &mut [u8]) -> Option<usize> {
        let mut chunk = self.chunks.pop_front()?;
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Some(n)
    }
}

impl Transport for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.take_chunk(buf).unwrap_or(0))
    }

    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<Poll> {
        Ok(match self.take_chunk(buf) {
            Some(n) => Poll::Data(n),
            None => Poll::Closed,
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client gone"));
        }
        self.output.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }
}

fn test_config() -> AdapterConfig {
    AdapterConfig {
        poll_interval: Duration::from_millis(1),
        running_poll_interval: None,
        ..AdapterConfig::default()
    }
}

fn idle_adapter() -> DebugAdapter {
    let output = Arc::new(Mutex::new(Vec::new()));
    DebugAdapter::new(ScriptedTransport::new(Vec::new(), output), test_config())
}

fn dispatch(adapter: &mut DebugAdapter, seq: u32, command: &str, arguments: Value) -> Vec<Value> {
    adapter.dispatch_request(Request {
        seq,
        message_type: MessageType::Request,
        command: command.to_string(),
        arguments: Some(arguments),
    })
}

fn request(seq: u32, command: &str, arguments: Value) -> Vec<u8> {
    let payload = json!({
        "seq": seq,
        "type": "request",
        "command": command,
        "arguments": arguments,
    });
    encode_message(&payload.to_string())
}

/// initialize, launch, setBreakpoints, configurationDone as seq 1..=4.
fn setup(lines: &[u32]) -> Vec<Vec<u8>> {
    vec![
        request(1, "initialize", json!({"clientID": "test", "adapterID": "trace"})),
        request(2, "launch", json!({"program": "/w/app.src"})),
        request(
            3,
            "setBreakpoints",
            json!({
                "source": {"path": "/w/app.src"},
                "breakpoints": lines.iter().map(|line| json!({"line": line})).collect::<Vec<_>>(),
            }),
        ),
        request(4, "configurationDone", json!({})),
    ]
}

fn written(output: &Arc<Mutex<Vec<u8>>>) -> Vec<Value> {
    let bytes = output.lock().unwrap().clone();
    MessageFramer::new()
        .push(&bytes)
        .into_iter()
        .map(|frame| serde_json::from_str(&frame.unwrap().payload).unwrap())
        .collect()
}

struct SessionRun {
    messages: Vec<Value>,
    state: ControllerState,
}

impl SessionRun {
    fn response(&self, request_seq: u32) -> &Value {
        self.messages
            .iter()
            .find(|message| message["type"] == "response" && message["request_seq"] == request_seq)
            .unwrap_or_else(|| panic!("no response to request {request_seq}"))
    }

    fn events(&self, name: &str) -> Vec<&Value> {
        self.messages
            .iter()
            .filter(|message| message["type"] == "event" && message["event"] == name)
            .collect()
    }

    fn stop_reasons(&self) -> Vec<&str> {
        self.events("stopped")
            .into_iter()
            .filter_map(|event| event["body"]["reason"].as_str())
            .collect()
    }
}

fn run_script(chunks: Vec<Vec<u8>>) -> SessionRun {
    let mut provider = ReplayProvider::from_json_str(TRACE).unwrap();
    run_with(chunks, &mut provider)
}

fn run_with(chunks: Vec<Vec<u8>>, provider: &mut dyn TraceProvider) -> SessionRun {
    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = ScriptedTransport::new(chunks, Arc::clone(&output));
    let mut adapter = DebugAdapter::new(transport, test_config());
    adapter.start();
    if !adapter.is_stopped() {
        provider.run(&mut adapter);
        adapter.finish();
    }
    SessionRun {
        messages: written(&output),
        state: adapter.state(),
    }
}

fn frame_lines(response: &Value) -> Vec<(String, u64)> {
    response["body"]["stackFrames"]
        .as_array()
        .unwrap()
        .iter()
        .map(|frame| {
            (
                frame["name"].as_str().unwrap().to_string(),
                frame["line"].as_u64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn initialized_event_precedes_initialize_response() {
    let mut adapter = idle_adapter();
    let messages = dispatch(&mut adapter, 1, "initialize", json!({"adapterID": "trace"}));
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["type"], "event");
    assert_eq!(messages[0]["event"], "initialized");
    assert_eq!(messages[1]["type"], "response");
    assert_eq!(messages[1]["request_seq"], 1);
    assert_eq!(messages[1]["success"], true);
    assert_eq!(messages[1]["body"]["supportsConfigurationDoneRequest"], true);
    assert_eq!(messages[1]["body"]["supportsStepBack"], false);
    assert!(messages[0]["seq"].as_u64() < messages[1]["seq"].as_u64());
}

#[test]
fn unknown_command_fails_and_session_continues() {
    let mut adapter = idle_adapter();
    let failed = dispatch(&mut adapter, 1, "evaluate", json!({"expression": "x"}));
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["success"], false);
    assert!(failed[0]["message"].as_str().unwrap().contains("evaluate"));
    assert_eq!(failed[0]["body"]["error"], failed[0]["message"]);

    let threads = dispatch(&mut adapter, 2, "threads", json!({}));
    assert_eq!(threads[0]["success"], true);
    assert_eq!(threads[0]["body"]["threads"], json!([{"id": 1, "name": "main"}]));
    assert!(failed[0]["seq"].as_u64() < threads[0]["seq"].as_u64());
}

#[test]
fn set_breakpoints_requires_source_path() {
    let mut adapter = idle_adapter();
    let messages = dispatch(
        &mut adapter,
        1,
        "setBreakpoints",
        json!({"source": {"name": "app.src"}, "breakpoints": [{"line": 3}]}),
    );
    assert_eq!(messages[0]["success"], false);
    assert!(messages[0]["message"].as_str().unwrap().contains("path"));
}

#[test]
fn set_breakpoints_accepts_plain_line_list() {
    let mut adapter = idle_adapter();
    let messages = dispatch(
        &mut adapter,
        1,
        "setBreakpoints",
        json!({"source": {"path": "/w/app.src"}, "lines": [7, 3, 7]}),
    );
    let breakpoints = messages[0]["body"]["breakpoints"].as_array().unwrap();
    let summary: Vec<(u64, u64, bool)> = breakpoints
        .iter()
        .map(|bp| {
            (
                bp["id"].as_u64().unwrap(),
                bp["line"].as_u64().unwrap(),
                bp["verified"].as_bool().unwrap(),
            )
        })
        .collect();
    assert_eq!(summary, vec![(1, 7, true), (2, 3, true), (3, 7, true)]);
    assert_eq!(breakpoints[0]["source"]["path"], "/w/app.src");
}

#[test]
fn run_control_requires_suspension() {
    let mut adapter = idle_adapter();
    for command in ["next", "stepIn", "continue"] {
        let messages = dispatch(&mut adapter, 1, command, json!({"threadId": 1}));
        assert_eq!(messages[0]["success"], false, "{command} while idle");
    }
    let scopes = dispatch(&mut adapter, 2, "scopes", json!({"frameId": 1}));
    assert_eq!(scopes[0]["success"], false);

    dispatch(&mut adapter, 3, "configurationDone", json!({}));
    assert_eq!(adapter.state(), ControllerState::Running);
    let resumed = dispatch(&mut adapter, 4, "continue", json!({"threadId": 1}));
    assert_eq!(resumed[0]["success"], true);
    assert_eq!(resumed[0]["body"]["allThreadsContinued"], true);
    let step = dispatch(&mut adapter, 5, "next", json!({"threadId": 1}));
    assert_eq!(step[0]["success"], false);
}

#[test]
fn inspection_without_suspension_is_empty() {
    let mut adapter = idle_adapter();
    let stack = dispatch(&mut adapter, 1, "stackTrace", json!({"threadId": 1}));
    assert_eq!(stack[0]["success"], true);
    assert_eq!(stack[0]["body"]["stackFrames"], json!([]));
    assert_eq!(stack[0]["body"]["totalFrames"], 0);

    let variables = dispatch(&mut adapter, 2, "variables", json!({"variablesReference": 0}));
    assert_eq!(variables[0]["body"]["variables"], json!([]));
    let unknown = dispatch(&mut adapter, 3, "variables", json!({"variablesReference": 42}));
    assert_eq!(unknown[0]["success"], true);
    assert_eq!(unknown[0]["body"]["variables"], json!([]));
}

#[test]
fn invalid_arguments_fail_the_request() {
    let mut adapter = idle_adapter();
    let messages = dispatch(&mut adapter, 1, "scopes", json!({"frameId": "top"}));
    assert_eq!(messages[0]["success"], false);
    assert!(messages[0]["message"].as_str().unwrap().contains("scopes"));
}

#[test]
fn launch_records_normalized_program() {
    let mut adapter = idle_adapter();
    let messages = dispatch(
        &mut adapter,
        1,
        "launch",
        json!({"program": "C:\\Work\\.\\App.src", "args": ["--fast"], "noDebug": false}),
    );
    assert_eq!(messages[0]["success"], true);
    assert_eq!(adapter.launch_program(), Some("c:/work/app.src"));
    assert_eq!(adapter.launch_args(), ["--fast".to_string()]);
}

#[test]
fn breakpoint_stop_serves_inspection_requests() {
    let mut chunks = setup(&[3]);
    chunks.extend([
        request(5, "threads", json!({})),
        request(6, "stackTrace", json!({"threadId": 1})),
        request(7, "scopes", json!({"frameId": 1})),
        request(8, "scopes", json!({"frameId": 1})),
        request(9, "variables", json!({"variablesReference": 1})),
        request(10, "variables", json!({"variablesReference": 2})),
        request(11, "variables", json!({"variablesReference": 3})),
        request(12, "continue", json!({"threadId": 1})),
    ]);
    let run = run_script(chunks);

    let seqs: Vec<u64> = run
        .messages
        .iter()
        .map(|message| message["seq"].as_u64().unwrap())
        .collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]), "{seqs:?}");
    assert_eq!(run.messages[0]["event"], "thread");

    let stopped = run.events("stopped");
    assert_eq!(stopped.len(), 1);
    assert_eq!(
        stopped[0]["body"],
        json!({"reason": "breakpoint", "threadId": 1, "allThreadsStopped": true})
    );

    let stack = run.response(6);
    assert_eq!(frame_lines(stack), vec![("main".to_string(), 3)]);
    assert_eq!(stack["body"]["totalFrames"], 1);
    assert_eq!(stack["body"]["stackFrames"][0]["source"]["name"], "app.src");
    assert_eq!(stack["body"]["stackFrames"][0]["source"]["path"], "/w/app.src");

    let scopes = &run.response(7)["body"]["scopes"];
    assert_eq!(scopes, &run.response(8)["body"]["scopes"]);
    assert_eq!(scopes[0]["name"], "Locals");
    assert_eq!(scopes[0]["variablesReference"], 1);
    assert_eq!(scopes[1]["name"], "Globals");
    assert_eq!(scopes[1]["variablesReference"], 2);
    assert_eq!(scopes[1]["expensive"], true);

    assert_eq!(
        run.response(9)["body"]["variables"],
        json!([{"name": "x", "value": "1", "type": "int", "variablesReference": 0}])
    );

    let globals = run.response(10)["body"]["variables"].as_array().unwrap();
    let names: Vec<&str> = globals
        .iter()
        .map(|var| var["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"x"), "locals shadow globals: {names:?}");
    assert!(names.contains(&"LIMIT"));
    let sock = globals.iter().find(|var| var["name"] == "sock").unwrap();
    assert_eq!(sock["value"], "<error: value cannot be displayed>");
    assert_eq!(sock["type"], "Socket");
    assert_eq!(sock["variablesReference"], 0);
    let origin = globals.iter().find(|var| var["name"] == "origin").unwrap();
    assert_eq!(origin["variablesReference"], 3);

    let fields = run.response(11)["body"]["variables"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["name"], "a");

    assert!(run.response(12)["success"] == true);
    assert_eq!(run.messages.last().unwrap()["event"], "terminated");
    assert_eq!(run.state, ControllerState::Stopped);
}

#[test]
fn scope_handles_are_fresh_after_resume() {
    let mut chunks = setup(&[3, 4]);
    chunks.extend([
        request(5, "scopes", json!({"frameId": 1})),
        request(6, "continue", json!({"threadId": 1})),
        request(7, "scopes", json!({"frameId": 1})),
        request(8, "variables", json!({"variablesReference": 1})),
        request(9, "continue", json!({"threadId": 1})),
    ]);
    let run = run_script(chunks);

    assert_eq!(run.stop_reasons(), vec!["breakpoint", "breakpoint"]);
    let first = &run.response(5)["body"]["scopes"];
    let second = &run.response(7)["body"]["scopes"];
    assert_eq!(first[0]["variablesReference"], 1);
    assert_eq!(second[0]["variablesReference"], 3);
    assert_eq!(second[1]["variablesReference"], 4);
    assert_eq!(run.response(8)["success"], true);
    assert_eq!(run.response(8)["body"]["variables"], json!([]));
}

#[test]
fn next_steps_over_calls() {
    let mut chunks = setup(&[3]);
    chunks.extend([
        request(5, "next", json!({"threadId": 1})),
        request(6, "stackTrace", json!({"threadId": 1})),
        request(7, "continue", json!({"threadId": 1})),
    ]);
    let run = run_script(chunks);

    assert_eq!(run.stop_reasons(), vec!["breakpoint", "step"]);
    assert_eq!(frame_lines(run.response(6)), vec![("main".to_string(), 4)]);
}

#[test]
fn step_in_stops_in_callee() {
    let mut chunks = setup(&[3]);
    chunks.extend([
        request(5, "stepIn", json!({"threadId": 1})),
        request(6, "stackTrace", json!({"threadId": 1})),
        request(7, "stackTrace", json!({"threadId": 1, "startFrame": 1, "levels": 1})),
        request(8, "continue", json!({"threadId": 1})),
    ]);
    let run = run_script(chunks);

    assert_eq!(run.stop_reasons(), vec!["breakpoint", "step"]);
    assert_eq!(
        frame_lines(run.response(6)),
        vec![("helper".to_string(), 10), ("main".to_string(), 3)]
    );
    let ids: Vec<u64> = run.response(6)["body"]["stackFrames"]
        .as_array()
        .unwrap()
        .iter()
        .map(|frame| frame["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(frame_lines(run.response(7)), vec![("main".to_string(), 3)]);
    assert_eq!(run.response(7)["body"]["totalFrames"], 2);
}

#[test]
fn breakpoint_wins_over_pending_step() {
    let mut chunks = setup(&[3, 10]);
    chunks.extend([
        request(5, "stepIn", json!({"threadId": 1})),
        request(6, "continue", json!({"threadId": 1})),
    ]);
    let run = run_script(chunks);
    assert_eq!(run.stop_reasons(), vec!["breakpoint", "breakpoint"]);
}

#[test]
fn runs_to_completion_without_breakpoints() {
    let run = run_script(setup(&[]));
    assert!(run.events("stopped").is_empty());
    assert_eq!(run.events("terminated").len(), 1);
    assert_eq!(run.state, ControllerState::Stopped);
}

#[test]
fn client_eof_while_suspended_stops_session() {
    let run = run_script(setup(&[3]));
    assert_eq!(run.stop_reasons(), vec!["breakpoint"]);
    assert!(run.events("terminated").is_empty());
    assert_eq!(run.state, ControllerState::Stopped);
}

#[test]
fn disconnect_while_suspended_stops_session() {
    let mut chunks = setup(&[3]);
    chunks.push(request(5, "disconnect", json!({"terminateDebuggee": true})));
    let run = run_script(chunks);
    assert_eq!(run.response(5)["success"], true);
    assert!(run.events("terminated").is_empty());
    assert_eq!(run.state, ControllerState::Stopped);
}

#[test]
fn malformed_frames_are_skipped() {
    let mut chunks = vec![encode_message("{not json")];
    chunks.extend(setup(&[]));
    let run = run_script(chunks);
    assert_eq!(run.response(1)["success"], true);
    assert_eq!(run.events("terminated").len(), 1);
}

#[test]
fn requests_split_across_reads_are_reassembled() {
    let joined: Vec<u8> = setup(&[3]).concat();
    let (head, tail) = joined.split_at(joined.len() / 2 + 3);
    let mut chunks = vec![head.to_vec(), tail.to_vec()];
    chunks.push(request(5, "continue", json!({"threadId": 1})));
    let run = run_script(chunks);
    assert_eq!(run.stop_reasons(), vec!["breakpoint"]);
    assert_eq!(run.response(5)["success"], true);
    assert_eq!(run.events("terminated").len(), 1);
}

#[test]
fn write_failure_stops_session() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let mut transport = ScriptedTransport::new(setup(&[3]), Arc::clone(&output));
    transport.fail_writes = true;
    let mut adapter = DebugAdapter::new(transport, test_config());
    adapter.start();
    assert_eq!(adapter.state(), ControllerState::Stopped);
    assert!(output.lock().unwrap().is_empty());
}

#[test]
fn bad_length_frame_does_not_lose_later_requests() {
    let mut stray = b"Content-Length: abc\r\n\r\n".to_vec();
    stray.extend_from_slice(br#"{"seq":0,"type":"request","command":"threads"}"#);
    let mut short = b"Content-Length: 4\r\n\r\n".to_vec();
    short.extend_from_slice(br#"{"seq":0,"type":"request","command":"threads"}"#);

    let mut chunks = vec![stray, short];
    chunks.extend(setup(&[3]));
    chunks.push(request(5, "continue", json!({"threadId": 1})));
    let run = run_script(chunks);

    assert_eq!(run.response(1)["success"], true);
    assert_eq!(run.stop_reasons(), vec!["breakpoint"]);
    assert_eq!(run.response(5)["success"], true);
    assert_eq!(run.events("terminated").len(), 1);
}

/// Frame whose bindings cannot be read.
#[derive(Debug)]
struct BrokenFrame;

impl TraceFrame for BrokenFrame {
    fn key(&self) -> FrameKey {
        1
    }
    fn name(&self) -> &str {
        "main"
    }
    fn path(&self) -> &str {
        "/w/app.src"
    }
    fn line(&self) -> u32 {
        3
    }
    fn locals(&self) -> Bindings {
        panic!("locals unavailable")
    }
    fn globals(&self) -> Bindings {
        Bindings::new()
    }
    fn caller(&self) -> Option<FrameRef> {
        None
    }
}

struct SingleLine(FrameRef);

impl TraceProvider for SingleLine {
    fn run(&mut self, hook: &mut dyn LineHook) {
        hook.on_line(&self.0);
    }
}

#[test]
fn handler_panic_becomes_failed_response() {
    let mut chunks = setup(&[3]);
    chunks.extend([
        request(5, "scopes", json!({"frameId": 1})),
        request(6, "variables", json!({"variablesReference": 1})),
        request(7, "threads", json!({})),
        request(8, "continue", json!({"threadId": 1})),
    ]);
    let mut provider = SingleLine(Arc::new(BrokenFrame));
    let run = run_with(chunks, &mut provider);

    assert_eq!(run.stop_reasons(), vec!["breakpoint"]);
    let failed = run.response(6);
    assert_eq!(failed["success"], false);
    assert!(failed["message"].as_str().unwrap().contains("locals unavailable"));
    assert_eq!(run.response(7)["success"], true);
    assert_eq!(run.response(8)["success"], true);
    assert_eq!(run.events("terminated").len(), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn failing_protocol_log_is_disabled_and_session_continues() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = ScriptedTransport::new(setup(&[]), Arc::clone(&output));
    let config = AdapterConfig {
        protocol_log: Some("/dev/full".into()),
        ..test_config()
    };
    let mut adapter = DebugAdapter::new(transport, config);
    assert!(adapter.protocol_log.is_some());
    adapter.start();

    assert!(adapter.protocol_log.is_none());
    assert_eq!(adapter.state(), ControllerState::Running);
    let messages = written(&output);
    assert!(messages
        .iter()
        .any(|message| message["command"] == "configurationDone" && message["success"] == true));
}
