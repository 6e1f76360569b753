#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};

pub fn demo_trace() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/factorial.trace.json")
}

pub const DEMO_PATH: &str = "/workspace/demo/factorial.src";

/// Minimal blocking DAP client.
pub struct DapClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_seq: u32,
    /// Events seen while waiting for responses.
    pub events: Vec<Value>,
}

impl DapClient {
    pub fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("read timeout");
        let writer = stream.try_clone().expect("clone stream");
        Self {
            reader: BufReader::new(stream),
            writer,
            next_seq: 1,
            events: Vec::new(),
        }
    }

    pub fn send(&mut self, command: &str, arguments: Value) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let payload = json!({
            "seq": seq,
            "type": "request",
            "command": command,
            "arguments": arguments,
        })
        .to_string();
        write!(self.writer, "Content-Length: {}\r\n\r\n{payload}", payload.len()).expect("write");
        self.writer.flush().expect("flush");
        seq
    }

    /// Next message from the adapter, or `None` once the connection closes.
    pub fn read_message(&mut self) -> Option<Value> {
        let mut content_length = None;
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).expect("read header") == 0 {
                return None;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    content_length = Some(value.trim().parse::<usize>().expect("length"));
                }
            }
        }
        let mut body = vec![0u8; content_length.expect("content-length header")];
        self.reader.read_exact(&mut body).expect("read body");
        Some(serde_json::from_slice(&body).expect("json body"))
    }

    pub fn request(&mut self, command: &str, arguments: Value) -> Value {
        let seq = self.send(command, arguments);
        loop {
            let message = self.read_message().expect("connection closed");
            if message["type"] == "response" && message["request_seq"] == seq {
                return message;
            }
            self.events.push(message);
        }
    }

    pub fn wait_for_event(&mut self, name: &str) -> Value {
        if let Some(index) = self.events.iter().position(|event| event["event"] == name) {
            return self.events.remove(index);
        }
        loop {
            let message = self.read_message().expect("connection closed");
            if message["type"] == "event" && message["event"] == name {
                return message;
            }
            self.events.push(message);
        }
    }
}
