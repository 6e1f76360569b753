//! DAP protocol framing.
//! - MessageFramer::push: feed raw bytes, collect completed frames
//! - encode_message: prefix a payload with its Content-Length header

use tracing::debug;

use crate::error::FrameError;
use crate::protocol::ProtocolMessage;

const CONTENT_LENGTH: &str = "Content-Length";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const MAX_HEADER_LEN: usize = 8 * 1024;

/// One decoded frame: the raw JSON text plus its classified message.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) payload: String,
    pub(crate) message: ProtocolMessage,
}

/// Incremental decoder. Bytes that do not yet form a complete frame are kept
/// for the next [`MessageFramer::push`].
#[derive(Debug, Default)]
pub(crate) struct MessageFramer {
    buffer: Vec<u8>,
}

impl MessageFramer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<Result<Frame, FrameError>> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();
        loop {
            // Resync on the next header. Anything in front of it is left over
            // from a frame that was already rejected.
            match find_header_start(&self.buffer) {
                Some(0) => {}
                Some(start) => {
                    debug!(bytes = start, "skipping bytes before frame header");
                    self.buffer.drain(..start);
                }
                None => {
                    if self.buffer.len() > MAX_HEADER_LEN {
                        // Keep a tail that could still be the start of a header.
                        let cut = self.buffer.len() - (CONTENT_LENGTH.len() - 1);
                        self.buffer.drain(..cut);
                        frames.push(Err(FrameError::HeaderTooLarge {
                            limit: MAX_HEADER_LEN,
                        }));
                    }
                    break;
                }
            }
            let Some(header_end) = find_subslice(&self.buffer, HEADER_TERMINATOR) else {
                if self.buffer.len() > MAX_HEADER_LEN {
                    self.buffer.drain(..CONTENT_LENGTH.len());
                    frames.push(Err(FrameError::HeaderTooLarge {
                        limit: MAX_HEADER_LEN,
                    }));
                    continue;
                }
                break;
            };
            let body_start = header_end + HEADER_TERMINATOR.len();
            let length = match parse_content_length(&self.buffer[..header_end]) {
                Ok(length) => length,
                Err(err) => {
                    self.buffer.drain(..body_start);
                    frames.push(Err(err));
                    continue;
                }
            };
            let Some(frame_end) = body_start.checked_add(length) else {
                self.buffer.drain(..body_start);
                frames.push(Err(FrameError::InvalidContentLength(length.to_string())));
                continue;
            };
            if self.buffer.len() < frame_end {
                break;
            }
            let body: Vec<u8> = self.buffer.drain(..frame_end).skip(body_start).collect();
            frames.push(decode_body(body));
        }
        frames
    }

    /// Bytes held back waiting for the rest of a frame.
    pub(crate) fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

pub(crate) fn encode_message(payload: &str) -> Vec<u8> {
    let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", payload.len());
    let mut bytes = Vec::with_capacity(header.len() + payload.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(payload.as_bytes());
    bytes
}

fn parse_content_length(header: &[u8]) -> Result<usize, FrameError> {
    let text = String::from_utf8_lossy(header);
    for line in text.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let value = value.trim();
            return value
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(value.to_string()));
        }
    }
    Err(FrameError::MissingContentLength)
}

fn decode_body(body: Vec<u8>) -> Result<Frame, FrameError> {
    let payload = String::from_utf8(body).map_err(|_| FrameError::InvalidUtf8)?;
    let value: serde_json::Value = serde_json::from_str(&payload)?;
    let message = ProtocolMessage::from_json(value)?;
    Ok(Frame { payload, message })
}

/// Offset of the next `Content-Length` token, matched case-insensitively.
fn find_header_start(buffer: &[u8]) -> Option<usize> {
    let token = CONTENT_LENGTH.as_bytes();
    buffer
        .windows(token.len())
        .position(|window| window.eq_ignore_ascii_case(token))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
