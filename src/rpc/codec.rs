//! Backend wire format.
//!
//! # Wire Protocol
//!
//! One request per connection, line oriented, CRLF terminated:
//!
//! ```text
//! HelloWorld                      ← command line
//! name: World                     ← one line per parameter
//! priority: 500
//! writeConsistency: ASYNC
//! timeout: 300000                 ← command deadline in ms
//! requestID: 1f0c...              ← when known
//! Content-Length: 0
//!                                 ← blank line
//! ```
//!
//! The reply mirrors it: a status line (`200 OK`), header lines, a blank
//! line, then `Content-Length` bytes of JSON content.
//!
//! # Design Decisions
//! - I/O errors and early EOF are reported separately from malformed
//!   replies: the former blame the endpoint, the latter the payload
//! - The whole reply is bounded by a byte budget before anything is buffered
//! - Reply headers become string fields of the body; JSON content fields
//!   are overlaid on top

use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::rpc::types::{RpcRequest, RpcResponse};

const CONTENT_LENGTH: &str = "Content-Length";

/// Errors while reading a reply.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The connection failed or closed before the envelope was complete.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes arrived but do not form a valid envelope.
    #[error("Malformed reply: {0}")]
    Malformed(String),
}

impl CodecError {
    fn malformed(msg: impl Into<String>) -> Self {
        CodecError::Malformed(msg.into())
    }
}

/// Serialize a request envelope.
pub fn encode_request(request: &RpcRequest, request_id: Option<&str>, command_timeout: Duration) -> Vec<u8> {
    let mut out = String::with_capacity(128);

    // Writing into a String cannot fail.
    let _ = write!(out, "{}\r\n", request.command());
    for (key, value) in request.params() {
        let _ = write!(out, "{}: {}\r\n", key, value);
    }
    let _ = write!(out, "priority: {}\r\n", request.priority().wire_value());
    let _ = write!(out, "writeConsistency: {}\r\n", request.write_consistency());
    let _ = write!(out, "timeout: {}\r\n", command_timeout.as_millis());
    if let Some(id) = request_id.filter(|id| !id.is_empty() && !id.contains(['\r', '\n'])) {
        let _ = write!(out, "requestID: {}\r\n", id);
    }
    let _ = write!(out, "{}: 0\r\n\r\n", CONTENT_LENGTH);

    out.into_bytes()
}

/// Leading decimal integer of a status line, after trimming.
///
/// `"404 Not Found"` → `Some(404)`, `"Internal failure"` → `None`.
pub fn leading_code(line: &str) -> Option<u16> {
    let line = line.trim();
    let end = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
    line[..end].parse().ok()
}

/// Read and parse one reply, consuming at most `max_bytes`.
pub async fn read_reply<R>(reader: R, max_bytes: usize) -> Result<RpcResponse, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut budget = max_bytes;

    let status_line = read_line(&mut reader, &mut budget).await?;
    let status_line = status_line.trim().to_string();
    let numeric_code = leading_code(&status_line)
        .ok_or_else(|| CodecError::malformed(format!("status line without code: {:?}", status_line)))?;

    let mut body = Map::new();
    let mut content_length = 0usize;
    loop {
        let line = read_line(&mut reader, &mut budget).await?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| CodecError::malformed(format!("header without ':': {:?}", line)))?;
        let (name, value) = (name.trim(), value.trim());

        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            content_length = value
                .parse()
                .map_err(|_| CodecError::malformed(format!("bad Content-Length: {:?}", value)))?;
        } else {
            body.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    if content_length > budget {
        return Err(CodecError::malformed(format!("reply exceeds {} bytes", max_bytes)));
    }

    if content_length > 0 {
        let mut content = vec![0u8; content_length];
        reader.read_exact(&mut content).await?;

        match serde_json::from_slice::<Value>(&content) {
            Ok(Value::Object(fields)) => body.extend(fields),
            Ok(other) => {
                return Err(CodecError::malformed(format!(
                    "content is not a JSON object: {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(CodecError::malformed(format!("invalid JSON content: {}", e))),
        }
    }

    Ok(RpcResponse {
        numeric_code,
        status_line,
        body,
    })
}

async fn read_line<R>(reader: &mut R, budget: &mut usize) -> Result<String, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = (*budget as u64).saturating_add(1);
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;

    if n > *budget {
        return Err(CodecError::malformed("reply exceeds size limit"));
    }
    *budget -= n;

    if !buf.ends_with(b"\n") {
        return Err(CodecError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed mid-envelope",
        )));
    }
    buf.pop();
    if buf.ends_with(b"\r") {
        buf.pop();
    }

    String::from_utf8(buf).map_err(|_| CodecError::malformed("non UTF-8 header line"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
