//! Request, reply, and failure types exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::cluster::HostEndpoint;

/// Header names the gateway writes itself; callers cannot supply them.
pub const RESERVED_PARAMS: &[&str] = &[
    "priority",
    "writeConsistency",
    "timeout",
    "requestID",
    "Content-Length",
];

/// Scheduling hint for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Numeric value the backend expects on the wire.
    pub fn wire_value(self) -> u16 {
        match self {
            Priority::Low => 250,
            Priority::Normal => 500,
            Priority::High => 750,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "NORMAL" => Ok(Priority::Normal),
            "HIGH" => Ok(Priority::High),
            _ => Err(RequestError::UnknownPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durability requirement for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteConsistency {
    #[default]
    Async,
    Strong,
}

impl WriteConsistency {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteConsistency::Async => "ASYNC",
            WriteConsistency::Strong => "STRONG",
        }
    }
}

impl FromStr for WriteConsistency {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASYNC" => Ok(WriteConsistency::Async),
            "STRONG" => Ok(WriteConsistency::Strong),
            _ => Err(RequestError::UnknownConsistency(s.to_string())),
        }
    }
}

impl fmt::Display for WriteConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons an `RpcRequest` cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Command name must be non-empty and contain no whitespace: {0:?}")]
    InvalidCommand(String),

    #[error("Invalid parameter name: {0:?}")]
    InvalidParamName(String),

    #[error("Parameter '{0}' is reserved")]
    ReservedParam(String),

    #[error("Parameter '{0}' contains a line break")]
    InvalidParamValue(String),

    #[error("Unknown priority '{0}' (expected LOW, NORMAL or HIGH)")]
    UnknownPriority(String),

    #[error("Unknown write consistency '{0}' (expected ASYNC or STRONG)")]
    UnknownConsistency(String),
}

/// Whether a command name can be written as the request line.
pub fn is_valid_command(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// One command invocation, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    command: String,
    params: BTreeMap<String, String>,
    priority: Priority,
    write_consistency: WriteConsistency,
}

impl RpcRequest {
    /// Build a request, rejecting anything that cannot travel on the wire
    /// unchanged.
    pub fn new(
        command: impl Into<String>,
        params: BTreeMap<String, String>,
        priority: Priority,
        write_consistency: WriteConsistency,
    ) -> Result<Self, RequestError> {
        let command = command.into();
        if !is_valid_command(&command) {
            return Err(RequestError::InvalidCommand(command));
        }

        for (key, value) in &params {
            if key.is_empty() || key.contains([':', '\r', '\n']) || key.trim() != key {
                return Err(RequestError::InvalidParamName(key.clone()));
            }
            if RESERVED_PARAMS.iter().any(|r| r.eq_ignore_ascii_case(key)) {
                return Err(RequestError::ReservedParam(key.clone()));
            }
            if value.contains(['\r', '\n']) {
                return Err(RequestError::InvalidParamValue(key.clone()));
            }
        }

        Ok(Self {
            command,
            params,
            priority,
            write_consistency,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn write_consistency(&self) -> WriteConsistency {
        self.write_consistency
    }
}

/// A parsed reply from exactly one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    /// Leading integer of the status line.
    pub numeric_code: u16,
    /// Full status line, e.g. "404 Not Found".
    pub status_line: String,
    pub body: Map<String, Value>,
}

/// Why a dispatch produced no usable reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// Every endpoint was blacklisted before any attempt.
    NoHostsAvailable,
    /// Every eligible endpoint was attempted and failed.
    AllHostsFailed,
    /// An endpoint replied with something that is not a valid envelope.
    MalformedReply,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::NoHostsAvailable => "NoHostsAvailable",
            FailureReason::AllHostsFailed => "AllHostsFailed",
            FailureReason::MalformedReply => "MalformedReply",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal dispatch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} after trying {} endpoint(s)", .attempted.len())]
pub struct TransportFailure {
    pub reason: FailureReason,
    /// Endpoints contacted during this dispatch, in order.
    pub attempted: Vec<HostEndpoint>,
}

impl TransportFailure {
    pub fn new(reason: FailureReason, attempted: Vec<HostEndpoint>) -> Self {
        Self { reason, attempted }
    }
}

/// Outcome of one dispatch: exactly one of reply or failure.
pub type DispatchResult = Result<RpcResponse, TransportFailure>;
