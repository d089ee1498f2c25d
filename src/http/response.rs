//! Response translation.
//!
//! # Responsibilities
//! - Map a backend reply or a transport failure to an HTTP status and JSON body
//! - Render that result as an axum response
//!
//! # Design Decisions
//! - Translation is a pure function of its input
//! - Code 200 passes the reply body through untouched
//! - Any other code uses the status line's leading integer as the HTTP
//!   status when it is positive, else 500; the status line becomes the error
//! - Unreachable backends are 502; malformed replies are 500
//! - A status that HTTP cannot represent is sent as 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::rpc::codec::leading_code;
use crate::rpc::types::{DispatchResult, FailureReason, RpcResponse, TransportFailure};

/// Error text for 502 replies.
pub const BACKEND_UNREACHABLE: &str = "Error connecting to backend";

/// Error text for replies that could not be parsed.
pub const MALFORMED_REPLY: &str = "Malformed reply from backend";

/// What the HTTP layer sends back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub http_status: u16,
    pub json_body: Map<String, Value>,
}

impl GatewayResult {
    /// `{"error": message}` with the given status.
    pub fn error(http_status: u16, message: impl Into<String>) -> Self {
        let mut json_body = Map::new();
        json_body.insert("error".to_string(), Value::String(message.into()));
        Self {
            http_status,
            json_body,
        }
    }
}

/// Translate one dispatch outcome.
pub fn translate(result: &DispatchResult) -> GatewayResult {
    match result {
        Ok(response) => translate_response(response),
        Err(failure) => translate_failure(failure),
    }
}

pub fn translate_response(response: &RpcResponse) -> GatewayResult {
    if response.numeric_code == 200 {
        return GatewayResult {
            http_status: 200,
            json_body: response.body.clone(),
        };
    }

    let http_status = leading_code(&response.status_line)
        .filter(|code| *code > 0)
        .unwrap_or(500);
    GatewayResult::error(http_status, response.status_line.clone())
}

pub fn translate_failure(failure: &TransportFailure) -> GatewayResult {
    match failure.reason {
        FailureReason::NoHostsAvailable | FailureReason::AllHostsFailed => {
            let mut result = GatewayResult::error(502, BACKEND_UNREACHABLE);
            result
                .json_body
                .insert("reason".to_string(), Value::String(failure.reason.to_string()));
            result
        }
        FailureReason::MalformedReply => GatewayResult::error(500, MALFORMED_REPLY),
    }
}

impl IntoResponse for GatewayResult {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(Value::Object(self.json_body))).into_response()
    }
}
