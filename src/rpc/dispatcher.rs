//! Per-request dispatch with blacklist-driven failover.
//!
//! # Responsibilities
//! - Serialize the request once, then try candidates in pool order
//! - Bound connection establishment and the reply wait by their timeouts
//! - Blacklist an endpoint on connect failure, connect timeout, I/O error,
//!   or read timeout, then move to the next candidate
//! - Stop at the first parsed reply, or at a malformed one
//!
//! # Design Decisions
//! - Each endpoint is attempted at most once per dispatch
//! - A zero timeout polls the operation once; it never means "wait forever"
//! - A read timeout is never retried on the same endpoint
//! - Dropping the returned future abandons the remaining candidates

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::cluster::{next_candidate, Blacklist, HostEndpoint, HostPool};
use crate::config::ClusterConfig;
use crate::observability::metrics;
use crate::rpc::codec::{self, CodecError};
use crate::rpc::types::{
    DispatchResult, FailureReason, Priority, RequestError, RpcRequest, RpcResponse, TransportFailure,
    WriteConsistency,
};

/// Timeouts and limits applied to every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub connection_timeout: Duration,
    pub read_timeout: Duration,
    pub blacklist_timeout: Duration,
    /// Deadline forwarded to the backend in the `timeout` header.
    pub command_timeout: Duration,
    pub max_reply_bytes: usize,
}

impl From<&ClusterConfig> for DispatchSettings {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            connection_timeout: Duration::from_secs(config.connection_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            blacklist_timeout: Duration::from_secs(config.blacklist_timeout_secs),
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            max_reply_bytes: config.max_reply_bytes,
        }
    }
}

/// Why a single endpoint attempt did not produce a reply.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("connect timed out")]
    ConnectTimeout,

    #[error("connect failed: {0}")]
    Connect(std::io::Error),

    #[error("no reply within read timeout")]
    ReadTimeout,

    #[error("connection error: {0}")]
    Io(std::io::Error),

    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl AttemptError {
    fn kind(&self) -> &'static str {
        match self {
            AttemptError::ConnectTimeout | AttemptError::Connect(_) => "connect",
            AttemptError::ReadTimeout | AttemptError::Io(_) => "read",
            AttemptError::Malformed(_) => "malformed",
        }
    }
}

/// Sends commands to the cluster.
///
/// Cheap to clone; clones share the host pool and the blacklist.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<HostPool>,
    settings: DispatchSettings,
    blacklist: Blacklist,
    default_priority: Priority,
    default_write_consistency: WriteConsistency,
}

impl Dispatcher {
    /// Create a dispatcher with a fresh blacklist.
    pub fn new(config: &ClusterConfig) -> Self {
        Self::with_blacklist(config, Blacklist::new())
    }

    /// Create a dispatcher that shares an existing blacklist.
    pub fn with_blacklist(config: &ClusterConfig, blacklist: Blacklist) -> Self {
        Self {
            pool: Arc::new(HostPool::new(&config.primary, &config.failover)),
            settings: DispatchSettings::from(config),
            blacklist,
            default_priority: config.priority,
            default_write_consistency: config.write_consistency,
        }
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn pool(&self) -> &HostPool {
        &self.pool
    }

    /// Build a request carrying the cluster's default priority and consistency.
    pub fn request(
        &self,
        command: impl Into<String>,
        params: BTreeMap<String, String>,
    ) -> Result<RpcRequest, RequestError> {
        RpcRequest::new(command, params, self.default_priority, self.default_write_consistency)
    }

    /// Send `request` to the first endpoint that answers.
    pub async fn dispatch(&self, request: &RpcRequest, request_id: Option<&str>) -> DispatchResult {
        let payload = codec::encode_request(request, request_id, self.settings.command_timeout);
        let mut attempted: Vec<HostEndpoint> = Vec::new();

        loop {
            let remaining: Vec<HostEndpoint> = self
                .pool
                .endpoints()
                .iter()
                .filter(|ep| !attempted.contains(ep))
                .cloned()
                .collect();

            let endpoint = match next_candidate(&remaining, &self.blacklist, Instant::now()) {
                Some(ep) => ep,
                None => {
                    let reason = if attempted.is_empty() {
                        FailureReason::NoHostsAvailable
                    } else {
                        FailureReason::AllHostsFailed
                    };
                    tracing::error!(
                        command = %request.command(),
                        reason = %reason,
                        attempts = attempted.len(),
                        "No backend endpoint could serve the request"
                    );
                    return Err(TransportFailure::new(reason, attempted));
                }
            };

            attempted.push(endpoint.clone());
            let pool = if self.pool.is_primary(&endpoint) { "primary" } else { "failover" };
            tracing::debug!(
                command = %request.command(),
                endpoint = %endpoint,
                pool,
                attempt = attempted.len(),
                "Sending command"
            );

            match self.attempt(&endpoint, &payload).await {
                Ok(response) => {
                    tracing::debug!(
                        command = %request.command(),
                        endpoint = %endpoint,
                        code = response.numeric_code,
                        "Reply received"
                    );
                    return Ok(response);
                }
                Err(AttemptError::Malformed(detail)) => {
                    tracing::error!(
                        command = %request.command(),
                        endpoint = %endpoint,
                        detail = %detail,
                        "Backend returned a malformed reply"
                    );
                    metrics::record_backend_failure(&endpoint, "malformed");
                    return Err(TransportFailure::new(FailureReason::MalformedReply, attempted));
                }
                Err(e) => {
                    tracing::warn!(
                        command = %request.command(),
                        endpoint = %endpoint,
                        pool,
                        error = %e,
                        "Attempt failed, trying next endpoint"
                    );
                    metrics::record_backend_failure(&endpoint, e.kind());
                    self.blacklist.record_failure(&endpoint, self.settings.blacklist_timeout);
                }
            }
        }
    }

    async fn attempt(&self, endpoint: &HostEndpoint, payload: &[u8]) -> Result<RpcResponse, AttemptError> {
        let connect = TcpStream::connect((endpoint.address.as_str(), endpoint.port));
        let mut stream = match timeout(self.settings.connection_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(AttemptError::Connect(e)),
            Err(_) => return Err(AttemptError::ConnectTimeout),
        };

        let exchanged = exchange(&mut stream, payload, self.settings.max_reply_bytes);
        match timeout(self.settings.read_timeout, exchanged).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(CodecError::Io(e))) => Err(AttemptError::Io(e)),
            Ok(Err(CodecError::Malformed(detail))) => Err(AttemptError::Malformed(detail)),
            Err(_) => Err(AttemptError::ReadTimeout),
        }
    }
}

async fn exchange(stream: &mut TcpStream, payload: &[u8], max_reply_bytes: usize) -> Result<RpcResponse, CodecError> {
    stream.write_all(payload).await?;
    stream.flush().await?;
    codec::read_reply(stream, max_reply_bytes).await
}
