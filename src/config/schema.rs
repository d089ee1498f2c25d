//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! The `[cluster]` section and its `name` and `primary` keys are mandatory
//! in a file; everything else falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cluster::HostEndpoint;
use crate::rpc::{Priority, WriteConsistency};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, body limit).
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Backend cluster the gateway forwards to.
    pub cluster: ClusterConfig,

    /// Route table mapping HTTP paths to backend commands.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            cluster: ClusterConfig::default(),
            routes: default_routes(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Backend cluster configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Cluster identifier for logging.
    pub name: String,

    /// Preferred endpoints, tried first and in order.
    pub primary: Vec<HostEndpoint>,

    /// Endpoints tried only after every primary is blacklisted or failed.
    #[serde(default)]
    pub failover: Vec<HostEndpoint>,

    /// Connection establishment timeout in seconds (0 = do not wait).
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Reply wait timeout in seconds (0 = do not wait).
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// How long a failed endpoint stays excluded, in seconds.
    #[serde(default = "default_blacklist_timeout")]
    pub blacklist_timeout_secs: u64,

    /// Command deadline passed to the backend, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Priority attached to every command.
    #[serde(default)]
    pub priority: Priority,

    /// Write consistency attached to every command.
    #[serde(default)]
    pub write_consistency: WriteConsistency,

    /// Largest accepted reply (headers + content) in bytes.
    #[serde(default = "default_max_reply_bytes")]
    pub max_reply_bytes: usize,
}

fn default_connection_timeout() -> u64 {
    1
}

fn default_read_timeout() -> u64 {
    300
}

fn default_blacklist_timeout() -> u64 {
    60
}

fn default_command_timeout() -> u64 {
    300
}

fn default_max_reply_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: "todo".to_string(),
            primary: vec![HostEndpoint::new("127.0.0.1", 8888)],
            failover: vec![HostEndpoint::new("127.0.0.1", 8888)],
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
            blacklist_timeout_secs: default_blacklist_timeout(),
            command_timeout_secs: default_command_timeout(),
            priority: Priority::Normal,
            write_consistency: WriteConsistency::Async,
            max_reply_bytes: default_max_reply_bytes(),
        }
    }
}

/// Maps an HTTP path and verbs to a backend command.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Exact request path, e.g. "/api/hello".
    pub path: String,

    /// Accepted verbs (GET and/or POST).
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Backend command name.
    pub command: String,

    /// Parameters sent when the request does not supply them.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl RouteConfig {
    pub fn new(path: &str, methods: &[&str], command: &str) -> Self {
        Self {
            path: path.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            command: command.to_string(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, key: &str, value: &str) -> Self {
        self.defaults.insert(key.to_string(), value.to_string());
        self
    }
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string()]
}

/// The stock API: hello world plus the message board commands.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/api/hello", &["GET", "POST"], "HelloWorld").with_default("name", "World"),
        RouteConfig::new("/api/messages", &["GET"], "GetMessages"),
        RouteConfig::new("/api/messages", &["POST"], "CreateMessage"),
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
