//! Bedrock HTTP gateway library.
//!
//! Translates REST calls into Bedrock RPC commands and sends them to the
//! first healthy node of a primary/failover cluster.

pub mod cluster;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod rpc;

pub use cluster::{Blacklist, HostEndpoint, HostPool};
pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rpc::Dispatcher;
