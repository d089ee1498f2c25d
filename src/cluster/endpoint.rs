//! Backend endpoint addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single backend node, addressed by host and port.
///
/// The address may be a hostname; it is resolved on every connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct HostEndpoint {
    /// Hostname or IP literal.
    pub address: String,

    /// TCP port the node's command listener is bound to.
    pub port: u16,
}

impl HostEndpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for HostEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            // IPv6 literal
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

impl From<std::net::SocketAddr> for HostEndpoint {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
