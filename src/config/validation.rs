//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports non-zero, limits positive, timeouts bounded)
//! - Check that every route names a command the wire format can carry
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::http::server::STATUS_PATH;
use crate::rpc::types::is_valid_command;

/// Upper bound for every `*_timeout_secs` setting (one week).
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("cluster.name must not be empty")]
    EmptyClusterName,

    #[error("cluster.primary must list at least one endpoint")]
    NoPrimaryEndpoints,

    #[error("{pool}[{index}]: {reason}")]
    InvalidEndpoint {
        pool: &'static str,
        index: usize,
        reason: &'static str,
    },

    #[error("cluster.{field} must not exceed {max} seconds")]
    TimeoutTooLarge { field: &'static str, max: u64 },

    #[error("cluster.max_reply_bytes must be greater than zero")]
    ZeroReplyLimit,

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("routes[{index}]: {reason}")]
    InvalidRoute { index: usize, reason: String },

    #[error("routes[{index}]: {method} {path} is already routed")]
    DuplicateRoute {
        index: usize,
        method: String,
        path: String,
    },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let cluster = &config.cluster;

    if cluster.name.trim().is_empty() {
        errors.push(ValidationError::EmptyClusterName);
    }
    if cluster.primary.is_empty() {
        errors.push(ValidationError::NoPrimaryEndpoints);
    }
    for (pool, endpoints) in [("cluster.primary", &cluster.primary), ("cluster.failover", &cluster.failover)] {
        for (index, ep) in endpoints.iter().enumerate() {
            if ep.address.trim().is_empty() {
                errors.push(ValidationError::InvalidEndpoint {
                    pool,
                    index,
                    reason: "address must not be empty",
                });
            }
            if ep.port == 0 {
                errors.push(ValidationError::InvalidEndpoint {
                    pool,
                    index,
                    reason: "port must be non-zero",
                });
            }
        }
    }
    for (field, secs) in [
        ("connection_timeout_secs", cluster.connection_timeout_secs),
        ("read_timeout_secs", cluster.read_timeout_secs),
        ("blacklist_timeout_secs", cluster.blacklist_timeout_secs),
        ("command_timeout_secs", cluster.command_timeout_secs),
    ] {
        if secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::TimeoutTooLarge {
                field,
                max: MAX_TIMEOUT_SECS,
            });
        }
    }
    if cluster.max_reply_bytes == 0 {
        errors.push(ValidationError::ZeroReplyLimit);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        let invalid = |reason: &str| ValidationError::InvalidRoute {
            index,
            reason: reason.to_string(),
        };

        if !route.path.starts_with('/') {
            errors.push(invalid("path must start with '/'"));
        }
        if route.path == STATUS_PATH {
            errors.push(invalid("path is reserved for the status endpoint"));
        }
        if !is_valid_command(&route.command) {
            errors.push(invalid("command must be non-empty and contain no whitespace"));
        }
        if route.methods.is_empty() {
            errors.push(invalid("at least one method is required"));
        }
        for method in &route.methods {
            let method = method.to_ascii_uppercase();
            if method != "GET" && method != "POST" {
                errors.push(invalid(&format!("unsupported method '{}'", method)));
                continue;
            }
            if !seen.insert((route.path.clone(), method.clone())) {
                errors.push(ValidationError::DuplicateRoute {
                    index,
                    method,
                    path: route.path.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::HostEndpoint;
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.cluster.name = " ".into();
        config.cluster.primary.clear();
        config.cluster.failover = vec![HostEndpoint::new("", 0)];
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.contains(&ValidationError::EmptyClusterName));
        assert!(errors.contains(&ValidationError::NoPrimaryEndpoints));
        assert!(errors.contains(&ValidationError::InvalidBindAddress("nowhere".into())));
    }

    #[test]
    fn test_timeouts_bounded() {
        let mut config = GatewayConfig::default();
        config.cluster.blacklist_timeout_secs = u64::MAX;
        config.cluster.read_timeout_secs = MAX_TIMEOUT_SECS + 1;
        config.cluster.connection_timeout_secs = MAX_TIMEOUT_SECS;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TimeoutTooLarge {
                    field: "read_timeout_secs",
                    max: MAX_TIMEOUT_SECS
                },
                ValidationError::TimeoutTooLarge {
                    field: "blacklist_timeout_secs",
                    max: MAX_TIMEOUT_SECS
                },
            ]
        );
        assert_eq!(
            errors[1].to_string(),
            "cluster.blacklist_timeout_secs must not exceed 604800 seconds"
        );
    }

    #[test]
    fn test_route_checks() {
        let mut config = GatewayConfig::default();
        config.routes = vec![
            RouteConfig::new("api/x", &["GET"], "X"),
            RouteConfig::new("/api/y", &["DELETE"], "Y"),
            RouteConfig::new("/api/z", &["GET"], "Bad Command"),
            RouteConfig::new("/api/hello", &["GET"], "A"),
            RouteConfig::new("/api/hello", &["get"], "B"),
            RouteConfig::new("/api/empty", &[], "E"),
            RouteConfig::new("/api/status", &["GET"], "S"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{:?}", errors);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRoute { index: 4, .. })));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::InvalidEndpoint {
            pool: "cluster.primary",
            index: 2,
            reason: "port must be non-zero",
        };
        assert_eq!(err.to_string(), "cluster.primary[2]: port must be non-zero");
    }
}
