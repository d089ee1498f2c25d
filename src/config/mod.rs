//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --config flag / BEDROCK_GATEWAY_CONFIG / built-in defaults
//!     → loader.rs (read & deserialize TOML)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → cluster section handed to the Dispatcher, routes to the Router
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never changes afterwards
//! - `[cluster]` name and primary list are required; everything else defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, resolve_config, ConfigError};
pub use schema::{ClusterConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, RouteConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
