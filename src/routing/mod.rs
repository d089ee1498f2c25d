//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (verb, path, query, body)
//!     → router.rs (route lookup)
//!     → Found: command name + merged parameters
//!     → MethodNotAllowed / NotFound: JSON error
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Group by path, then verb
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route

pub mod router;

pub use router::{collect_params, Route, RouteMatch, Router};
