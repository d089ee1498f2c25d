//! Backend cluster membership subsystem.
//!
//! # Data Flow
//! ```text
//! [cluster] config (primary + failover lists)
//!     → resolver.rs (HostPool: primary then failover, deduplicated)
//!     → next_candidate() consults blacklist.rs
//!     → Return: endpoint to try, or None (no candidates left)
//!
//! Dispatcher observes a connect/read failure:
//!     → blacklist.rs records endpoint with expiry = now + blacklist timeout
//!     → later selections skip it until the expiry passes
//! ```
//!
//! # Design Decisions
//! - Blacklist is owned by the dispatcher and shared by clone, never global
//! - Expiry is lazy: stale entries are ignored on read, dropped on write
//! - Races between requests can only cause a redundant connection attempt

pub mod blacklist;
pub mod endpoint;
pub mod resolver;

pub use blacklist::Blacklist;
pub use endpoint::HostEndpoint;
pub use resolver::{next_candidate, HostPool};
