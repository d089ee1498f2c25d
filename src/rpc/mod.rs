//! Backend RPC subsystem.
//!
//! # Data Flow
//! ```text
//! command + params (from routing)
//!     → types.rs (RpcRequest: validated, cluster defaults applied)
//!     → codec.rs (encode envelope once)
//!     → dispatcher.rs
//!         → cluster::next_candidate()
//!         → connect (connection timeout)
//!         → write + read reply (read timeout)
//!         → on failure: blacklist endpoint, next candidate
//!     → Result<RpcResponse, TransportFailure>
//!     → http::response::translate()
//! ```
//!
//! # Design Decisions
//! - Exactly one reply or one failure per request, never both
//! - No connection reuse between requests
//! - Failures are values, never panics or unhandled errors

pub mod codec;
pub mod dispatcher;
pub mod types;

pub use dispatcher::{DispatchSettings, Dispatcher};
pub use types::{
    DispatchResult, FailureReason, Priority, RequestError, RpcRequest, RpcResponse, TransportFailure,
    WriteConsistency,
};
