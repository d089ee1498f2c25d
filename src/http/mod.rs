//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, gateway handler)
//!     → request.rs (request ID, forwarded to the backend)
//!     → cors.rs (preflight short-circuit, CORS headers)
//!     → [routing decides the command]
//!     → [rpc dispatches to the cluster]
//!     → response.rs (translate reply or failure into status + JSON)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{translate, GatewayResult};
pub use server::HttpServer;
