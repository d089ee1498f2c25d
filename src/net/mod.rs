//! Network layer subsystem.
//!
//! Plain TCP listeners are bound directly by the binary; this module only
//! carries the optional TLS setup for the HTTP front door.

pub mod tls;

pub use tls::load_tls_config;
