//! Transports that carry invocations to the server.
//!
//! | Feature | Transport | Wire format |
//! |---------|-----------|-------------|
//! | `stdio` (default) | stdin/stdout, one rmcp session | line-delimited JSON-RPC |
//! | `tcp` | one rmcp session per connection | line-delimited JSON-RPC |
//! | `http` | axum server, stateless | JSON-RPC in POST bodies |
//!
//! All three hand tool calls to the server's dispatcher and stop once the
//! shutdown future they were given resolves. Open sessions are then closed
//! and get [`DRAIN_TIMEOUT`] to finish before they are dropped.

use std::time::Duration;

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::{TransportService, shutdown_signal};

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

/// How long open sessions get to close after shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(feature = "http")]
pub use config::HttpConfig;
