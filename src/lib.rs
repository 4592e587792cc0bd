//! Tool dispatch server library.
//!
//! Each process serves one toolset (GitHub, Brave Search, fetch, filesystem
//! or Vercel) over MCP. Tools share one dispatch path: resolve the tool,
//! validate arguments against its schema, run the handler, wrap the outcome
//! in a response envelope.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the upstream HTTP client, the
//!   filesystem path guard, the server and its transports
//! - **domains::tools**: catalog, schema validation, handler trait, registry,
//!   dispatcher, envelopes and the tool definitions themselves
//!
//! # Example
//!
//! ```rust,no_run
//! use tool_dispatch_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
