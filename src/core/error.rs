//! Crate-wide error type.
//!
//! Tool failures never reach this type at runtime: the dispatcher turns them
//! into envelopes. What does end up here is fatal at startup (duplicate tool
//! names, missing mandatory credentials, bad configuration) or a transport
//! failure.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A toolset could not be built, e.g. a mandatory credential is missing.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::domains::tools::RegistryError),

    #[error("Path security error: {0}")]
    PathSecurity(#[from] super::security::PathSecurityError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
