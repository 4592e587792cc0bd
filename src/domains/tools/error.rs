//! Tool-specific error types.
//!
//! Every failure a handler can produce is one of five kinds. The dispatcher
//! converts them into error envelopes at a single boundary, so handlers never
//! format their own error responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type returned by tool handlers and the schema validator.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while dispatching or executing a tool.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// A required credential is missing or was rejected before any upstream call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller supplied malformed or missing arguments.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The caller named a tool this server does not expose.
    #[error("Unknown tool: {0}")]
    MethodNotFound(String),

    /// The upstream API rejected or could not service the call.
    #[error("{}", upstream_summary(.service, .status, .message))]
    UpstreamFailure {
        /// Human label of the upstream service ("GitHub API", "Brave Search API", ...).
        service: String,
        /// HTTP status, absent for connection errors and timeouts.
        status: Option<u16>,
        /// Short message extracted from the upstream payload.
        message: String,
        /// Raw upstream body, verbatim.
        body: String,
    },

    /// Unexpected failure inside a handler.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn upstream_summary(service: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{service} error ({code}): {message}"),
        None => format!("{service} error: {message}"),
    }
}

impl ToolError {
    /// Create a new "unauthorized" error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new "invalid params" error.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Create a new "method not found" error for the given tool name.
    pub fn method_not_found(name: impl Into<String>) -> Self {
        Self::MethodNotFound(name.into())
    }

    /// Create a new upstream failure.
    pub fn upstream(
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::UpstreamFailure {
            service: service.into(),
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The kind of this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidParams(_) => ErrorKind::InvalidParams,
            Self::MethodNotFound(_) => ErrorKind::MethodNotFound,
            Self::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Upstream HTTP status, when this is an upstream failure that carried one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// Human-readable text shown to callers in an error envelope.
    ///
    /// Upstream failures append the raw upstream body so callers can see
    /// exactly what the remote API answered.
    pub fn display_text(&self) -> String {
        match self {
            Self::UpstreamFailure { body, .. } if !body.trim().is_empty() => {
                format!("{self}\n\nUpstream response:\n{body}")
            }
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("I/O error: {err}"))
    }
}

/// The five error kinds, used for logging and protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    InvalidParams,
    MethodNotFound,
    UpstreamFailure,
    InternalError,
}

impl ErrorKind {
    /// JSON-RPC style error code for this kind.
    pub fn code(self) -> i32 {
        match self {
            Self::InvalidParams => -32602,
            Self::MethodNotFound => -32601,
            Self::InternalError => -32603,
            Self::Unauthorized => -32001,
            Self::UpstreamFailure => -32002,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidParams => "invalid_params",
            Self::MethodNotFound => "method_not_found",
            Self::UpstreamFailure => "upstream_failure",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_embeds_status() {
        let err = ToolError::upstream("GitHub API", Some(404), "Not Found", r#"{"message":"Not Found"}"#);
        assert_eq!(err.to_string(), "GitHub API error (404): Not Found");
        assert_eq!(err.upstream_status(), Some(404));
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }

    #[test]
    fn test_upstream_without_status() {
        let err = ToolError::upstream("Fetch", None, "request timed out after 50 ms", "");
        assert_eq!(err.to_string(), "Fetch error: request timed out after 50 ms");
        assert_eq!(err.display_text(), err.to_string());
    }

    #[test]
    fn test_display_text_includes_raw_body() {
        let err = ToolError::upstream("Vercel API", Some(403), "Forbidden", "{\"error\":{}}");
        let text = err.display_text();
        assert!(text.contains("(403)"));
        assert!(text.ends_with("{\"error\":{}}"));
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ToolError::invalid_params("x").kind().code(), -32602);
        assert_eq!(ToolError::method_not_found("x").kind().code(), -32601);
        assert_eq!(ToolError::internal("x").kind().code(), -32603);
        assert_eq!(ToolError::unauthorized("x").kind().as_str(), "unauthorized");
    }
}
