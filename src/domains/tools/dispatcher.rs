//! Dispatcher - resolves, validates and executes one invocation.
//!
//! Each invocation goes `Idle -> Validating -> Executing -> Responding`.
//! The dispatcher keeps no state between invocations, so a shared
//! `Arc<Dispatcher>` can serve concurrent calls without locking.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info, instrument, warn};

use super::catalog::CapabilityCatalog;
use super::envelope::ResponseEnvelope;
use super::error::ToolError;
use super::handlers::InvocationRequest;
use super::registry::ToolRegistry;

/// How an invocation of an unregistered tool is surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownToolPolicy {
    /// Return an `isError` envelope like any other failure.
    #[default]
    Envelope,
    /// Raise a protocol-level fault (JSON-RPC -32601).
    Fault,
}

impl UnknownToolPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "envelope" => Some(Self::Envelope),
            "fault" => Some(Self::Fault),
            _ => None,
        }
    }
}

/// Phase of an invocation, recorded on the dispatch span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Validating,
    Executing,
    Responding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Executing => "executing",
            Self::Responding => "responding",
        })
    }
}

fn enter(phase: Phase) {
    Span::current().record("phase", tracing::field::display(phase));
}

/// Central tool dispatcher.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    unknown_tool_policy: UnknownToolPolicy,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, unknown_tool_policy: UnknownToolPolicy) -> Self {
        Self {
            registry: Arc::new(registry),
            unknown_tool_policy,
        }
    }

    /// The advertised catalog. Same value on every call.
    pub fn list_tools(&self) -> &CapabilityCatalog {
        self.registry.catalog()
    }

    pub fn unknown_tool_policy(&self) -> UnknownToolPolicy {
        self.unknown_tool_policy
    }

    /// Dispatch one invocation.
    ///
    /// Always yields an envelope, except for an unknown tool under
    /// [`UnknownToolPolicy::Fault`], which yields `Err(MethodNotFound)` for
    /// the transport to raise as a protocol fault.
    #[instrument(skip_all, fields(tool = %request.tool_name, phase = %Phase::Idle))]
    pub async fn dispatch(&self, request: InvocationRequest) -> Result<ResponseEnvelope, ToolError> {
        let started = Instant::now();
        let InvocationRequest {
            tool_name,
            arguments,
        } = request;

        let Some(entry) = self.registry.resolve(&tool_name) else {
            warn!("Unknown tool requested: {}", tool_name);
            let error = ToolError::method_not_found(tool_name);
            return match self.unknown_tool_policy {
                UnknownToolPolicy::Envelope => Ok(ResponseEnvelope::failure(&error)),
                UnknownToolPolicy::Fault => Err(error),
            };
        };

        enter(Phase::Validating);
        if let Err(error) = entry.descriptor.input_schema.validate(&arguments) {
            warn!("Rejected arguments for {}: {}", tool_name, error);
            return Ok(ResponseEnvelope::failure(&error));
        }

        enter(Phase::Executing);
        debug!("Executing tool {}", tool_name);
        let outcome = AssertUnwindSafe(entry.handler.call(arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::internal(panic_message(panic.as_ref()))));

        enter(Phase::Responding);
        let elapsed_ms = started.elapsed().as_millis();
        let envelope = match outcome {
            Ok(output) => {
                info!("Tool {} succeeded in {} ms", tool_name, elapsed_ms);
                ResponseEnvelope::success(&output)
            }
            Err(error) => {
                warn!(
                    kind = %error.kind(),
                    "Tool {} failed in {} ms: {}", tool_name, elapsed_ms, error
                );
                ResponseEnvelope::failure(&error)
            }
        };
        Ok(envelope)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("tool handler panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::domains::tools::catalog::ToolDescriptor;
    use crate::domains::tools::error::{ErrorKind, ToolResult};
    use crate::domains::tools::handlers::{Arguments, ToolHandler, ToolOutput};
    use crate::domains::tools::schema::InputSchema;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    #[allow(dead_code)]
    struct SearchParams {
        /// Search query
        query: String,
        /// Results
        #[schemars(range(min = 1, max = 20))]
        count: Option<u32>,
    }

    /// Counts calls and answers according to `mode`.
    struct Recorder {
        calls: Arc<AtomicUsize>,
        mode: &'static str,
    }

    #[async_trait::async_trait]
    impl ToolHandler for Recorder {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new(
                "search",
                "Search",
                InputSchema::for_type::<SearchParams>(),
            )
        }

        async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                "upstream" => Err(ToolError::upstream(
                    "Brave Search API",
                    Some(503),
                    "Service Unavailable",
                    "{\"message\":\"Service Unavailable\"}",
                )),
                "panic" => panic!("handler exploded"),
                _ => Ok(ToolOutput::json(json!({ "echo": arguments["query"] }))),
            }
        }
    }

    fn dispatcher(mode: &'static str, policy: UnknownToolPolicy) -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ToolRegistry::new()
            .with(Recorder {
                calls: calls.clone(),
                mode,
            })
            .unwrap();
        (Dispatcher::new(registry, policy), calls)
    }

    fn request(name: &str, args: serde_json::Value) -> InvocationRequest {
        InvocationRequest::from_value(name, Some(args))
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let envelope = dispatcher
            .dispatch(request("search", json!({ "query": "rust" })))
            .await
            .unwrap();
        assert!(!envelope.is_error);
        assert_eq!(envelope.content.len(), 1);
        assert!(envelope.text().contains("\"echo\": \"rust\""));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_required_never_calls_handler() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let envelope = dispatcher.dispatch(request("search", json!({}))).await.unwrap();
        assert!(envelope.is_error);
        assert_eq!(envelope.error_kind, Some(ErrorKind::InvalidParams));
        assert!(envelope.text().contains("'query' is required"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_never_calls_handler() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let envelope = dispatcher
            .dispatch(request("search", json!({ "query": "x", "count": 50 })))
            .await
            .unwrap();
        assert_eq!(envelope.error_kind, Some(ErrorKind::InvalidParams));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_envelope_policy() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let envelope = dispatcher.dispatch(request("unknown_tool", json!({}))).await.unwrap();
        assert!(envelope.is_error);
        assert_eq!(envelope.error_kind, Some(ErrorKind::MethodNotFound));
        assert_eq!(envelope.text(), "Unknown tool: unknown_tool");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_fault_policy() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Fault);
        let err = dispatcher
            .dispatch(request("unknown_tool", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::method_not_found("unknown_tool"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_preserved() {
        let (dispatcher, _) = dispatcher("upstream", UnknownToolPolicy::Envelope);
        let envelope = dispatcher
            .dispatch(request("search", json!({ "query": "rust" })))
            .await
            .unwrap();
        assert_eq!(envelope.error_kind, Some(ErrorKind::UpstreamFailure));
        let text = envelope.text();
        assert!(text.contains("(503)"));
        assert!(text.contains("{\"message\":\"Service Unavailable\"}"));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let (dispatcher, _) = dispatcher("panic", UnknownToolPolicy::Envelope);
        let envelope = dispatcher
            .dispatch(request("search", json!({ "query": "rust" })))
            .await
            .unwrap();
        assert_eq!(envelope.error_kind, Some(ErrorKind::InternalError));
        assert!(envelope.text().contains("handler exploded"));
    }

    #[tokio::test]
    async fn test_concurrent_dispatch() {
        let (dispatcher, calls) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let dispatcher = Arc::new(dispatcher);
        let calls_futures = (0..8).map(|i| {
            let dispatcher = dispatcher.clone();
            async move {
                dispatcher
                    .dispatch(request("search", json!({ "query": format!("q{i}") })))
                    .await
            }
        });
        let results = futures::future::join_all(calls_futures).await;
        assert!(results.iter().all(|r| matches!(r, Ok(e) if !e.is_error)));
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_list_tools_is_stable() {
        let (dispatcher, _) = dispatcher("ok", UnknownToolPolicy::Envelope);
        let first = serde_json::to_string(&dispatcher.list_tools().to_json()).unwrap();
        let second = serde_json::to_string(&dispatcher.list_tools().to_json()).unwrap();
        assert_eq!(first, second);
        assert_eq!(dispatcher.list_tools().names(), vec!["search"]);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(UnknownToolPolicy::parse("FAULT"), Some(UnknownToolPolicy::Fault));
        assert_eq!(UnknownToolPolicy::parse("envelope"), Some(UnknownToolPolicy::Envelope));
        assert_eq!(UnknownToolPolicy::parse("raise"), None);
    }
}
