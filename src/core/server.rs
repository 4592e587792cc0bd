//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the configuration and the [`Dispatcher`] built for the
//! configured toolset. Every transport goes through it: the rmcp-based
//! transports (stdio, tcp) via the `ServerHandler` impl below, the HTTP
//! transport via [`McpServer::list_tools`] and [`McpServer::call_tool`].
//!
//! Constructing a server has no side effects beyond building HTTP clients:
//! no signal handlers, no global state. Shutdown is owned by the transport.

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::config::{Config, Toolset};
use super::error::Result;
use crate::domains::tools::{
    Dispatcher, InvocationRequest, ResponseEnvelope, ToolError, build_registry,
};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    /// Build the server for `config.toolset`.
    ///
    /// Fails when the toolset cannot be constructed, e.g. the GitHub toolset
    /// without a token.
    pub fn new(config: Config) -> Result<Self> {
        let registry = build_registry(&config)?;
        let dispatcher = Dispatcher::new(registry, config.dispatch.unknown_tool_policy);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Wrap an already built dispatcher.
    pub fn with_dispatcher(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn toolset(&self) -> Toolset {
        self.config.toolset
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Text sent to clients on initialize.
    pub fn instructions(&self) -> String {
        format!(
            "{} tool server ({} tools). Call tools/list for the catalog.",
            self.config.toolset,
            self.dispatcher.list_tools().len()
        )
    }

    /// Catalog as `tools/list` JSON (for HTTP transport).
    pub fn list_tools(&self) -> Value {
        self.dispatcher.list_tools().to_json()
    }

    /// Dispatch one call (for HTTP transport).
    ///
    /// `Err` only for an unknown tool under the `fault` policy.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> std::result::Result<ResponseEnvelope, ToolError> {
        self.dispatcher
            .dispatch(InvocationRequest::from_value(name, arguments))
            .await
    }

    /// Dispatch one call unless `cancelled` resolves first.
    ///
    /// A cancelled call drops the dispatch future, abandoning any upstream
    /// request, and resolves to a "request cancelled" error. rmcp still
    /// writes that reply; clients ignore replies to requests they cancelled.
    pub async fn call_tool_until<C>(
        &self,
        invocation: InvocationRequest,
        cancelled: C,
    ) -> std::result::Result<CallToolResult, McpError>
    where
        C: Future<Output = ()>,
    {
        let name = invocation.tool_name.clone();
        tokio::select! {
            outcome = self.dispatcher.dispatch(invocation) => match outcome {
                Ok(envelope) => Ok(envelope.into_call_tool_result()),
                Err(error) => Err(fault(error)),
            },
            _ = cancelled => {
                warn!("Call to {} cancelled by client", name);
                Err(McpError::new(ErrorCode::INTERNAL_ERROR, "request cancelled", None))
            }
        }
    }
}

fn fault(error: ToolError) -> McpError {
    McpError::new(ErrorCode(error.kind().code()), error.to_string(), None)
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing {} tools", self.dispatcher.list_tools().len());
        let tools = self
            .dispatcher
            .list_tools()
            .tools()
            .iter()
            .map(|descriptor| descriptor.to_tool())
            .collect();
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let invocation = InvocationRequest::new(
            request.name.to_string(),
            request.arguments.unwrap_or_default(),
        );
        self.call_tool_until(invocation, context.ct.cancelled()).await
    }
}
