//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.

use std::future::Future;

use rmcp::ServiceExt;
use tracing::{info, warn};

use super::{DRAIN_TIMEOUT, TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client hangs up or `shutdown` fires.
    ///
    /// On shutdown the session is cancelled and awaited, so responses that
    /// are already queued still reach stdout.
    pub async fn run<F>(server: McpServer, shutdown: F) -> TransportResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let session = service.cancellation_token();
        let waiting = service.waiting();
        tokio::pin!(waiting);

        tokio::select! {
            result = &mut waiting => {
                result.map_err(|e| TransportError::ServiceError(e.to_string()))?;
                info!("STDIO transport finished");
                return Ok(());
            }
            _ = shutdown => {
                info!("Closing STDIO transport");
                session.cancel();
            }
        }

        match tokio::time::timeout(DRAIN_TIMEOUT, waiting).await {
            Ok(result) => {
                result.map_err(|e| TransportError::ServiceError(e.to_string()))?;
                info!("STDIO session closed");
            }
            Err(_) => warn!("STDIO session still open after {:?}, dropping it", DRAIN_TIMEOUT),
        }
        Ok(())
    }
}
