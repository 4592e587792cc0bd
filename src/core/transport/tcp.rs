//! TCP transport implementation.
//!
//! Raw TCP socket transport with JSON-RPC messages (line-delimited). Each
//! accepted connection gets its own rmcp session sharing one dispatcher.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::{DRAIN_TIMEOUT, TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Accept connections until `shutdown` fires, then close every session.
    pub async fn run<F>(self, server: McpServer, shutdown: F) -> TransportResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        info!("Accepted connection from {}", peer_addr);
                        reap_finished(&mut connections);

                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                        }

                        connections.spawn(Self::handle_connection(
                            server.clone(),
                            stream,
                            peer_addr,
                            stop_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        // Avoid spinning on persistent errors
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        info!("Closing {} TCP session(s)", connections.len());
        let _ = stop_tx.send(true);
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("Sessions still open after {:?}, aborting", DRAIN_TIMEOUT);
            connections.abort_all();
        }
        Ok(())
    }

    /// Serve one connection until the client leaves or shutdown is signalled.
    async fn handle_connection(
        server: McpServer,
        stream: TcpStream,
        peer_addr: SocketAddr,
        mut stop: watch::Receiver<bool>,
    ) {
        let service = match server.serve(stream).await {
            Ok(s) => {
                info!("Client {} connected, serving...", peer_addr);
                s
            }
            Err(e) => {
                warn!("Failed to initialize service for {}: {}", peer_addr, e);
                return;
            }
        };

        let session = service.cancellation_token();
        let waiting = service.waiting();
        tokio::pin!(waiting);

        tokio::select! {
            result = &mut waiting => {
                match result {
                    Ok(_) => info!("Client {} disconnected cleanly", peer_addr),
                    Err(e) => warn!("Error while serving client {}: {}", peer_addr, e),
                }
                return;
            }
            _ = stop.wait_for(|stopped| *stopped) => {
                info!("Closing session for {}", peer_addr);
                session.cancel();
            }
        }

        // Bounded by the drain timeout in `run`, which aborts this task.
        if let Err(e) = waiting.await {
            warn!("Session for {} ended with error: {}", peer_addr, e);
        }
    }
}

/// Drop connection tasks that already finished, logging panics.
fn reap_finished(connections: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = connections.try_join_next() {
        if let Err(e) = joined {
            if e.is_panic() {
                warn!("Connection task panicked: {}", e);
            }
        }
        reaped += 1;
    }
    reaped
}
