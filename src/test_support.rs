//! Helpers shared by unit tests.

use std::path::Path;

use axum::Router;
use tokio::net::TcpListener;

use crate::core::Config;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub upstream");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Default config with every upstream pointed at `base_url`.
pub fn config_with_upstream(base_url: &str) -> Config {
    let mut config = Config::default();
    config.upstream.github_api_url = base_url.to_string();
    config.upstream.brave_api_url = base_url.to_string();
    config.upstream.vercel_api_url = base_url.to_string();
    config
}

/// Default config whose filesystem tools may only touch `root`.
pub fn config_with_root(root: &Path) -> Config {
    let mut config = Config::default();
    config.security.allowed_dirs = vec![root.to_path_buf()];
    config
}
