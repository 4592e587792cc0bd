//! Brave Search toolset.
//!
//! The API key is optional at startup; calls made without it are rejected
//! as unauthorized before anything is sent.

pub mod search;
pub mod suggestions;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::upstream::{AuthScheme, UpstreamClient};
use crate::domains::tools::{ToolRegistry, ToolResult};

pub use search::BraveSearchTool;
pub use suggestions::BraveSuggestionsTool;

pub const SERVICE: &str = "Brave Search API";
pub const KEY_VAR: &str = "BRAVE_SEARCH_API_KEY";

pub fn client(config: &Config) -> ToolResult<UpstreamClient> {
    UpstreamClient::builder(SERVICE, &config.upstream.brave_api_url)
        .user_agent(&config.upstream.user_agent)
        .timeout(config.upstream.timeout())
        .credential(
            AuthScheme::Header("X-Subscription-Token"),
            config.credentials.brave_api_key.clone(),
        )
        .build()
}

pub fn register(registry: &mut ToolRegistry, config: &Config) -> Result<()> {
    let client = client(config)?;
    registry.register(BraveSearchTool::new(client.clone()))?;
    registry.register(BraveSuggestionsTool::new(client))?;
    Ok(())
}
