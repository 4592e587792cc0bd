//! Vercel toolset.
//!
//! Starts without a token; `list_projects` then fails per call as
//! unauthorized until `VERCEL_API_TOKEN` is set.

pub mod projects;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::upstream::{AuthScheme, UpstreamClient};
use crate::domains::tools::{ToolRegistry, ToolResult};

pub use projects::ListProjectsTool;

pub const SERVICE: &str = "Vercel API";
pub const TOKEN_VAR: &str = "VERCEL_API_TOKEN";

pub fn client(config: &Config) -> ToolResult<UpstreamClient> {
    UpstreamClient::builder(SERVICE, &config.upstream.vercel_api_url)
        .user_agent(&config.upstream.user_agent)
        .timeout(config.upstream.timeout())
        .credential(AuthScheme::Bearer, config.credentials.vercel_token.clone())
        .build()
}

pub fn register(registry: &mut ToolRegistry, config: &Config) -> Result<()> {
    registry.register(ListProjectsTool::new(client(config)?))?;
    Ok(())
}
