//! Web search tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::KEY_VAR;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

const DEFAULT_COUNT: u32 = 10;
const MAX_COUNT: u32 = 20;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BraveSearchParams {
    /// Search query
    pub query: String,
    /// Number of results to return (max 20)
    #[schemars(range(min = 1, max = 20), extend("default" = 10))]
    pub count: Option<u32>,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    count: u32,
}

pub struct BraveSearchTool {
    client: UpstreamClient,
}

impl BraveSearchTool {
    pub const NAME: &'static str = "search";
    pub const DESCRIPTION: &'static str = "Search the web using Brave Search";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for BraveSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<BraveSearchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: BraveSearchParams = parse_args(arguments)?;
        self.client.require_credential(KEY_VAR)?;

        let count = params.count.unwrap_or(DEFAULT_COUNT).min(MAX_COUNT);
        info!("Brave search for '{}' ({} results)", params.query, count);
        let query = SearchQuery {
            q: &params.query,
            count,
        };
        let results = self.client.get_json("web/search", &query).await?;
        Ok(ToolOutput::json(results))
    }
}
