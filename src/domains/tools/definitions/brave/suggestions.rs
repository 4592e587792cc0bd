//! Query suggestion tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::KEY_VAR;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct BraveSuggestionsParams {
    /// Partial search query
    #[serde(rename(serialize = "q"))]
    pub query: String,
}

pub struct BraveSuggestionsTool {
    client: UpstreamClient,
}

impl BraveSuggestionsTool {
    pub const NAME: &'static str = "get_suggestions";
    pub const DESCRIPTION: &'static str = "Get search suggestions for a query";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for BraveSuggestionsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<BraveSuggestionsParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: BraveSuggestionsParams = parse_args(arguments)?;
        self.client.require_credential(KEY_VAR)?;
        let suggestions = self.client.get_json("suggest/search", &params).await?;
        Ok(ToolOutput::json(suggestions))
    }
}
