//! Project listing.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::TOKEN_VAR;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListProjectsParams {
    /// Maximum number of projects to return
    #[schemars(range(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

pub struct ListProjectsTool {
    client: UpstreamClient,
}

impl ListProjectsTool {
    pub const NAME: &'static str = "list_projects";
    pub const DESCRIPTION: &'static str = "List Vercel projects for the authenticated user";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ListProjectsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ListProjectsParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ListProjectsParams = parse_args(arguments)?;
        self.client.require_credential(TOKEN_VAR)?;

        let projects = self.client.get_json("v9/projects", &params).await?;
        let count = projects
            .get("projects")
            .and_then(|p| p.as_array())
            .map_or(0, Vec::len);
        info!("Listed {} Vercel projects", count);
        Ok(ToolOutput::json(projects))
    }
}
