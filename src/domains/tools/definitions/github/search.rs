//! Code, issue and user search.
//!
//! The three endpoints take the same query shape and differ only in the
//! path and the allowed `sort` values.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

/// Fields every search endpoint accepts.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchQuery {
    /// Search query (see GitHub search syntax)
    pub q: String,
    /// Sort order
    #[schemars(extend("enum" = ["asc", "desc"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Number of results per page (default: 30, max: 100)
    #[schemars(range(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Page number for pagination (default: 1)
    #[schemars(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct IssueSearchParams {
    #[serde(flatten)]
    pub query: SearchQuery,
    /// What to sort results by
    #[schemars(extend("enum" = [
        "comments",
        "reactions",
        "reactions-+1",
        "reactions--1",
        "reactions-smile",
        "reactions-thinking_face",
        "reactions-heart",
        "reactions-tada",
        "interactions",
        "created",
        "updated"
    ]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UserSearchParams {
    #[serde(flatten)]
    pub query: SearchQuery,
    /// What to sort results by
    #[schemars(extend("enum" = ["followers", "repositories", "joined"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

async fn run_search<P: Serialize>(
    client: &UpstreamClient,
    endpoint: &str,
    q: &str,
    params: &P,
) -> ToolResult<ToolOutput> {
    info!("GitHub {} search: {}", endpoint, q);
    let results = client.get_json(&format!("search/{endpoint}"), params).await?;
    Ok(ToolOutput::json(results))
}

pub struct SearchCodeTool {
    client: UpstreamClient,
}

impl SearchCodeTool {
    pub const NAME: &'static str = "search_code";
    pub const DESCRIPTION: &'static str = "Search for code across GitHub repositories";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchCodeTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<SearchQuery>())
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: SearchQuery = parse_args(arguments)?;
        run_search(&self.client, "code", &params.q, &params).await
    }
}

pub struct SearchIssuesTool {
    client: UpstreamClient,
}

impl SearchIssuesTool {
    pub const NAME: &'static str = "search_issues";
    pub const DESCRIPTION: &'static str =
        "Search for issues and pull requests across GitHub repositories";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchIssuesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<IssueSearchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: IssueSearchParams = parse_args(arguments)?;
        run_search(&self.client, "issues", &params.query.q, &params).await
    }
}

pub struct SearchUsersTool {
    client: UpstreamClient,
}

impl SearchUsersTool {
    pub const NAME: &'static str = "search_users";
    pub const DESCRIPTION: &'static str = "Search for users on GitHub";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchUsersTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<UserSearchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: UserSearchParams = parse_args(arguments)?;
        run_search(&self.client, "users", &params.query.q, &params).await
    }
}
