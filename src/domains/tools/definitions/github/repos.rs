//! Repository tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::RepoRef;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

// ============================================================================
// search_repositories
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRepositoriesParams {
    /// Search query (see GitHub search syntax)
    pub query: String,
    /// Page number for pagination (default: 1)
    #[schemars(range(min = 1))]
    pub page: Option<u32>,
    /// Number of results per page (default: 30, max: 100)
    #[schemars(range(min = 1, max = 100))]
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u32>,
}

pub struct SearchRepositoriesTool {
    client: UpstreamClient,
}

impl SearchRepositoriesTool {
    pub const NAME: &'static str = "search_repositories";
    pub const DESCRIPTION: &'static str = "Search for GitHub repositories";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchRepositoriesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<SearchRepositoriesParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: SearchRepositoriesParams = parse_args(arguments)?;
        info!("Searching repositories: {}", params.query);
        let query = SearchQuery {
            q: &params.query,
            page: params.page,
            per_page: params.per_page,
        };
        let results = self.client.get_json("search/repositories", &query).await?;
        Ok(ToolOutput::json(results))
    }
}

// ============================================================================
// get_repository
// ============================================================================

pub struct GetRepositoryTool {
    client: UpstreamClient,
}

impl GetRepositoryTool {
    pub const NAME: &'static str = "get_repository";
    pub const DESCRIPTION: &'static str =
        "Get details of a GitHub repository, including its default branch";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetRepositoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<RepoRef>())
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let repo: RepoRef = parse_args(arguments)?;
        let details = self.client.get(&repo.path("")?).await?;
        Ok(ToolOutput::json(details))
    }
}

// ============================================================================
// create_repository
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRepositoryParams {
    /// Repository name
    pub name: String,
    /// Repository description
    pub description: Option<String>,
    /// Whether the repository should be private
    pub private: Option<bool>,
    /// Initialize with README.md
    #[serde(rename = "autoInit")]
    pub auto_init: Option<bool>,
}

#[derive(Serialize)]
struct CreateRepositoryBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_init: Option<bool>,
}

pub struct CreateRepositoryTool {
    client: UpstreamClient,
}

impl CreateRepositoryTool {
    pub const NAME: &'static str = "create_repository";
    pub const DESCRIPTION: &'static str = "Create a new GitHub repository in your account";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreateRepositoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreateRepositoryParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreateRepositoryParams = parse_args(arguments)?;
        info!("Creating repository {}", params.name);
        let body = CreateRepositoryBody {
            name: &params.name,
            description: params.description.as_deref(),
            private: params.private,
            auto_init: params.auto_init,
        };
        let repo = self.client.post_json("user/repos", &body).await?;
        Ok(ToolOutput::json(repo))
    }
}

// ============================================================================
// fork_repository
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ForkRepositoryParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Optional: organization to fork to (defaults to your personal account)
    pub organization: Option<String>,
}

#[derive(Serialize)]
struct ForkBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<&'a str>,
}

pub struct ForkRepositoryTool {
    client: UpstreamClient,
}

impl ForkRepositoryTool {
    pub const NAME: &'static str = "fork_repository";
    pub const DESCRIPTION: &'static str =
        "Fork a GitHub repository to your account or specified organization";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ForkRepositoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ForkRepositoryParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ForkRepositoryParams = parse_args(arguments)?;
        info!("Forking {}/{}", params.repo.owner, params.repo.repo);
        let body = ForkBody {
            organization: params.organization.as_deref(),
        };
        let fork = self.client.post_json(&params.repo.path("forks")?, &body).await?;
        Ok(ToolOutput::json(fork))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::super::test_helpers::dispatcher;
    use crate::domains::tools::{ErrorKind, InvocationRequest};
    use crate::test_support::spawn_stub;

    #[tokio::test]
    async fn test_search_repositories_maps_query_names() {
        let router = Router::new().route(
            "/search/repositories",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                Json(json!({ "total_count": 1, "query": query }))
            }),
        );
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "search_repositories",
                Some(json!({ "query": "language:rust mcp", "perPage": 10 })),
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&envelope.text()).unwrap();
        assert_eq!(body["query"]["q"], "language:rust mcp");
        assert_eq!(body["query"]["per_page"], "10");
        assert!(body["query"].get("page").is_none());
    }

    #[tokio::test]
    async fn test_search_repositories_per_page_bounds() {
        let envelope = dispatcher("http://127.0.0.1:9")
            .dispatch(InvocationRequest::from_value(
                "search_repositories",
                Some(json!({ "query": "x", "perPage": 500 })),
            ))
            .await
            .unwrap();
        assert_eq!(envelope.error_kind, Some(ErrorKind::InvalidParams));
    }

    #[tokio::test]
    async fn test_get_repository() {
        let router = Router::new().route(
            "/repos/acme/widgets",
            get(|| async { Json(json!({ "full_name": "acme/widgets", "default_branch": "trunk" })) }),
        );
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "get_repository",
                Some(json!({ "owner": "acme", "repo": "widgets" })),
            ))
            .await
            .unwrap();
        assert!(!envelope.is_error);
        assert!(envelope.text().contains("\"default_branch\": \"trunk\""));
    }
}
