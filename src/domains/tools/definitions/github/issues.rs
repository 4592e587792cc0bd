//! Issue tools.

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
// get_issue
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetIssueParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Issue number
    #[schemars(range(min = 1))]
    pub issue_number: u64,
}

pub struct GetIssueTool {
    client: UpstreamClient,
}

impl GetIssueTool {
    pub const NAME: &'static str = "get_issue";
    pub const DESCRIPTION: &'static str = "Get details of a specific issue in a GitHub repository.";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetIssueTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<GetIssueParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: GetIssueParams = parse_args(arguments)?;
        info!(
            "Fetching issue {}/{}#{}",
            params.repo.owner, params.repo.repo, params.issue_number
        );
        let issue = self
            .client
            .get(&params.repo.path(&format!("issues/{}", params.issue_number))?)
            .await?;
        Ok(ToolOutput::json(issue))
    }
}

// ============================================================================
// list_issues
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListIssuesParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Issue state
    #[schemars(extend("enum" = ["open", "closed", "all"]))]
    pub state: Option<String>,
    /// Only issues carrying all of these labels
    pub labels: Option<Vec<String>>,
    /// What to sort results by
    #[schemars(extend("enum" = ["created", "updated", "comments"]))]
    pub sort: Option<String>,
    /// The direction of the sort
    #[schemars(extend("enum" = ["asc", "desc"]))]
    pub direction: Option<String>,
    /// Only issues updated at or after this ISO 8601 timestamp
    pub since: Option<String>,
    /// Page number for pagination (default: 1)
    #[schemars(range(min = 1))]
    pub page: Option<u32>,
    /// Number of results per page (default: 30, max: 100)
    #[schemars(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ListIssuesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u32>,
}

pub struct ListIssuesTool {
    client: UpstreamClient,
}

impl ListIssuesTool {
    pub const NAME: &'static str = "list_issues";
    pub const DESCRIPTION: &'static str = "List issues in a GitHub repository with filtering options";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ListIssuesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ListIssuesParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ListIssuesParams = parse_args(arguments)?;
        let query = ListIssuesQuery {
            state: params.state,
            labels: params.labels.map(|labels| labels.join(",")),
            sort: params.sort,
            direction: params.direction,
            since: params.since,
            page: params.page,
            per_page: params.per_page,
        };
        let issues = self
            .client
            .get_json(&params.repo.path("issues")?, &query)
            .await?;
        Ok(ToolOutput::json(issues))
    }
}

// ============================================================================
// create_issue
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NewIssue {
    /// Issue title
    pub title: String,
    /// Issue body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Logins to assign
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Milestone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Labels to apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    #[serde(flatten)]
    pub fields: NewIssue,
}

pub struct CreateIssueTool {
    client: UpstreamClient,
}

impl CreateIssueTool {
    pub const NAME: &'static str = "create_issue";
    pub const DESCRIPTION: &'static str = "Create a new issue in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreateIssueTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreateIssueParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreateIssueParams = parse_args(arguments)?;
        info!("Creating issue in {}/{}", params.repo.owner, params.repo.repo);
        let issue = self
            .client
            .post_json(&params.repo.path("issues")?, &params.fields)
            .await?;
        Ok(ToolOutput::json(issue))
    }
}

// ============================================================================
// update_issue
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct IssueChanges {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Logins to assign
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Milestone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Labels to apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// New state
    #[schemars(extend("enum" = ["open", "closed"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateIssueParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Issue number
    #[schemars(range(min = 1))]
    pub issue_number: u64,
    #[serde(flatten)]
    pub fields: IssueChanges,
}

pub struct UpdateIssueTool {
    client: UpstreamClient,
}

impl UpdateIssueTool {
    pub const NAME: &'static str = "update_issue";
    pub const DESCRIPTION: &'static str = "Update an existing issue in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for UpdateIssueTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<UpdateIssueParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: UpdateIssueParams = parse_args(arguments)?;
        let issue = self
            .client
            .patch_json(
                &params.repo.path(&format!("issues/{}", params.issue_number))?,
                &params.fields,
            )
            .await?;
        Ok(ToolOutput::json(issue))
    }
}

// ============================================================================
// add_issue_comment
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddIssueCommentParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Issue number
    #[schemars(range(min = 1))]
    pub issue_number: u64,
    /// Comment text
    pub body: String,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

pub struct AddIssueCommentTool {
    client: UpstreamClient,
}

impl AddIssueCommentTool {
    pub const NAME: &'static str = "add_issue_comment";
    pub const DESCRIPTION: &'static str = "Add a comment to an existing issue";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for AddIssueCommentTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<AddIssueCommentParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: AddIssueCommentParams = parse_args(arguments)?;
        let comment = self
            .client
            .post_json(
                &params
                    .repo
                    .path(&format!("issues/{}/comments", params.issue_number))?,
                &CommentBody { body: &params.body },
            )
            .await?;
        Ok(ToolOutput::json(comment))
    }
}
