//! Pull request tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::{RepoRef, SERVICE};
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolError, ToolHandler, ToolOutput,
    ToolResult, parse_args,
};

/// `owner`/`repo`/`pull_number` triple shared by the single-PR tools.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PullRef {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Pull request number
    #[schemars(range(min = 1))]
    pub pull_number: u64,
}

impl PullRef {
    fn path(&self, rest: &str) -> ToolResult<String> {
        let base = format!("pulls/{}", self.pull_number);
        if rest.is_empty() {
            self.repo.path(&base)
        } else {
            self.repo.path(&format!("{base}/{rest}"))
        }
    }
}

// ============================================================================
// get_pull_request
// ============================================================================

pub struct GetPullRequestTool {
    client: UpstreamClient,
}

impl GetPullRequestTool {
    pub const NAME: &'static str = "get_pull_request";
    pub const DESCRIPTION: &'static str = "Get details of a specific pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPullRequestTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<PullRef>())
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let pull: PullRef = parse_args(arguments)?;
        Ok(ToolOutput::json(self.client.get(&pull.path("")?).await?))
    }
}

// ============================================================================
// list_pull_requests
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPullRequestsParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    #[serde(flatten)]
    pub filter: PullFilter,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct PullFilter {
    /// State of the pull requests to return
    #[schemars(extend("enum" = ["open", "closed", "all"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Filter by head user or head organization and branch name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Filter by base branch name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// What to sort results by
    #[schemars(extend("enum" = ["created", "updated", "popularity", "long-running"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// The direction of the sort
    #[schemars(extend("enum" = ["asc", "desc"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Number of results per page (default: 30, max: 100)
    #[schemars(range(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Page number for pagination (default: 1)
    #[schemars(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

pub struct ListPullRequestsTool {
    client: UpstreamClient,
}

impl ListPullRequestsTool {
    pub const NAME: &'static str = "list_pull_requests";
    pub const DESCRIPTION: &'static str = "List and filter repository pull requests";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ListPullRequestsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ListPullRequestsParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ListPullRequestsParams = parse_args(arguments)?;
        let pulls = self
            .client
            .get_json(&params.repo.path("pulls")?, &params.filter)
            .await?;
        Ok(ToolOutput::json(pulls))
    }
}

// ============================================================================
// create_pull_request
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePullRequestParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    #[serde(flatten)]
    pub body: NewPullRequest,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NewPullRequest {
    /// Pull request title
    pub title: String,
    /// The name of the branch where your changes are implemented
    pub head: String,
    /// The name of the branch you want the changes pulled into
    pub base: String,
    /// Pull request body/description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Whether to create the pull request as a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// Whether maintainers can modify the pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_can_modify: Option<bool>,
}

pub struct CreatePullRequestTool {
    client: UpstreamClient,
}

impl CreatePullRequestTool {
    pub const NAME: &'static str = "create_pull_request";
    pub const DESCRIPTION: &'static str = "Create a new pull request in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreatePullRequestTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreatePullRequestParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreatePullRequestParams = parse_args(arguments)?;
        info!(
            "Opening pull request {} -> {} in {}/{}",
            params.body.head, params.body.base, params.repo.owner, params.repo.repo
        );
        let pull = self
            .client
            .post_json(&params.repo.path("pulls")?, &params.body)
            .await?;
        Ok(ToolOutput::json(pull))
    }
}

// ============================================================================
// merge_pull_request
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergePullRequestParams {
    #[serde(flatten)]
    pub pull: PullRef,
    #[serde(flatten)]
    pub merge: MergeOptions,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MergeOptions {
    /// Title for the automatic commit message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_title: Option<String>,
    /// Extra detail to append to automatic commit message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    /// Merge method to use
    #[schemars(extend("enum" = ["merge", "squash", "rebase"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,
}

pub struct MergePullRequestTool {
    client: UpstreamClient,
}

impl MergePullRequestTool {
    pub const NAME: &'static str = "merge_pull_request";
    pub const DESCRIPTION: &'static str = "Merge a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for MergePullRequestTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<MergePullRequestParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: MergePullRequestParams = parse_args(arguments)?;
        info!("Merging pull request #{}", params.pull.pull_number);
        let merged = self
            .client
            .put_json(&params.pull.path("merge")?, &params.merge)
            .await?;
        Ok(ToolOutput::json(merged))
    }
}

// ============================================================================
// get_pull_request_files / comments / reviews
// ============================================================================

pub struct GetPullRequestFilesTool {
    client: UpstreamClient,
}

impl GetPullRequestFilesTool {
    pub const NAME: &'static str = "get_pull_request_files";
    pub const DESCRIPTION: &'static str = "Get the list of files changed in a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPullRequestFilesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<PullRef>())
    }

    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let pull: PullRef = parse_args(arguments)?;
        Ok(ToolOutput::json(self.client.get(&pull.path("files")?).await?))
    }
}

pub struct GetPullRequestCommentsTool {
    client: UpstreamClient,
}

impl GetPullRequestCommentsTool {
    pub const NAME: &'static str = "get_pull_request_comments";
    pub const DESCRIPTION: &'static str = "Get the review comments on a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPullRequestCommentsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<PullRef>())
    }

    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let pull: PullRef = parse_args(arguments)?;
        Ok(ToolOutput::json(self.client.get(&pull.path("comments")?).await?))
    }
}

pub struct GetPullRequestReviewsTool {
    client: UpstreamClient,
}

impl GetPullRequestReviewsTool {
    pub const NAME: &'static str = "get_pull_request_reviews";
    pub const DESCRIPTION: &'static str = "Get the reviews on a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPullRequestReviewsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<PullRef>())
    }

    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let pull: PullRef = parse_args(arguments)?;
        Ok(ToolOutput::json(self.client.get(&pull.path("reviews")?).await?))
    }
}

// ============================================================================
// get_pull_request_status
// ============================================================================

pub struct GetPullRequestStatusTool {
    client: UpstreamClient,
}

impl GetPullRequestStatusTool {
    pub const NAME: &'static str = "get_pull_request_status";
    pub const DESCRIPTION: &'static str =
        "Get the combined status of all status checks for a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPullRequestStatusTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, InputSchema::for_type::<PullRef>())
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let pull: PullRef = parse_args(arguments)?;
        let details = self.client.get(&pull.path("")?).await?;
        let sha = details
            .pointer("/head/sha")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::upstream(
                    SERVICE,
                    Some(200),
                    "pull request response has no head sha",
                    details.to_string(),
                )
            })?;

        let status = self
            .client
            .get(&pull.repo.path(&format!("commits/{sha}/status"))?)
            .await?;
        Ok(ToolOutput::json(status))
    }
}

// ============================================================================
// update_pull_request_branch
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePullRequestBranchParams {
    #[serde(flatten)]
    pub pull: PullRef,
    /// The expected SHA of the pull request's HEAD ref
    pub expected_head_sha: Option<String>,
}

pub struct UpdatePullRequestBranchTool {
    client: UpstreamClient,
}

impl UpdatePullRequestBranchTool {
    pub const NAME: &'static str = "update_pull_request_branch";
    pub const DESCRIPTION: &'static str =
        "Update a pull request branch with the latest changes from the base branch";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for UpdatePullRequestBranchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<UpdatePullRequestBranchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: UpdatePullRequestBranchParams = parse_args(arguments)?;
        let body = match &params.expected_head_sha {
            Some(sha) => json!({ "expected_head_sha": sha }),
            None => json!({}),
        };
        let updated = self
            .client
            .put_json(&params.pull.path("update-branch")?, &body)
            .await?;
        Ok(ToolOutput::json(updated))
    }
}

// ============================================================================
// create_pull_request_review
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewParams {
    #[serde(flatten)]
    pub pull: PullRef,
    #[serde(flatten)]
    pub review: NewReview,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NewReview {
    /// The body text of the review
    pub body: String,
    /// The review action to perform
    #[schemars(extend("enum" = ["APPROVE", "REQUEST_CHANGES", "COMMENT"]))]
    pub event: String,
    /// The SHA of the commit that needs a review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    /// Comments to post as part of the review (specify either position or line, not both)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<ReviewComment>>,
}

/// A review comment; give either position or line
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReviewComment {
    /// The relative path to the file being commented on
    pub path: String,
    /// The position in the diff where you want to add a review comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// The line number in the file where you want to add a review comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// Text of the review comment
    pub body: String,
}

pub struct CreatePullRequestReviewTool {
    client: UpstreamClient,
}

impl CreatePullRequestReviewTool {
    pub const NAME: &'static str = "create_pull_request_review";
    pub const DESCRIPTION: &'static str = "Create a review on a pull request";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreatePullRequestReviewTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreateReviewParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreateReviewParams = parse_args(arguments)?;
        info!(
            "Submitting {} review on pull request #{}",
            params.review.event, params.pull.pull_number
        );
        let review = self
            .client
            .post_json(&params.pull.path("reviews")?, &params.review)
            .await?;
        Ok(ToolOutput::json(review))
    }
}
