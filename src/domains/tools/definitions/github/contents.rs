//! File, branch and commit tools.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{RepoRef, SERVICE, encoded_path};
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolError, ToolHandler, ToolOutput, ToolResult,
    parse_args,
};

/// Replace the base64 `content` of a file response with its UTF-8 text.
///
/// Directory listings and binary files are left untouched.
fn decode_file_content(mut data: Value) -> Value {
    if data.get("type").and_then(Value::as_str) != Some("file") {
        return data;
    }
    let Some(encoded) = data.get("content").and_then(Value::as_str) else {
        return data;
    };

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = STANDARD
        .decode(compact)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match decoded {
        Some(text) => {
            data["content"] = Value::String(text);
            data["encoding"] = Value::String("utf-8".to_string());
        }
        None => debug!("File content is not UTF-8 text, keeping base64"),
    }
    data
}

// ============================================================================
// get_file_contents
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFileContentsParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Path to the file or directory
    pub path: String,
    /// Branch to get contents from
    pub branch: Option<String>,
}

#[derive(Serialize)]
struct RefQuery<'a> {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    git_ref: Option<&'a str>,
}

pub struct GetFileContentsTool {
    client: UpstreamClient,
}

impl GetFileContentsTool {
    pub const NAME: &'static str = "get_file_contents";
    pub const DESCRIPTION: &'static str =
        "Get the contents of a file or directory from a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetFileContentsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<GetFileContentsParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: GetFileContentsParams = parse_args(arguments)?;
        let path = params
            .repo
            .path(&format!("contents/{}", encoded_path("path", &params.path)?))?;
        let query = RefQuery {
            git_ref: params.branch.as_deref(),
        };
        let data = self.client.get_json(&path, &query).await?;
        Ok(ToolOutput::json(decode_file_content(data)))
    }
}

// ============================================================================
// create_or_update_file
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrUpdateFileParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Path where to create/update the file
    pub path: String,
    /// Content of the file
    pub content: String,
    /// Commit message
    pub message: String,
    /// Branch to create/update the file in
    pub branch: String,
    /// SHA of the file being replaced (required when updating existing files)
    pub sha: Option<String>,
}

#[derive(Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

pub struct CreateOrUpdateFileTool {
    client: UpstreamClient,
}

impl CreateOrUpdateFileTool {
    pub const NAME: &'static str = "create_or_update_file";
    pub const DESCRIPTION: &'static str = "Create or update a single file in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreateOrUpdateFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreateOrUpdateFileParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreateOrUpdateFileParams = parse_args(arguments)?;
        info!(
            "Writing {} to {}/{}@{}",
            params.path, params.repo.owner, params.repo.repo, params.branch
        );
        let body = PutContentBody {
            message: &params.message,
            content: STANDARD.encode(params.content.as_bytes()),
            branch: &params.branch,
            sha: params.sha.as_deref(),
        };
        let path = params
            .repo
            .path(&format!("contents/{}", encoded_path("path", &params.path)?))?;
        let commit = self.client.put_json(&path, &body).await?;
        Ok(ToolOutput::json(commit))
    }
}

// ============================================================================
// create_branch
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateBranchParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Name for the new branch
    pub branch: String,
    /// Optional: source branch to create from (defaults to the repository's default branch)
    pub from_branch: Option<String>,
}

#[derive(Serialize)]
struct CreateRefBody {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

pub struct CreateBranchTool {
    client: UpstreamClient,
}

impl CreateBranchTool {
    pub const NAME: &'static str = "create_branch";
    pub const DESCRIPTION: &'static str = "Create a new branch in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    async fn default_branch(&self, repo: &RepoRef) -> ToolResult<String> {
        let details = self.client.get(&repo.path("")?).await?;
        details
            .get("default_branch")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ToolError::upstream(
                    SERVICE,
                    Some(200),
                    "repository response has no default_branch",
                    details.to_string(),
                )
            })
    }
}

#[async_trait]
impl ToolHandler for CreateBranchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<CreateBranchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: CreateBranchParams = parse_args(arguments)?;
        let from = match params.from_branch {
            Some(from) => from,
            None => self.default_branch(&params.repo).await?,
        };

        let base = self
            .client
            .get(&params.repo.path(&format!("branches/{}", encoded_path("from_branch", &from)?))?)
            .await?;
        let sha = base
            .pointer("/commit/sha")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::upstream(
                    SERVICE,
                    Some(200),
                    format!("branch '{from}' has no commit sha"),
                    base.to_string(),
                )
            })?;

        info!("Creating branch {} from {} at {}", params.branch, from, sha);
        let body = CreateRefBody {
            git_ref: format!("refs/heads/{}", params.branch),
            sha: sha.to_string(),
        };
        let created = self
            .client
            .post_json(&params.repo.path("git/refs")?, &body)
            .await?;
        Ok(ToolOutput::json(created))
    }
}

// ============================================================================
// list_commits
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCommitsParams {
    #[serde(flatten)]
    pub repo: RepoRef,
    /// Branch name or commit SHA to start from
    pub sha: Option<String>,
    /// Page number for pagination (default: 1)
    #[schemars(range(min = 1))]
    pub page: Option<u32>,
    /// Number of results per page (default: 30, max: 100)
    #[schemars(range(min = 1, max = 100))]
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
struct ListCommitsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u32>,
}

pub struct ListCommitsTool {
    client: UpstreamClient,
}

impl ListCommitsTool {
    pub const NAME: &'static str = "list_commits";
    pub const DESCRIPTION: &'static str = "Get list of commits of a branch in a GitHub repository";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ListCommitsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ListCommitsParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ListCommitsParams = parse_args(arguments)?;
        let query = ListCommitsQuery {
            sha: params.sha.as_deref(),
            page: params.page,
            per_page: params.per_page,
        };
        let commits = self
            .client
            .get_json(&params.repo.path("commits")?, &query)
            .await?;
        Ok(ToolOutput::json(commits))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::Json as JsonBody;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::json;

    use super::super::test_helpers::dispatcher;
    use super::*;
    use crate::domains::tools::{ErrorKind, InvocationRequest};
    use crate::test_support::spawn_stub;

    #[test]
    fn test_decode_file_content() {
        let data = json!({ "type": "file", "content": "aGVsbG8g\nd29ybGQ=\n", "encoding": "base64" });
        let decoded = decode_file_content(data);
        assert_eq!(decoded["content"], "hello world");
        assert_eq!(decoded["encoding"], "utf-8");

        let dir = json!([{ "type": "dir", "name": "src" }]);
        assert_eq!(decode_file_content(dir.clone()), dir);

        let binary = json!({ "type": "file", "content": STANDARD.encode([0xff, 0xfe]) });
        assert_eq!(decode_file_content(binary.clone()), binary);
    }

    #[tokio::test]
    async fn test_get_file_contents_decodes() {
        let router = Router::new().route(
            "/repos/acme/widgets/contents/docs/README.md",
            get(|| async {
                Json(json!({ "type": "file", "path": "docs/README.md", "content": STANDARD.encode("# Widgets") }))
            }),
        );
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "get_file_contents",
                Some(json!({ "owner": "acme", "repo": "widgets", "path": "docs/README.md" })),
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&envelope.text()).unwrap();
        assert_eq!(body["content"], "# Widgets");
    }

    #[tokio::test]
    async fn test_create_or_update_file_encodes_content() {
        let router = Router::new().route(
            "/repos/acme/widgets/contents/notes.txt",
            put(|JsonBody(body): JsonBody<Value>| async move { Json(json!({ "sent": body })) }),
        );
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "create_or_update_file",
                Some(json!({
                    "owner": "acme",
                    "repo": "widgets",
                    "path": "notes.txt",
                    "content": "hi",
                    "message": "add notes",
                    "branch": "main"
                })),
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&envelope.text()).unwrap();
        assert_eq!(body["sent"]["content"], "aGk=");
        assert_eq!(body["sent"]["branch"], "main");
        assert!(body["sent"].get("sha").is_none());
    }

    #[tokio::test]
    async fn test_create_branch_from_default_branch() {
        let created = Arc::new(Mutex::new(None::<Value>));
        let sink = created.clone();
        let router = Router::new()
            .route(
                "/repos/acme/widgets",
                get(|| async { Json(json!({ "default_branch": "trunk" })) }),
            )
            .route(
                "/repos/acme/widgets/branches/trunk",
                get(|| async { Json(json!({ "name": "trunk", "commit": { "sha": "abc123" } })) }),
            )
            .route(
                "/repos/acme/widgets/git/refs",
                post(move |JsonBody(body): JsonBody<Value>| {
                    let sink = sink.clone();
                    async move {
                        *sink.lock().unwrap() = Some(body.clone());
                        Json(json!({ "ref": body["ref"], "object": { "sha": body["sha"] } }))
                    }
                }),
            );
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "create_branch",
                Some(json!({ "owner": "acme", "repo": "widgets", "branch": "feature/x" })),
            ))
            .await
            .unwrap();
        assert!(!envelope.is_error, "{}", envelope.text());
        assert_eq!(
            created.lock().unwrap().clone(),
            Some(json!({ "ref": "refs/heads/feature/x", "sha": "abc123" }))
        );
    }

    #[tokio::test]
    async fn test_create_branch_missing_base_is_upstream_failure() {
        let router = Router::new();
        let base = spawn_stub(router).await;

        let envelope = dispatcher(&base)
            .dispatch(InvocationRequest::from_value(
                "create_branch",
                Some(json!({ "owner": "acme", "repo": "widgets", "branch": "x", "from_branch": "gone" })),
            ))
            .await
            .unwrap();
        assert_eq!(envelope.error_kind, Some(ErrorKind::UpstreamFailure));
        assert!(envelope.text().contains("(404)"));
    }
}
