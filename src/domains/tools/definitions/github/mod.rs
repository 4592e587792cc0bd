//! GitHub toolset.
//!
//! Every tool needs the personal access token, so a missing token stops the
//! server at construction instead of failing each call.

pub mod contents;
pub mod issues;
pub mod pulls;
pub mod repos;
pub mod search;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::upstream::{AuthScheme, UpstreamClient};
use crate::domains::tools::{ToolError, ToolRegistry, ToolResult};

pub use contents::{CreateBranchTool, CreateOrUpdateFileTool, GetFileContentsTool, ListCommitsTool};
pub use issues::{AddIssueCommentTool, CreateIssueTool, GetIssueTool, ListIssuesTool, UpdateIssueTool};
pub use pulls::{
    CreatePullRequestReviewTool, CreatePullRequestTool, GetPullRequestCommentsTool,
    GetPullRequestFilesTool, GetPullRequestReviewsTool, GetPullRequestStatusTool,
    GetPullRequestTool, ListPullRequestsTool, MergePullRequestTool, UpdatePullRequestBranchTool,
};
pub use repos::{CreateRepositoryTool, ForkRepositoryTool, GetRepositoryTool, SearchRepositoriesTool};
pub use search::{SearchCodeTool, SearchIssuesTool, SearchUsersTool};

pub const SERVICE: &str = "GitHub API";
pub const TOKEN_VAR: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

/// Build the GitHub client. Fails with `Unauthorized` when no token is set.
pub fn client(config: &Config) -> ToolResult<UpstreamClient> {
    let token = config.credentials.github_token.clone().ok_or_else(|| {
        ToolError::unauthorized(format!("{TOKEN_VAR} environment variable is required"))
    })?;

    UpstreamClient::builder(SERVICE, &config.upstream.github_api_url)
        .accept("application/vnd.github.v3+json")
        .user_agent(&config.upstream.user_agent)
        .timeout(config.upstream.timeout())
        .credential(AuthScheme::Token, Some(token))
        .build()
}

/// Register every GitHub tool, in catalog order.
pub fn register(registry: &mut ToolRegistry, config: &Config) -> Result<()> {
    let client = client(config)?;

    registry.register(SearchRepositoriesTool::new(client.clone()))?;
    registry.register(GetRepositoryTool::new(client.clone()))?;
    registry.register(CreateRepositoryTool::new(client.clone()))?;
    registry.register(ForkRepositoryTool::new(client.clone()))?;

    registry.register(GetFileContentsTool::new(client.clone()))?;
    registry.register(CreateOrUpdateFileTool::new(client.clone()))?;
    registry.register(CreateBranchTool::new(client.clone()))?;
    registry.register(ListCommitsTool::new(client.clone()))?;

    registry.register(GetIssueTool::new(client.clone()))?;
    registry.register(ListIssuesTool::new(client.clone()))?;
    registry.register(CreateIssueTool::new(client.clone()))?;
    registry.register(UpdateIssueTool::new(client.clone()))?;
    registry.register(AddIssueCommentTool::new(client.clone()))?;

    registry.register(GetPullRequestTool::new(client.clone()))?;
    registry.register(ListPullRequestsTool::new(client.clone()))?;
    registry.register(CreatePullRequestTool::new(client.clone()))?;
    registry.register(MergePullRequestTool::new(client.clone()))?;
    registry.register(GetPullRequestFilesTool::new(client.clone()))?;
    registry.register(GetPullRequestStatusTool::new(client.clone()))?;
    registry.register(UpdatePullRequestBranchTool::new(client.clone()))?;
    registry.register(GetPullRequestCommentsTool::new(client.clone()))?;
    registry.register(GetPullRequestReviewsTool::new(client.clone()))?;
    registry.register(CreatePullRequestReviewTool::new(client.clone()))?;

    registry.register(SearchCodeTool::new(client.clone()))?;
    registry.register(SearchIssuesTool::new(client.clone()))?;
    registry.register(SearchUsersTool::new(client))?;

    Ok(())
}

/// `owner`/`repo` pair shared by the repository-scoped tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RepoRef {
    /// Repository owner (username or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoRef {
    /// API path under `/repos/{owner}/{repo}`.
    ///
    /// `owner` and `repo` are encoded as single segments; `rest` is taken
    /// as already encoded.
    pub fn path(&self, rest: &str) -> ToolResult<String> {
        let owner = path_segment("owner", &self.owner)?;
        let repo = path_segment("repo", &self.repo)?;
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            Ok(format!("repos/{owner}/{repo}"))
        } else {
            Ok(format!("repos/{owner}/{repo}/{rest}"))
        }
    }
}

/// Percent-encode one URL path segment.
///
/// Empty and dot segments are refused: URL normalization would turn them
/// into references to other API paths, encoded or not.
pub(crate) fn path_segment(field: &str, value: &str) -> ToolResult<String> {
    if matches!(value, "" | "." | "..") {
        return Err(ToolError::invalid_params(format!(
            "'{field}' is not a valid path segment: '{value}'"
        )));
    }

    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    Ok(encoded)
}

/// Encode a slash separated path (file paths, branch names) segment by
/// segment. Leading, trailing and repeated slashes are dropped.
pub(crate) fn encoded_path(field: &str, value: &str) -> ToolResult<String> {
    let segments = value
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| path_segment(field, segment))
        .collect::<ToolResult<Vec<_>>>()?;
    Ok(segments.join("/"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ErrorKind;

    #[test]
    fn test_missing_token_is_unauthorized() {
        let err = client(&Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.to_string().contains(TOKEN_VAR));
    }

    #[test]
    fn test_repo_path() {
        let repo = RepoRef {
            owner: "acme".into(),
            repo: "widgets".into(),
        };
        assert_eq!(repo.path("").unwrap(), "repos/acme/widgets");
        assert_eq!(repo.path("/issues/42").unwrap(), "repos/acme/widgets/issues/42");
    }

    #[test]
    fn test_repo_path_encodes_segments() {
        let repo = RepoRef {
            owner: "acme/../../user".into(),
            repo: "widgets?x=1".into(),
        };
        assert_eq!(
            repo.path("").unwrap(),
            "repos/acme%2F..%2F..%2Fuser/widgets%3Fx%3D1"
        );

        let dotted = RepoRef {
            owner: "..".into(),
            repo: "widgets".into(),
        };
        let err = dotted.path("issues").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert!(err.to_string().contains("'owner'"));
    }

    #[test]
    fn test_encoded_path() {
        assert_eq!(encoded_path("path", "/docs/My File.md").unwrap(), "docs/My%20File.md");
        assert_eq!(encoded_path("branch", "feature/x").unwrap(), "feature/x");
        assert!(encoded_path("path", "docs/../../../user").is_err());
    }
}
