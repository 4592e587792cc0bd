//! Response envelope returned for every invocation.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, ToolError};
use super::handlers::ToolOutput;

/// A single content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Uniform wrapper around a tool outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,

    /// Which error kind produced this envelope; not part of the wire format.
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl ResponseEnvelope {
    pub fn success(output: &ToolOutput) -> Self {
        Self {
            content: vec![ContentBlock::text(output.render())],
            is_error: false,
            error_kind: None,
        }
    }

    pub fn failure(error: &ToolError) -> Self {
        Self {
            content: vec![ContentBlock::text(error.display_text())],
            is_error: true,
            error_kind: Some(error.kind()),
        }
    }

    /// Concatenated text of all blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert to the rmcp result model.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let content = self
            .content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text { text } => Content::text(text),
            })
            .collect();
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}
