//! Tool handler trait and handler-facing types.
//!
//! A handler receives arguments that already passed schema validation,
//! performs one unit of work and returns either a [`ToolOutput`] or one of
//! the [`ToolError`] kinds. It never builds response envelopes itself.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::catalog::ToolDescriptor;
use super::error::{ToolError, ToolResult};

/// Arguments of one invocation, keyed by field name.
pub type Arguments = Map<String, Value>;

/// One tool invocation as delivered by a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: Arguments,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Build a request from a loosely typed `arguments` value.
    ///
    /// `null` or a missing value means "no arguments"; any other non-object
    /// is kept as an empty map and left for the validator to reject.
    pub fn from_value(tool_name: impl Into<String>, arguments: Option<Value>) -> Self {
        let arguments = match arguments {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::new(tool_name, arguments)
    }
}

/// Successful result of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text, returned verbatim.
    Text(String),
    /// Structured data, pretty-printed for display.
    Json(Value),
    /// A summary line followed by pretty-printed data.
    Summary { summary: String, data: Value },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn json(value: Value) -> Self {
        Self::Json(value)
    }

    pub fn summary(summary: impl Into<String>, data: Value) -> Self {
        Self::Summary {
            summary: summary.into(),
            data,
        }
    }

    /// Render as the text shown to callers.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => pretty(value),
            Self::Summary { summary, data } => format!("{summary}\n\n{}", pretty(data)),
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Deserialize validated arguments into a handler's parameter struct.
///
/// Failures become `InvalidParams`, so a handler can rely on typed fields
/// without re-checking them.
pub fn parse_args<T: DeserializeOwned>(arguments: Arguments) -> ToolResult<T> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_params(e.to_string()))
}

/// Trait implemented by every tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Catalog entry for this tool.
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with validated arguments.
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        owner: String,
        #[serde(default)]
        per_page: Option<u32>,
    }

    #[test]
    fn test_parse_args() {
        let args = json!({ "owner": "acme", "per_page": 5, "extra": true });
        let params: Params = parse_args(args.as_object().cloned().unwrap()).unwrap();
        assert_eq!(params.owner, "acme");
        assert_eq!(params.per_page, Some(5));
    }

    #[test]
    fn test_parse_args_type_error_is_invalid_params() {
        let args = json!({ "owner": "acme", "per_page": -3 });
        let err = parse_args::<Params>(args.as_object().cloned().unwrap()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
    }

    #[test]
    fn test_render_outputs() {
        assert_eq!(ToolOutput::text("hi").render(), "hi");
        assert_eq!(
            ToolOutput::json(json!({ "id": 42 })).render(),
            "{\n  \"id\": 42\n}"
        );
        let summary = ToolOutput::summary("Found 1 issue", json!([1])).render();
        assert!(summary.starts_with("Found 1 issue\n\n["));
    }

    #[test]
    fn test_invocation_from_value() {
        let req = InvocationRequest::from_value("search", None);
        assert!(req.arguments.is_empty());
        let req = InvocationRequest::from_value("search", Some(json!({ "query": "rust" })));
        assert_eq!(req.arguments["query"], "rust");
    }
}
