//! Input schemas and the argument validator.
//!
//! A tool's schema is generated from its parameter struct with `schemars`
//! (`#[derive(JsonSchema)]`, doc comments for descriptions, `range` and
//! `extend("enum" = ...)` for constraints) and normalized to the JSON Schema
//! subset MCP clients expect: `type`, `properties`, `required`, `enum`,
//! `minimum`, `maximum`, `default`, `items`. References are inlined and
//! nullable wrappers of `Option` fields are unwrapped.
//!
//! Validation only looks at top-level fields: nested `items`/`properties`
//! are documentation for callers and are not enforced.

use std::collections::BTreeMap;

use rmcp::handler::server::tool::schema_for_type;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ToolError, ToolResult};

/// Nesting followed when inlining `$ref`, `items` and nested properties.
const MAX_DEPTH: usize = 8;

/// Primitive JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// `"integer"` or `["integer", "null"]` both give `Integer`.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Self::parse(name),
            Value::Array(names) => names.iter().filter_map(Value::as_str).find_map(Self::parse),
            _ => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64() || is_integral_float(value),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

fn is_integral_float(value: &Value) -> bool {
    value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Schema of a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// `None` accepts any JSON value.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed values; anything else is rejected.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Default the handler applies when the field is absent (advertised only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Item schema for arrays (advisory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,

    /// Nested properties for objects (advisory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldSchema>>,

    /// Nested required names for objects (advisory).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl FieldSchema {
    fn from_json(value: &Value, definitions: &Map<String, Value>, depth: usize) -> Self {
        match value.as_object() {
            Some(node) => Self::from_node(node, definitions, depth),
            None => Self::default(),
        }
    }

    fn from_node(node: &Map<String, Value>, definitions: &Map<String, Value>, depth: usize) -> Self {
        let node = resolve(node, definitions);
        let mut field = Self::default();
        if depth >= MAX_DEPTH {
            return field;
        }

        let variants: Vec<&Map<String, Value>> = ["anyOf", "oneOf", "allOf"]
            .iter()
            .filter_map(|key| node.get(*key).and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_object)
            .map(|variant| resolve(variant, definitions))
            .filter(|variant| variant.get("type").and_then(Value::as_str) != Some("null"))
            .collect();

        if !variants.is_empty() && variants.iter().all(|v| v.contains_key("const")) {
            field.allowed = Some(variants.iter().filter_map(|v| v.get("const")).cloned().collect());
            field.field_type = variants
                .iter()
                .find_map(|v| v.get("type"))
                .and_then(FieldType::from_json);
        } else if let [single] = variants.as_slice() {
            field = Self::from_node(single, definitions, depth + 1);
        }

        if let Some(field_type) = node.get("type").and_then(FieldType::from_json) {
            field.field_type = Some(field_type);
        }
        if let Some(Value::String(description)) = node.get("description") {
            field.description = Some(description.clone());
        }
        if let Some(Value::Array(values)) = node.get("enum") {
            field.allowed = Some(values.iter().filter(|v| !v.is_null()).cloned().collect());
        }
        if let Some(minimum) = node.get("minimum").and_then(Value::as_f64) {
            field.minimum = Some(minimum);
        }
        if let Some(maximum) = node.get("maximum").and_then(Value::as_f64) {
            field.maximum = Some(maximum);
        }
        if let Some(default) = node.get("default").filter(|d| !d.is_null()) {
            field.default = Some(default.clone());
        }
        if let Some(Value::Object(items)) = node.get("items") {
            field.items = Some(Box::new(Self::from_node(items, definitions, depth + 1)));
        }
        if node.contains_key("properties") {
            let mut properties = BTreeMap::new();
            let mut required = Vec::new();
            collect_object(node, definitions, &mut properties, &mut required, depth + 1);
            field.properties = Some(properties);
            field.required = required;
        }

        field
    }

    fn check(&self, name: &str, value: &Value) -> ToolResult<()> {
        if let Some(field_type) = self.field_type {
            if !field_type.matches(value) {
                return Err(ToolError::invalid_params(format!(
                    "'{name}' must be of type {}",
                    field_type.as_str()
                )));
            }
        }

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                let choices: Vec<String> = allowed.iter().map(render_choice).collect();
                return Err(ToolError::invalid_params(format!(
                    "'{name}' must be one of: {}",
                    choices.join(", ")
                )));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.minimum {
                if n < min {
                    return Err(ToolError::invalid_params(format!(
                        "'{name}' must be >= {min} (got {n})"
                    )));
                }
            }
            if let Some(max) = self.maximum {
                if n > max {
                    return Err(ToolError::invalid_params(format!(
                        "'{name}' must be <= {max} (got {n})"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn render_choice(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Follow a local `$ref` (`#/definitions/X` or `#/$defs/X`).
fn resolve<'a>(
    node: &'a Map<String, Value>,
    definitions: &'a Map<String, Value>,
) -> &'a Map<String, Value> {
    node.get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.rsplit('/').next())
        .and_then(|name| definitions.get(name))
        .and_then(Value::as_object)
        .unwrap_or(node)
}

/// Gather `properties` and `required` of an object schema, including parts
/// merged in through `allOf` (flattened structs).
fn collect_object(
    node: &Map<String, Value>,
    definitions: &Map<String, Value>,
    properties: &mut BTreeMap<String, FieldSchema>,
    required: &mut Vec<String>,
    depth: usize,
) {
    let node = resolve(node, definitions);
    if depth >= MAX_DEPTH {
        return;
    }

    if let Some(Value::Object(fields)) = node.get("properties") {
        for (name, field) in fields {
            properties.insert(name.clone(), FieldSchema::from_json(field, definitions, depth));
        }
    }
    if let Some(Value::Array(names)) = node.get("required") {
        for name in names.iter().filter_map(Value::as_str) {
            if !required.iter().any(|r| r == name) {
                required.push(name.to_string());
            }
        }
    }
    if let Some(Value::Array(parts)) = node.get("allOf") {
        for part in parts.iter().filter_map(Value::as_object) {
            collect_object(part, definitions, properties, required, depth + 1);
        }
    }
}

/// Object schema describing a tool's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(default)]
    pub properties: BTreeMap<String, FieldSchema>,

    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl InputSchema {
    /// An empty object schema (tool takes no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema generated from a parameter struct.
    pub fn for_type<T: JsonSchema + 'static>() -> Self {
        Self::from_json_schema(&schema_for_type::<T>())
    }

    /// Normalize a generated JSON Schema object.
    pub fn from_json_schema(root: &Map<String, Value>) -> Self {
        let no_definitions = Map::new();
        let definitions = root
            .get("definitions")
            .or_else(|| root.get("$defs"))
            .and_then(Value::as_object)
            .unwrap_or(&no_definitions);

        let mut schema = Self::new();
        collect_object(root, definitions, &mut schema.properties, &mut schema.required, 0);
        schema
    }

    /// Validate arguments against this schema.
    ///
    /// Required fields must be present and non-null. Declared fields are
    /// checked for type, enum membership and numeric bounds; null counts as
    /// absent. Unknown fields are accepted.
    pub fn validate(&self, arguments: &Map<String, Value>) -> ToolResult<()> {
        for name in &self.required {
            match arguments.get(name) {
                None | Some(Value::Null) => {
                    return Err(ToolError::invalid_params(format!("'{name}' is required")));
                }
                Some(_) => {}
            }
        }

        for (name, value) in arguments {
            if value.is_null() {
                continue;
            }
            if let Some(field) = self.properties.get(name) {
                field.check(name, value)?;
            }
        }

        Ok(())
    }

    /// JSON object form, as advertised to clients.
    pub fn to_json_object(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct IssueFilter {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
        /// Issue state
        #[schemars(extend("enum" = ["open", "closed", "all"]))]
        state: Option<String>,
        /// Page size
        #[schemars(range(min = 1, max = 100), extend("default" = 30))]
        per_page: Option<u32>,
        #[serde(default)]
        labels: Vec<String>,
    }

    fn issues_schema() -> InputSchema {
        InputSchema::for_type::<IssueFilter>()
    }

    #[test]
    fn test_generated_schema_is_normalized() {
        let schema = issues_schema();
        assert_eq!(schema.required, vec!["owner", "repo"]);

        let state = &schema.properties["state"];
        assert_eq!(state.field_type, Some(FieldType::String));
        assert_eq!(state.allowed, Some(vec![json!("open"), json!("closed"), json!("all")]));
        assert_eq!(state.description.as_deref(), Some("Issue state"));

        let per_page = &schema.properties["per_page"];
        assert_eq!(per_page.field_type, Some(FieldType::Integer));
        assert_eq!(per_page.minimum, Some(1.0));
        assert_eq!(per_page.maximum, Some(100.0));
        assert_eq!(per_page.default, Some(json!(30)));

        let labels = &schema.properties["labels"];
        assert_eq!(labels.field_type, Some(FieldType::Array));
        assert_eq!(
            labels.items.as_ref().and_then(|i| i.field_type),
            Some(FieldType::String)
        );
    }

    #[test]
    fn test_missing_required_field() {
        let err = issues_schema()
            .validate(&args(json!({ "owner": "acme" })))
            .unwrap_err();
        assert_eq!(err, ToolError::invalid_params("'repo' is required"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = issues_schema()
            .validate(&args(json!({ "owner": "acme", "repo": null })))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
        assert!(
            issues_schema()
                .validate(&args(json!({ "owner": "a", "repo": "b", "state": null })))
                .is_ok()
        );
    }

    #[test]
    fn test_enum_rejects_unknown_value() {
        let err = issues_schema()
            .validate(&args(json!({ "owner": "a", "repo": "b", "state": "merged" })))
            .unwrap_err();
        assert!(err.to_string().contains("must be one of: open, closed, all"));
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = issues_schema();
        assert!(
            schema
                .validate(&args(json!({ "owner": "a", "repo": "b", "per_page": 100 })))
                .is_ok()
        );
        let err = schema
            .validate(&args(json!({ "owner": "a", "repo": "b", "per_page": 101 })))
            .unwrap_err();
        assert!(err.to_string().contains("<= 100"));
        let err = schema
            .validate(&args(json!({ "owner": "a", "repo": "b", "per_page": 0 })))
            .unwrap_err();
        assert!(err.to_string().contains(">= 1"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = issues_schema()
            .validate(&args(json!({ "owner": 7, "repo": "b" })))
            .unwrap_err();
        assert_eq!(err, ToolError::invalid_params("'owner' must be of type string"));

        let err = issues_schema()
            .validate(&args(json!({ "owner": "a", "repo": "b", "per_page": 2.5 })))
            .unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_extra_fields_tolerated() {
        let result = issues_schema().validate(&args(json!({
            "owner": "a",
            "repo": "b",
            "something_new": { "nested": true }
        })));
        assert!(result.is_ok());
    }

    #[test]
    fn test_refs_nullables_and_flattened_parts() {
        let root = json!({
            "type": "object",
            "allOf": [{ "$ref": "#/definitions/RepoRef" }],
            "properties": {
                "direction": { "anyOf": [{ "$ref": "#/definitions/Direction" }, { "type": "null" }] },
                "page": { "type": "integer", "nullable": true, "minimum": 1 },
                "sort": { "type": ["string", "null"], "enum": ["created", "updated", null] },
                "mode": { "oneOf": [{ "const": "fast", "type": "string" }, { "const": "safe", "type": "string" }] },
                "body": true
            },
            "definitions": {
                "RepoRef": {
                    "type": "object",
                    "properties": { "owner": { "type": "string" }, "repo": { "type": "string" } },
                    "required": ["owner", "repo"]
                },
                "Direction": { "type": "string", "enum": ["asc", "desc"] }
            }
        });
        let schema = InputSchema::from_json_schema(root.as_object().unwrap());

        assert_eq!(schema.required, vec!["owner", "repo"]);
        assert_eq!(schema.properties["owner"].field_type, Some(FieldType::String));
        assert_eq!(
            schema.properties["direction"].allowed,
            Some(vec![json!("asc"), json!("desc")])
        );
        assert_eq!(schema.properties["page"].field_type, Some(FieldType::Integer));
        assert_eq!(schema.properties["page"].minimum, Some(1.0));
        assert_eq!(
            schema.properties["sort"].allowed,
            Some(vec![json!("created"), json!("updated")])
        );
        assert_eq!(schema.properties["mode"].allowed, Some(vec![json!("fast"), json!("safe")]));
        assert_eq!(schema.properties["body"].field_type, None);

        let ok = args(json!({ "owner": "a", "repo": "b", "body": [1, 2], "mode": "safe" }));
        assert!(schema.validate(&ok).is_ok());
        let bad = args(json!({ "owner": "a", "repo": "b", "direction": "sideways" }));
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn test_nested_items_not_enforced() {
        let root = json!({
            "type": "object",
            "properties": {
                "comments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "path": { "type": "string" }, "body": { "type": "string" } },
                        "required": ["path", "body"]
                    }
                }
            },
            "required": ["comments"]
        });
        let schema = InputSchema::from_json_schema(root.as_object().unwrap());
        let items = schema.properties["comments"].items.as_ref().unwrap();
        assert_eq!(items.required, vec!["path", "body"]);

        // Items missing their nested required fields still pass.
        assert!(schema.validate(&args(json!({ "comments": [{}] }))).is_ok());
        // The top-level type is still checked.
        assert!(schema.validate(&args(json!({ "comments": "x" }))).is_err());
    }

    #[test]
    fn test_schema_serializes_as_json_schema() {
        let value = serde_json::to_value(issues_schema()).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["owner", "repo"]));
        assert_eq!(value["properties"]["state"]["type"], "string");
        assert_eq!(value["properties"]["state"]["enum"], json!(["open", "closed", "all"]));
        assert_eq!(value["properties"]["per_page"]["maximum"], json!(100.0));
        assert!(value["properties"]["owner"].get("enum").is_none());
        assert!(value["properties"].get("$ref").is_none());
    }
}
