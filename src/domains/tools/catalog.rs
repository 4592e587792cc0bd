//! Capability catalog - the tools a server advertises.

use serde::{Deserialize, Serialize};

use super::schema::InputSchema;

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, input_schema: InputSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Convert to the rmcp tool model.
    pub fn to_tool(&self) -> rmcp::model::Tool {
        rmcp::model::Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: std::sync::Arc::new(self.input_schema.to_json_object()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Ordered, name-unique list of tool descriptors.
///
/// Only the registry can append to a catalog; once the server is built the
/// catalog is shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCatalog {
    tools: Vec<ToolDescriptor>,
}

impl CapabilityCatalog {
    pub(super) fn push(&mut self, descriptor: ToolDescriptor) {
        self.tools.push(descriptor);
    }

    /// Descriptors in declaration order.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON form used by `tools/list` (`[{name, description, inputSchema}]`).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.tools).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
    }
}
