//! Write a text file, creating missing parent directories.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use super::io_error;
use crate::core::security::PathGuard;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolError, ToolHandler, ToolOutput, ToolResult,
    parse_args,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path of the file to write
    pub path: String,
    /// Text content to write
    pub content: String,
}

pub struct WriteFileTool {
    guard: Arc<PathGuard>,
}

impl WriteFileTool {
    pub const NAME: &'static str = "write_file";
    pub const DESCRIPTION: &'static str =
        "Write text to a file, creating it (and any parent directories) if needed";

    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for WriteFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<WriteFileParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: WriteFileParams = parse_args(arguments)?;
        let path = self.guard.resolve_for_write(&params.path)?;

        if path.is_dir() {
            return Err(ToolError::invalid_params(format!(
                "'{}' is a directory",
                params.path
            )));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory", parent, e))?;
        }
        tokio::fs::write(&path, params.content.as_bytes())
            .await
            .map_err(|e| io_error("write", &path, e))?;

        info!("Wrote {} bytes to {}", params.content.len(), path.display());
        Ok(ToolOutput::text(format!(
            "Wrote {} bytes to {}",
            params.content.len(),
            params.path
        )))
    }
}
