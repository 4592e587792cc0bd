//! Read a UTF-8 text file.

use std::io;
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
pub struct ReadFileParams {
    /// Path of the file to read
    pub path: String,
}

pub struct ReadFileTool {
    guard: Arc<PathGuard>,
}

impl ReadFileTool {
    pub const NAME: &'static str = "read_file";
    pub const DESCRIPTION: &'static str = "Read the contents of a text file";

    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ReadFileParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ReadFileParams = parse_args(arguments)?;
        let path = self.guard.resolve_existing(&params.path)?;

        if path.is_dir() {
            return Err(ToolError::invalid_params(format!(
                "'{}' is a directory",
                params.path
            )));
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                ToolError::internal(format!("'{}' is not valid UTF-8 text", params.path))
            } else {
                io_error("read", &path, e)
            }
        })?;

        info!("Read {} bytes from {}", content.len(), path.display());
        Ok(ToolOutput::text(content))
    }
}
