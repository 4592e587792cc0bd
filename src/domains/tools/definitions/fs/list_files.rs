//! List directory entries, optionally recursing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::io_error;
use crate::core::security::PathGuard;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolError, ToolHandler, ToolOutput, ToolResult,
    parse_args,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Directory to list
    #[serde(default = "default_path")]
    pub path: String,
    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

fn default_path() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

pub struct ListFilesTool {
    guard: Arc<PathGuard>,
}

impl ListFilesTool {
    pub const NAME: &'static str = "list_files";
    pub const DESCRIPTION: &'static str = "List files and directories in a directory";

    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for ListFilesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<ListFilesParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: ListFilesParams = parse_args(arguments)?;
        let root = self.guard.resolve_existing(&params.path)?;
        if !root.is_dir() {
            return Err(ToolError::invalid_params(format!(
                "'{}' is not a directory",
                params.path
            )));
        }

        let entries = collect_entries(&root, params.recursive).await?;
        info!("Listed {} entries under {}", entries.len(), root.display());
        Ok(ToolOutput::json(serde_json::to_value(entries)?))
    }
}

/// Walk `root` breadth-first. Symlinked directories are reported, never
/// followed.
async fn collect_entries(root: &Path, recursive: bool) -> ToolResult<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("read directory", &dir, e))?;

        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_error("read directory", &dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error("inspect", &entry.path(), e))?;
            let entry_type = if file_type.is_symlink() {
                EntryType::Symlink
            } else if file_type.is_dir() {
                EntryType::Directory
            } else {
                EntryType::File
            };

            let path = entry.path();
            if recursive && entry_type == EntryType::Directory {
                pending.push(path.clone());
            }
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: path.to_string_lossy().into_owned(),
                entry_type,
            });
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
