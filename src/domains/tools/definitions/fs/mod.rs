//! Filesystem toolset, confined to the configured base directories.
//!
//! Every path goes through [`PathGuard`] before the filesystem is touched.

pub mod list_files;
pub mod read_file;
pub mod write_file;

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::security::PathGuard;
use crate::domains::tools::{ToolError, ToolRegistry};

pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

pub fn register(registry: &mut ToolRegistry, config: &Config) -> Result<()> {
    let guard = Arc::new(PathGuard::from_config(&config.security)?);
    for root in guard.roots() {
        tracing::info!("Filesystem access allowed under {}", root.display());
    }
    registry.register(ReadFileTool::new(guard.clone()))?;
    registry.register(WriteFileTool::new(guard.clone()))?;
    registry.register(ListFilesTool::new(guard))?;
    Ok(())
}

fn io_error(action: &str, path: &Path, error: io::Error) -> ToolError {
    tracing::warn!("Failed to {} {}: {}", action, path.display(), error);
    ToolError::internal(format!("Failed to {action} '{}': {error}", path.display()))
}
