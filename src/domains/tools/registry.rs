//! Tool Registry - maps tool names to handlers.
//!
//! The registry is filled once while the server is built and is read-only
//! afterwards. It owns the capability catalog, so the catalog and the set of
//! callable handlers can never disagree.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::catalog::{CapabilityCatalog, ToolDescriptor};
use super::handlers::ToolHandler;

/// Registry misconfiguration, fatal at server construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' is registered more than once")]
    DuplicateTool(String),
}

/// A registered tool: its descriptor and the handler that executes it.
#[derive(Clone)]
pub struct HandlerEntry {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tool registry - manages all tools of one server.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    catalog: CapabilityCatalog,
    entries: HashMap<String, HandlerEntry>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the name its descriptor declares.
    pub fn register<H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        H: ToolHandler + 'static,
    {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let descriptor = handler.descriptor();
        if self.entries.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }

        debug!("Registering tool: {}", descriptor.name);
        self.catalog.push(descriptor.clone());
        self.entries.insert(
            descriptor.name.clone(),
            HandlerEntry {
                descriptor,
                handler,
            },
        );
        Ok(())
    }

    /// Builder-style registration.
    pub fn with<H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        H: ToolHandler + 'static,
    {
        self.register(handler)?;
        Ok(self)
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(name)
    }

    /// The catalog, in registration order.
    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.catalog.names()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
