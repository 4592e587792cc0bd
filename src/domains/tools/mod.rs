//! Tools domain module.
//!
//! Everything a server needs to advertise tools and run invocations:
//!
//! - `catalog.rs` - Tool descriptors and the advertised catalog
//! - `schema.rs` - Input schemas derived from parameter structs, and the validator
//! - `handlers.rs` - The `ToolHandler` trait implemented by every tool
//! - `registry.rs` - Name to handler mapping, built once per server
//! - `dispatcher.rs` - Resolve, validate, execute, wrap in an envelope
//! - `envelope.rs` - The uniform response envelope
//! - `error.rs` - The five error kinds every failure is folded into
//! - `router.rs` - Builds the registry for the configured toolset
//! - `definitions/` - Tool implementations, one directory per toolset
//!
//! ## Adding a New Tool
//!
//! 1. Implement `ToolHandler` in the toolset's directory under `definitions/`
//! 2. Register it in that toolset's `register` function
//!
//! Transports and the server never need to change.

mod catalog;
pub mod definitions;
mod dispatcher;
mod envelope;
mod error;
mod handlers;
mod registry;
pub mod router;
mod schema;

pub use catalog::{CapabilityCatalog, ToolDescriptor};
pub use dispatcher::{Dispatcher, UnknownToolPolicy};
pub use envelope::{ContentBlock, ResponseEnvelope};
pub use error::{ErrorKind, ToolError, ToolResult};
pub use handlers::{Arguments, InvocationRequest, ToolHandler, ToolOutput, parse_args};
pub use registry::{HandlerEntry, RegistryError, ToolRegistry};
pub use router::build_registry;
pub use schema::{FieldSchema, FieldType, InputSchema};
