//! Tool definitions, one submodule per toolset.
//!
//! Each toolset exposes `register(&mut ToolRegistry, &Config)`, which builds
//! its upstream client (or path guard) once and registers its handlers.

pub mod brave;
pub mod fetch;
pub mod fs;
pub mod github;
pub mod vercel;
