//! Domains module containing business logic organized by bounded contexts.
//!
//! The servers only expose tools, so `tools` is the single domain.

pub mod tools;
