// Path confinement for filesystem tools.
//
// Filesystem operations are restricted to the configured base directories,
// preventing path traversal and symlink escapes.

pub mod path_validator;

pub use path_validator::{PathGuard, PathSecurityError};
