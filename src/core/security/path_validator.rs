use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::core::config::SecurityConfig;
use crate::domains::tools::ToolError;

const MAX_SYMLINK_HOPS: usize = 40;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Access denied: '{path}' is outside the allowed directories")]
    OutsideAllowedDirectories { path: PathBuf },

    #[error("Access denied: '{path}' resolves outside the allowed directories")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Access denied: '{path}' is a symlink and symlinks are disabled")]
    SymlinkNotAllowed { path: PathBuf },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

impl PathSecurityError {
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::OutsideAllowedDirectories { .. }
                | Self::SymlinkOutsideRoot { .. }
                | Self::SymlinkNotAllowed { .. }
        )
    }
}

/// Denials are the caller's fault; anything else is an I/O failure.
impl From<PathSecurityError> for ToolError {
    fn from(error: PathSecurityError) -> Self {
        if error.is_denial() {
            ToolError::invalid_params(error.to_string())
        } else {
            ToolError::internal(error.to_string())
        }
    }
}

/// Confines filesystem tools to a set of base directories.
///
/// Every request is first checked on the lexically normalized path, without
/// touching the filesystem. Only paths that pass are then resolved on disk
/// and checked again, which catches symlinks pointing out of bounds.
#[derive(Debug, Clone)]
pub struct PathGuard {
    roots: Vec<PathBuf>,
    canonical_roots: Vec<PathBuf>,
    allow_symlinks: bool,
}

impl PathGuard {
    /// Build the guard for the configured directories, or the working
    /// directory when none are configured.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, PathSecurityError> {
        let cwd = std::env::current_dir().map_err(|error| PathSecurityError::IoError {
            path: PathBuf::from("."),
            error,
        })?;

        let dirs = if config.allowed_dirs.is_empty() {
            vec![cwd.clone()]
        } else {
            config.allowed_dirs.clone()
        };

        let roots: Vec<PathBuf> = dirs.iter().map(|dir| normalize(&cwd.join(dir))).collect();
        let canonical_roots = roots
            .iter()
            .map(|root| match root.canonicalize() {
                Ok(canonical) => canonical,
                Err(e) => {
                    warn!("Allowed directory {} cannot be resolved: {}", root.display(), e);
                    root.clone()
                }
            })
            .collect();

        Ok(Self {
            roots,
            canonical_roots,
            allow_symlinks: config.allow_symlinks,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lexical check only. Relative paths are taken relative to the first
    /// allowed directory.
    pub fn check(&self, input: &str) -> Result<PathBuf, PathSecurityError> {
        let requested = Path::new(input);
        let absolute = if requested.is_absolute() {
            normalize(requested)
        } else {
            normalize(&self.roots[0].join(requested))
        };

        if self.roots.iter().any(|root| absolute.starts_with(root)) {
            Ok(absolute)
        } else {
            debug!("Rejected path outside allowed directories: {}", input);
            Err(PathSecurityError::OutsideAllowedDirectories {
                path: PathBuf::from(input),
            })
        }
    }

    /// Validate a path that must already exist and return its canonical form.
    pub fn resolve_existing(&self, input: &str) -> Result<PathBuf, PathSecurityError> {
        let lexical = self.check(input)?;
        self.reject_symlink(&lexical)?;

        let canonical = lexical.canonicalize().map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                PathSecurityError::PathNotFound {
                    path: lexical.clone(),
                }
            } else {
                PathSecurityError::IoError {
                    path: lexical.clone(),
                    error,
                }
            }
        })?;

        self.ensure_inside(&canonical, &lexical)?;
        Ok(canonical)
    }

    /// Validate a path that may not exist yet and return where a write will
    /// land. Symlinks along the way, dangling ones included, are followed and
    /// the final target must stay inside an allowed directory.
    pub fn resolve_for_write(&self, input: &str) -> Result<PathBuf, PathSecurityError> {
        let lexical = self.check(input)?;
        self.reject_symlink(&lexical)?;

        let target = resolve_links(&lexical)?;
        self.ensure_inside(&target, &lexical)?;
        Ok(target)
    }

    fn reject_symlink(&self, path: &Path) -> Result<(), PathSecurityError> {
        if self.allow_symlinks {
            return Ok(());
        }
        match path.symlink_metadata() {
            Ok(meta) if meta.file_type().is_symlink() => Err(PathSecurityError::SymlinkNotAllowed {
                path: path.to_path_buf(),
            }),
            _ => Ok(()),
        }
    }

    fn ensure_inside(&self, canonical: &Path, requested: &Path) -> Result<(), PathSecurityError> {
        if self
            .canonical_roots
            .iter()
            .any(|root| canonical.starts_with(root))
        {
            Ok(())
        } else {
            Err(PathSecurityError::SymlinkOutsideRoot {
                path: requested.to_path_buf(),
            })
        }
    }
}

/// Follow symlinks in `path` even when the final target does not exist.
///
/// The longest existing prefix is canonicalized. When that prefix is a
/// dangling symlink its target is read and the walk starts over from there.
fn resolve_links(path: &Path) -> Result<PathBuf, PathSecurityError> {
    let io_error = |path: &Path, error: io::Error| PathSecurityError::IoError {
        path: path.to_path_buf(),
        error,
    };

    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        let mut existing = current.as_path();
        while existing.symlink_metadata().is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return Ok(current),
            }
        }
        let rest = current
            .strip_prefix(existing)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match existing.canonicalize() {
            Ok(canonical) => return Ok(canonical.join(rest)),
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                return Err(io_error(existing, error));
            }
            Err(_) => {}
        }

        let link = std::fs::read_link(existing).map_err(|e| io_error(existing, e))?;
        let base = existing
            .parent()
            .map(|parent| parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf()))
            .unwrap_or_default();
        debug!("Following dangling symlink {} -> {}", existing.display(), link.display());
        current = normalize(&base.join(link)).join(rest);
    }

    Err(io_error(
        path,
        io::Error::other("too many levels of symbolic links"),
    ))
}

/// Resolve `.` and `..` without consulting the filesystem. `..` never climbs
/// above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn guard(roots: &[&Path], allow_symlinks: bool) -> PathGuard {
        PathGuard::from_config(&SecurityConfig {
            allowed_dirs: roots.iter().map(|r| r.to_path_buf()).collect(),
            allow_symlinks,
        })
        .unwrap()
    }

    #[test]
    fn test_normalize_is_lexical() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_path_within_root() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("test.txt");
        fs::write(&test_file, "test").unwrap();

        let guard = guard(&[temp_dir.path()], true);
        assert!(guard.resolve_existing(test_file.to_str().unwrap()).is_ok());
        assert!(guard.resolve_existing("test.txt").is_ok());
    }

    #[test]
    fn test_any_allowed_root_accepted() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let file = second.path().join("data.txt");
        fs::write(&file, "x").unwrap();

        let guard = guard(&[first.path(), second.path()], true);
        assert!(guard.resolve_existing(file.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_outside_path_denied_without_touching_disk() {
        let root_dir = TempDir::new().unwrap();
        let guard = guard(&[root_dir.path()], true);

        // Does not exist: a filesystem lookup would have reported not-found.
        let err = guard.resolve_existing("/definitely/not/here/secret.txt").unwrap_err();
        assert!(matches!(err, PathSecurityError::OutsideAllowedDirectories { .. }));
        assert_eq!(ToolError::from(err).kind(), ErrorKind::InvalidParams);
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp_dir.path().join("test.txt"), "test").unwrap();

        let guard = guard(&[subdir.as_path()], true);
        let traversal = subdir.join("../test.txt");
        let err = guard.resolve_existing(traversal.to_str().unwrap()).unwrap_err();
        assert!(err.is_denial());
        assert!(guard.check("../test.txt").is_err());
    }

    #[test]
    fn test_prefix_sibling_is_not_inside() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        let sibling = temp_dir.path().join("data-private");
        let guard = guard(&[root.as_path()], true);
        assert!(guard.check(sibling.join("x").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_nonexistent_path_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let guard = guard(&[temp_dir.path()], true);
        let err = guard.resolve_existing("does_not_exist.txt").unwrap_err();
        assert!(matches!(err, PathSecurityError::PathNotFound { .. }));
        assert_eq!(ToolError::from(err).kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_write_target_may_not_exist() {
        let temp_dir = TempDir::new().unwrap();
        let guard = guard(&[temp_dir.path()], true);
        let target = guard.resolve_for_write("new/nested/file.txt").unwrap();
        assert!(target.ends_with("new/nested/file.txt"));
        assert!(guard.resolve_for_write("../escape.txt").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let guard = guard(&[temp_dir.path()], true);
        assert!(guard.resolve_existing(link_file.to_str().unwrap()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let target_file = outside_dir.path().join("target.txt");
        let link_file = root_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let guard = guard(&[root_dir.path()], true);
        let err = guard.resolve_existing(link_file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PathSecurityError::SymlinkOutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_write_target_is_followed() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let guard = guard(&[root_dir.path()], true);

        symlink(outside_dir.path().join("new.txt"), root_dir.path().join("out.txt")).unwrap();
        let err = guard.resolve_for_write("out.txt").unwrap_err();
        assert!(matches!(err, PathSecurityError::SymlinkOutsideRoot { .. }));

        symlink(outside_dir.path().join("missing"), root_dir.path().join("dir")).unwrap();
        assert!(guard.resolve_for_write("dir/file.txt").unwrap_err().is_denial());

        symlink("inner/new.txt", root_dir.path().join("in.txt")).unwrap();
        let target = guard.resolve_for_write("in.txt").unwrap();
        assert!(target.ends_with("inner/new.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_disallowed_by_config() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let guard = guard(&[temp_dir.path()], false);
        let err = guard.resolve_existing(link_file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PathSecurityError::SymlinkNotAllowed { .. }));
    }
}
