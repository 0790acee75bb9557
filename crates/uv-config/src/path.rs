//! Sandboxed path resolution
//!
//! Provides [`PathResolver`], which joins untrusted identifiers (network
//! names, upgrade ids, config names) onto the deployments root and
//! guarantees the result stays inside it.
//!
//! Every entry point uses the same discipline:
//! 1. reject identifiers that are empty or contain a separator or NUL
//! 2. normalize `.` and `..` lexically and reject escapes
//! 3. canonicalize the longest existing ancestor (resolving symlinks),
//!    re-append the missing remainder, and require the result to be the
//!    canonical root or a component-wise descendant of it

use crate::error::PathError;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Check a single caller-supplied path segment
///
/// # Errors
/// Returns `InvalidIdentifier` for empty segments and segments containing
/// `/`, `\` or NUL
pub fn validate_identifier(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::invalid_identifier(segment, "must not be empty"));
    }
    if segment.contains(['/', '\\']) {
        return Err(PathError::invalid_identifier(
            segment,
            "contains a path separator",
        ));
    }
    if segment.contains('\0') {
        return Err(PathError::invalid_identifier(segment, "contains a NUL byte"));
    }
    Ok(())
}

/// Resolver anchored at a canonical root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver, canonicalizing the root once
    ///
    /// # Errors
    /// Returns `RootUnavailable` if the root does not exist or is not a
    /// directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathError> {
        let path = root.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|source| PathError::RootUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(PathError::RootUnavailable {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        Ok(Self { root: canonical })
    }

    /// Canonical root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve segments under the root
    ///
    /// The target does not need to exist; its existing ancestors are still
    /// canonicalized so a symlinked directory cannot lead outside the root.
    ///
    /// # Errors
    /// - `InvalidIdentifier` for malformed segments
    /// - `PathTraversal` if the result is not the root or inside it, or if a
    ///   dangling symlink sits on the path
    /// - `Unresolvable` if the filesystem refuses a lookup
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<PathBuf, PathError> {
        let requested = display_request(segments);

        for segment in segments {
            validate_identifier(segment.as_ref())?;
        }

        let lexical = self.normalize(segments, &requested)?;

        let canonical = canonicalize_existing_prefix(&lexical).map_err(|e| match e {
            PrefixError::DanglingSymlink => PathError::traversal(requested.clone()),
            PrefixError::Io(source) => PathError::Unresolvable {
                requested: requested.clone(),
                source,
            },
        })?;

        if !canonical.starts_with(&self.root) {
            tracing::warn!(requested = %requested, "rejected path outside deployments root");
            return Err(PathError::traversal(requested));
        }

        tracing::trace!(requested = %requested, "resolved path");
        Ok(canonical)
    }

    /// Path relative to the root, for messages that must not reveal the
    /// absolute layout
    #[must_use]
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn normalize<S: AsRef<str>>(
        &self,
        segments: &[S],
        requested: &str,
    ) -> Result<PathBuf, PathError> {
        let mut parts: Vec<&str> = Vec::with_capacity(segments.len());

        for segment in segments {
            match segment.as_ref() {
                "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Err(PathError::traversal(requested));
                    }
                }
                other => parts.push(other),
            }
        }

        let mut path = self.root.clone();
        path.extend(parts);

        // A segment like "C:" could still parse as a prefix on some platforms
        if path
            .components()
            .skip(self.root.components().count())
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(PathError::traversal(requested));
        }

        Ok(path)
    }
}

fn display_request<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

enum PrefixError {
    DanglingSymlink,
    Io(io::Error),
}

/// Canonicalize the longest existing ancestor and re-append the rest
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, PrefixError> {
    let mut existing = path.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match std::fs::canonicalize(&existing) {
            Ok(mut canonical) => {
                canonical.extend(missing.iter().rev());
                return Ok(canonical);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if std::fs::symlink_metadata(&existing).is_ok() {
                    return Err(PrefixError::DanglingSymlink);
                }
                let name = existing
                    .file_name()
                    .ok_or_else(|| PrefixError::Io(e))?
                    .to_os_string();
                missing.push(name);
                existing.pop();
            }
            Err(e) => return Err(PrefixError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("mainnet/2024-01-upgrade/validations")).unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        (dir, resolver)
    }

    #[test]
    fn resolves_existing_directory() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve(&["mainnet", "2024-01-upgrade"]).unwrap();
        assert!(path.starts_with(resolver.root()));
        assert!(path.ends_with("mainnet/2024-01-upgrade"));
    }

    #[test]
    fn resolves_missing_file_under_existing_dir() {
        let (_dir, resolver) = setup();
        let path = resolver
            .resolve(&["mainnet", "2024-01-upgrade", "validations", "nope.json"])
            .unwrap();
        assert!(path.starts_with(resolver.root()));
        assert!(!path.exists());
    }

    #[test]
    fn resolves_root_itself() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve(&["mainnet", ".."]).unwrap();
        assert_eq!(path, resolver.root());
    }

    #[test]
    fn rejects_parent_escape() {
        let (_dir, resolver) = setup();
        let err = resolver.resolve(&["..", "etc"]).unwrap_err();
        assert!(matches!(err, PathError::PathTraversal { .. }));

        let err = resolver.resolve(&["mainnet", "..", "..", "x"]).unwrap_err();
        assert!(matches!(err, PathError::PathTraversal { .. }));
    }

    #[test]
    fn rejects_separators_before_resolution() {
        let (_dir, resolver) = setup();
        for bad in ["../etc", "a/b", "a\\b", "/etc", ""] {
            let err = resolver.resolve(&[bad]).unwrap_err();
            assert!(
                matches!(err, PathError::InvalidIdentifier { .. }),
                "expected InvalidIdentifier for {bad:?}"
            );
        }
    }

    #[test]
    fn traversal_error_hides_root() {
        let (dir, resolver) = setup();
        let err = resolver.resolve(&["..", "secret"]).unwrap_err();
        let root = dir.path().to_string_lossy().to_string();
        assert!(!err.to_string().contains(&root));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_out_of_root() {
        let (dir, resolver) = setup();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("task.json"), "{}").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("mainnet/escape")).unwrap();

        let err = resolver.resolve(&["mainnet", "escape", "task.json"]).unwrap_err();
        assert!(matches!(err, PathError::PathTraversal { .. }));

        // Missing target below the symlinked directory is caught as well
        let err = resolver.resolve(&["mainnet", "escape", "missing.json"]).unwrap_err();
        assert!(matches!(err, PathError::PathTraversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn allows_symlink_within_root() {
        let (dir, resolver) = setup();
        std::os::unix::fs::symlink(
            dir.path().join("mainnet/2024-01-upgrade"),
            dir.path().join("mainnet/latest"),
        )
        .unwrap();

        let path = resolver.resolve(&["mainnet", "latest"]).unwrap();
        assert!(path.ends_with("mainnet/2024-01-upgrade"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_dangling_symlink() {
        let (dir, resolver) = setup();
        std::os::unix::fs::symlink("/nonexistent/target", dir.path().join("mainnet/dangling"))
            .unwrap();
        let err = resolver.resolve(&["mainnet", "dangling"]).unwrap_err();
        assert!(matches!(err, PathError::PathTraversal { .. }));
    }

    #[test]
    fn root_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = PathResolver::new(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, PathError::RootUnavailable { .. }));
    }

    #[test]
    fn relative_strips_root() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve(&["mainnet", "x.json"]).unwrap();
        assert_eq!(resolver.relative(&path), Path::new("mainnet/x.json"));
    }
}
