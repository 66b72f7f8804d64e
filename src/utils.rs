//! Path utilities for xsum
//!
//! Checksum records store paths as text, so the codec needs purely lexical
//! path algebra: normalization that never touches the file system, and
//! relativization that can step *outside* the base with `..` components.
//! Canonicalization is deliberately avoided — resolving symlinks would make
//! a record's path field depend on the machine it was generated on.

use crate::error::{Result, XsumError};
use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically
///
/// Collapses duplicate separators, drops `.` components and folds `..` onto
/// the preceding component where possible. Leading `..` components of a
/// relative path are kept; `..` directly under the root is dropped. An empty
/// path normalizes to `.`.
///
/// This is a string-level operation: the path does not need to exist, and
/// symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    // Number of normal components currently in `out` that a ".." may pop.
    let mut depth = 0usize;
    let mut rooted = false;

    for comp in path.components() {
        match comp {
            Component::Prefix(prefix) => {
                out.push(prefix.as_os_str());
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                rooted = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !rooted {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Compute a relative path from `base` to `path`, lexically
///
/// Both paths are normalized first; the result walks up out of `base` with
/// `..` components when `path` is not underneath it. Neither path needs to
/// exist. When the two refer to the same location the result is `.`.
///
/// # Errors
///
/// Returns [`XsumError::Internal`] when the paths cannot be related
/// lexically: one is absolute and the other relative, they live under
/// different roots (Windows drives), or `base` starts with `..` components
/// that `path` does not share.
pub fn relative_to(path: &Path, base: &Path) -> Result<PathBuf> {
    let path = normalize_path(path);
    let base = normalize_path(base);

    if path.is_absolute() != base.is_absolute() {
        return Err(XsumError::internal(format!(
            "cannot relativize {:?} against {:?}: mixed absolute and relative",
            path, base
        )));
    }

    let path_parts: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let base_parts: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if path.is_absolute() && common == 0 {
        return Err(XsumError::internal(format!(
            "{:?} and {:?} share no common root",
            path, base
        )));
    }

    let mut out = PathBuf::new();
    for comp in &base_parts[common..] {
        if matches!(comp, Component::ParentDir) {
            return Err(XsumError::internal(format!(
                "cannot relativize {:?} against {:?}: base escapes upward",
                path, base
            )));
        }
        out.push("..");
    }
    for comp in &path_parts[common..] {
        out.push(comp.as_os_str());
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_path(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize_path(Path::new("a//b")), PathBuf::from("a/b"));
        assert_eq!(normalize_path(Path::new("a/b/")), PathBuf::from("a/b"));
        assert_eq!(normalize_path(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_normalize_parent_dirs() {
        assert_eq!(normalize_path(Path::new("a/../b")), PathBuf::from("b"));
        assert_eq!(
            normalize_path(Path::new("a/../../b")),
            PathBuf::from("../b")
        );
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_rooted() {
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("/a/../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_relative_to_inside() {
        let rel = relative_to(Path::new("dir/sub/file.txt"), Path::new("dir")).unwrap();
        assert_eq!(rel, PathBuf::from("sub/file.txt"));
    }

    #[test]
    fn test_relative_to_outside() {
        let rel = relative_to(Path::new("other/file.txt"), Path::new("dir/sub")).unwrap();
        assert_eq!(rel, PathBuf::from("../../other/file.txt"));
    }

    #[test]
    fn test_relative_to_same() {
        let rel = relative_to(Path::new("dir"), Path::new("dir")).unwrap();
        assert_eq!(rel, PathBuf::from("."));
    }

    #[test]
    fn test_relative_to_mixed_fails() {
        assert!(relative_to(Path::new("/abs/p"), Path::new("rel")).is_err());
    }
}
