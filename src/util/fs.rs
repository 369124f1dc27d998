//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it (and parents) if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Resolve a path to absolute form.
///
/// Existing paths are canonicalized. Paths that don't exist yet
/// (build/install dirs before their first run) are anchored to the
/// current directory and lexically cleaned, so every command in the
/// pipeline sees the same absolute location regardless of its own
/// working directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match std::env::current_dir() {
        Ok(cwd) => lexical_clean(&cwd.join(path)),
        Err(_) => path.to_path_buf(),
    }
}

/// Remove `.` components and fold `..` into their parent, without
/// touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            _ => out.push(component.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Idempotent on the second call.
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_normalize_missing_absolute_path_is_kept() {
        let missing = Path::new("/no/such/dir/at/all");
        assert_eq!(normalize_path(missing), missing.to_path_buf());
    }

    #[test]
    fn test_normalize_missing_relative_path_becomes_absolute() {
        let resolved = normalize_path(Path::new("no-such-build-dir"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("no-such-build-dir"));
        assert_eq!(
            resolved,
            std::env::current_dir().unwrap().join("no-such-build-dir")
        );
    }

    #[test]
    fn test_lexical_clean_folds_dot_components() {
        assert_eq!(
            lexical_clean(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(lexical_clean(Path::new("/a/b/..")), PathBuf::from("/a"));
    }
}
