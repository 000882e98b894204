//! Artifact path normalization and collision handling.

use crate::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical file extension of stored artifacts.
pub const EXTENSION: &str = "h5";

/// Appends the canonical extension unless the path already carries it.
pub(crate) fn with_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

/// Picks the path to write.
///
/// A free path is returned as is. An occupied path fails with
/// [`Error::AlreadyExists`] unless `overwrite` is set, in which case the
/// first free `{stem}_{n}.{ext}` sibling is returned.
pub(crate) fn resolve_target(path: &Path, overwrite: bool) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }
    if !overwrite {
        return Err(Error::AlreadyExists(path.to_path_buf()));
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| Error::AlreadyExists(path.to_path_buf()))
}

/// Creates the parent directory chain of `path`.
pub(crate) fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension(Path::new("a/run1")), PathBuf::from("a/run1.h5"));
        assert_eq!(with_extension(Path::new("run1.h5")), PathBuf::from("run1.h5"));
        assert_eq!(
            with_extension(Path::new("run12 - E.T")),
            PathBuf::from("run12 - E.T.h5")
        );
    }

    #[test]
    fn test_resolve_target_free_and_taken() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binned.h5");
        assert_eq!(resolve_target(&path, false).unwrap(), path);

        fs::write(&path, b"x").unwrap();
        assert!(matches!(
            resolve_target(&path, false),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(
            resolve_target(&path, true).unwrap(),
            dir.path().join("binned_1.h5")
        );

        fs::write(dir.path().join("binned_1.h5"), b"x").unwrap();
        assert_eq!(
            resolve_target(&path, true).unwrap(),
            dir.path().join("binned_2.h5")
        );
    }

    #[test]
    fn test_create_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("c.h5");
        create_parent_dirs(&path).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }
}
