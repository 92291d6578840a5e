use crate::core::error::{DepackError, DepackResult};
use std::path::{Component, Path, PathBuf};

/// File name of an npm package manifest
pub const MANIFEST_FILE: &str = "package.json";

/// Default config file name looked up in the working directory
pub const CONFIG_FILE: &str = "depack.yaml";

/// Name of the scratch cache directory created inside a target directory
pub const SCRATCH_CACHE_DIR: &str = ".depack-cache";

/// Get the manifest path for a directory (./package.json)
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Find every directory holding a package.json, from `start` up to the filesystem root
///
/// Results are ordered closest-first. Unlike a project-root lookup this does not
/// stop at the first hit: a nested package.json may not be the one that declares
/// a dependency.
pub fn find_manifest_dirs(start: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut current = Some(start);

    while let Some(dir) = current {
        if manifest_path(dir).is_file() {
            found.push(dir.to_path_buf());
        }
        current = dir.parent();
    }

    found
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Lexically normalize a path, dropping `.` and folding `..`
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Directory containing a file path, or an error for bare roots
pub fn parent_dir(path: &Path) -> DepackResult<PathBuf> {
    path.parent()
        .map(|p| {
            if p.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                p.to_path_buf()
            }
        })
        .ok_or_else(|| DepackError::Path(format!("{} has no parent directory", path.display())))
}
