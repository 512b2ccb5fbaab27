use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// How symlinks under a data root are treated. Followed by default; the
/// resolved target still has to stay under the root.
#[derive(Clone, Copy, Debug)]
pub struct PathPolicy {
    pub follow_symlinks: bool,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self { follow_symlinks: true }
    }
}

/// Lexical check of a manifest path: must be relative and free of `..`.
pub fn check_relative(rel: &Path) -> Result<()> {
    if rel.is_absolute() || rel.has_root() {
        return Err(Error::UnsafePath(format!("absolute paths are not allowed: {:?}", rel)));
    }
    for comp in rel.components() {
        match comp {
            Component::ParentDir => {
                return Err(Error::UnsafePath(format!("parent traversal not allowed: {:?}", rel)))
            }
            Component::Prefix(_) => {
                return Err(Error::UnsafePath(format!("drive prefixes are not allowed: {:?}", rel)))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Ensure `rel` is safe relative to `root`. Without `follow_symlinks` any
/// symlink on the way is rejected; with it the canonical target must stay
/// under the canonical root. The target is expected to exist.
pub fn validate_path(root: &Path, rel: &Path, policy: PathPolicy) -> Result<PathBuf> {
    check_relative(rel)?;
    let candidate = root.join(rel);
    if !policy.follow_symlinks {
        let mut cur = root.to_path_buf();
        for comp in rel.components() {
            cur.push(comp);
            if let Ok(m) = std::fs::symlink_metadata(&cur) {
                if m.file_type().is_symlink() {
                    return Err(Error::UnsafePath(format!(
                        "symlink in path (not following): {:?}",
                        cur
                    )));
                }
            }
        }
        Ok(candidate)
    } else {
        resolve_within(root, &candidate)
    }
}

/// Canonicalize `path` and require it to stay under the canonical `root`.
pub fn resolve_within(root: &Path, path: &Path) -> Result<PathBuf> {
    let root_can = std::fs::canonicalize(root)?;
    let cand_can = std::fs::canonicalize(path)?;
    if !cand_can.starts_with(&root_can) {
        return Err(Error::UnsafePath(format!("path escapes root: {:?}", path)));
    }
    Ok(cand_can)
}

/// Manifest key for `path` under `root`: relative, `/`-separated.
pub fn manifest_key(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
