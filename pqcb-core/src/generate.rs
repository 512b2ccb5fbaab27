use crate::error::{Error, Result};
use crate::hashing;
use crate::manifest::{ChecksumEntry, Manifest};
use crate::path_safety::{manifest_key, resolve_within};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Artifact extensions recorded in a manifest (case-sensitive).
pub const INCLUDE_EXTENSIONS: &[&str] = &["json", "csv", "png", "svg"];

/// Cache/coverage/temp directory names; any file below one of them is skipped.
pub const EXCLUDE_DIRS: &[&str] = &["htmlcov", "quality", "__pycache__", ".pytest_cache"];

/// Name of the companion script written next to the manifest.
pub const VERIFY_SCRIPT: &str = "verify_checksums.sh";

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    /// Record symlinked files whose target stays under the root.
    pub follow_symlinks: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            extensions: INCLUDE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            follow_symlinks: true,
        }
    }
}

impl GeneratorConfig {
    /// `rel` is the path below the scanned root.
    pub fn includes(&self, rel: &Path) -> bool {
        let excluded = rel.components().any(|c| {
            let c = c.as_os_str();
            self.exclude_dirs.iter().any(|x| c == x.as_str())
        });
        if excluded {
            return false;
        }
        match rel.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|x| x == ext),
            None => false,
        }
    }
}

pub fn generate(root: &Path) -> Result<Manifest> {
    generate_with(root, &GeneratorConfig::default())
}

/// Walk `root` and hash every included artifact.
pub fn generate_with(root: &Path, cfg: &GeneratorConfig) -> Result<Manifest> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    // Symlinked directories are not descended into.
    let mut files: Vec<PathBuf> = Vec::new();
    for ent in walkdir::WalkDir::new(root).min_depth(1) {
        let ent = ent.map_err(std::io::Error::from)?;
        let p = ent.path();
        let rel = p.strip_prefix(root).unwrap_or(p);
        if !cfg.includes(rel) {
            continue;
        }
        let ft = ent.file_type();
        let wanted = if ft.is_symlink() {
            cfg.follow_symlinks && linked_file_within(root, p)
        } else {
            ft.is_file()
        };
        if wanted {
            files.push(p.to_path_buf());
        }
    }
    files.sort();

    let entries: Vec<ChecksumEntry> =
        files.par_iter().map(|p| checksum_entry(root, p)).collect::<Result<_>>()?;

    let manifest = Manifest::new(Local::now().to_rfc3339(), entries);
    info!(root = %root.display(), files = manifest.total_files, "checksum manifest generated");
    Ok(manifest)
}

fn linked_file_within(root: &Path, link: &Path) -> bool {
    match resolve_within(root, link) {
        Ok(target) => target.is_file(),
        Err(e) => {
            warn!(path = %link.display(), error = %e, "skipping symlink");
            false
        }
    }
}

fn checksum_entry(root: &Path, path: &Path) -> Result<ChecksumEntry> {
    let meta = std::fs::metadata(path)?;
    let sha256 = hashing::sha256_file(path)?;
    let modified = DateTime::<Local>::from(meta.modified()?).to_rfc3339();
    let relative_path = manifest_key(root, path);
    debug!(path = %relative_path, sha256 = &sha256[..16], "hashed");
    Ok(ChecksumEntry { relative_path, sha256, size: meta.len(), modified })
}

/// Write an executable shell script next to `manifest_path` that re-runs
/// `<program> verify` against the same manifest and data directory.
/// `program` is a command name looked up on `PATH` or a path to the binary.
pub fn write_verify_script(manifest_path: &Path, data_dir: &Path, program: &str) -> Result<PathBuf> {
    let dir = match manifest_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let manifest_name = manifest_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::manifest::MANIFEST_FILE.to_string());
    let data_ref = match (std::fs::canonicalize(data_dir), std::fs::canonicalize(&dir)) {
        (Ok(data_abs), Ok(dir_abs)) => pathdiff::diff_paths(&data_abs, &dir_abs).unwrap_or(data_abs),
        _ => data_dir.to_path_buf(),
    };

    let script = format!(
        "#!/bin/sh\n\
         # Verify benchmark artifacts against {name}.\n\
         cd \"$(dirname \"$0\")\" || exit 1\n\
         exec {program} verify --manifest {manifest} --data-dir {data} \"$@\"\n",
        name = manifest_name,
        program = sh_quote(program),
        manifest = sh_quote(&manifest_name),
        data = sh_quote(&data_ref.to_string_lossy()),
    );

    let path = dir.join(VERIFY_SCRIPT);
    let mut f = File::create(&path)?;
    f.write_all(script.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
