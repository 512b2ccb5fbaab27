use crate::error::{Error, Result};
use crate::hashing;
use crate::manifest::ManifestDigests;
use crate::path_safety::{self, PathPolicy};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Missing,
    Mismatch,
    Unsafe(String),
    Unreadable(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Missing => f.write_str("missing"),
            FailureReason::Mismatch => f.write_str("mismatch"),
            FailureReason::Unsafe(why) => write!(f, "unsafe path ({why})"),
            FailureReason::Unreadable(why) => write!(f, "unreadable ({why})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub total: usize,
    pub verified: usize,
    pub failed: Vec<(String, FailureReason)>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn verify(digests: &ManifestDigests, data_root: &Path) -> VerificationReport {
    verify_with_policy(digests, data_root, PathPolicy::default())
}

/// Recompute every recorded digest under `data_root`. Every entry is checked;
/// failures are collected, never returned early.
pub fn verify_with_policy(
    digests: &ManifestDigests,
    data_root: &Path,
    policy: PathPolicy,
) -> VerificationReport {
    let mut verified = 0usize;
    let mut failed = Vec::new();
    for (rel, expected) in digests.iter() {
        match check_entry(data_root, rel, expected, policy) {
            Ok(()) => {
                debug!(path = rel, "verified");
                verified += 1;
            }
            Err(reason) => {
                warn!(path = rel, %reason, "verification failed");
                failed.push((rel.to_string(), reason));
            }
        }
    }
    let report = VerificationReport { total: digests.len(), verified, failed };
    info!(total = report.total, verified = report.verified, failed = report.failed.len(), "verification done");
    report
}

fn check_entry(
    root: &Path,
    rel: &str,
    expected: &str,
    policy: PathPolicy,
) -> std::result::Result<(), FailureReason> {
    let rel_path = Path::new(rel);
    path_safety::check_relative(rel_path).map_err(|e| FailureReason::Unsafe(unsafe_detail(e)))?;
    let candidate = root.join(rel_path);
    if !candidate.exists() {
        return Err(FailureReason::Missing);
    }
    let resolved = path_safety::validate_path(root, rel_path, policy).map_err(|e| match e {
        Error::UnsafePath(why) => FailureReason::Unsafe(why),
        other => FailureReason::Unreadable(other.to_string()),
    })?;
    let expected = expected.trim();
    if !hashing::is_sha256_hex(expected) {
        warn!(path = rel, recorded = expected, "recorded digest is not SHA-256 hex");
        return Err(FailureReason::Mismatch);
    }
    let actual =
        hashing::sha256_file(&resolved).map_err(|e| FailureReason::Unreadable(e.to_string()))?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(FailureReason::Mismatch)
    }
}

fn unsafe_detail(e: Error) -> String {
    match e {
        Error::UnsafePath(why) => why,
        other => other.to_string(),
    }
}

/// Load the manifest at `manifest_path` (either format) and verify it.
pub fn verify_manifest_file(
    manifest_path: &Path,
    data_root: &Path,
    policy: PathPolicy,
) -> Result<VerificationReport> {
    let digests = ManifestDigests::load(manifest_path)?;
    if digests.is_legacy() {
        debug!(manifest = %manifest_path.display(), "legacy 'files' manifest");
    }
    Ok(verify_with_policy(&digests, data_root, policy))
}
