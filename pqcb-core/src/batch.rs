use crate::error::{Error, Result};
use crate::validation::{ValidationResult, Validator, ValidatorSet};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// JSON/CSV files under `dir`, sorted. Only the top level unless `recursive`.
pub fn collect_data_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }
    let mut walker = walkdir::WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }
    let mut files = Vec::new();
    for ent in walker {
        let ent = match ent {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        // A symlinked file counts; a symlinked directory is not entered.
        let ft = ent.file_type();
        if !(ft.is_file() || (ft.is_symlink() && ent.path().is_file())) {
            continue;
        }
        if Validator::for_path(ent.path()).is_none() {
            continue;
        }
        files.push(ent.into_path());
    }
    files.sort();
    Ok(files)
}

/// Validate every data file under `dir`. Files are independent; results come
/// back in the sorted order of `collect_data_files`.
pub fn validate_directory(
    dir: &Path,
    recursive: bool,
    set: &ValidatorSet,
) -> Result<Vec<ValidationResult>> {
    let files = collect_data_files(dir, recursive)?;
    let results: Vec<ValidationResult> = files
        .par_iter()
        .filter_map(|p| Validator::for_path_with(p, set).map(|v| v.validate(p)))
        .collect();
    let summary = BatchSummary::from_results(&results);
    info!(dir = %dir.display(), total = summary.total, invalid = summary.invalid, "batch validated");
    Ok(results)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let valid = results.iter().filter(|r| r.valid).count();
        Self { total: results.len(), valid, invalid: results.len() - valid }
    }

    pub fn all_valid(&self) -> bool {
        self.invalid == 0
    }
}

pub fn invalid_results(results: &[ValidationResult]) -> impl Iterator<Item = &ValidationResult> {
    results.iter().filter(|r| !r.valid)
}

pub fn warned_results(results: &[ValidationResult]) -> impl Iterator<Item = &ValidationResult> {
    results.iter().filter(|r| r.valid && !r.warnings.is_empty())
}
