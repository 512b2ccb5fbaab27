use crate::csv_validator::CsvValidator;
use crate::hashing;
use crate::json_validator::JsonValidator;
use serde::Serialize;
use std::path::Path;

/// Outcome of validating one file. `valid` always equals `errors.is_empty()`;
/// warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ValidationResult {
    pub fn new(
        file_path: impl Into<String>,
        errors: Vec<String>,
        warnings: Vec<String>,
        checksum: Option<String>,
    ) -> Self {
        Self { valid: errors.is_empty(), errors, warnings, file_path: file_path.into(), checksum }
    }

    /// Fast-fail result: a single error and no checksum.
    pub fn rejected(file_path: impl Into<String>, error: String) -> Self {
        Self::new(file_path, vec![error], Vec::new(), None)
    }
}

/// Shared existence/emptiness gate; `Some` means validation stops here.
pub(crate) fn precheck(path: &Path) -> Option<ValidationResult> {
    let file_path = path.display().to_string();
    match std::fs::metadata(path) {
        Err(_) => Some(ValidationResult::rejected(&file_path, format!("File not found: {file_path}"))),
        Ok(m) if m.len() == 0 => {
            Some(ValidationResult::rejected(&file_path, format!("File is empty: {file_path}")))
        }
        Ok(_) => None,
    }
}

/// Validator settings for both file kinds.
#[derive(Clone, Debug, Default)]
pub struct ValidatorSet {
    pub json: JsonValidator,
    pub csv: CsvValidator,
}

/// The supported artifact kinds.
#[derive(Clone, Debug)]
pub enum Validator {
    Json(JsonValidator),
    Csv(CsvValidator),
}

impl Validator {
    /// Pick a validator by (case-insensitive) extension; `None` for anything
    /// that is neither JSON nor CSV.
    pub fn for_path(path: &Path) -> Option<Self> {
        Self::for_path_with(path, &ValidatorSet::default())
    }

    pub fn for_path_with(path: &Path, set: &ValidatorSet) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Validator::Json(set.json.clone())),
            "csv" => Some(Validator::Csv(set.csv.clone())),
            _ => None,
        }
    }

    pub fn validate(&self, path: &Path) -> ValidationResult {
        match self {
            Validator::Json(v) => v.validate(path),
            Validator::Csv(v) => v.validate(path),
        }
    }

    pub fn checksum(&self, path: &Path) -> std::io::Result<String> {
        hashing::sha256_file(path)
    }
}
