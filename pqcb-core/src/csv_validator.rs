use crate::hashing;
use crate::validation::{precheck, ValidationResult};
use std::path::Path;
use tracing::debug;

/// Columns that must not hold blank cells.
pub const CRITICAL_COLUMNS: [&str; 2] = ["algorithm", "operation"];

/// Columns whose non-blank cells must parse as non-negative numbers.
pub const NUMERIC_COLUMNS: [&str; 6] = ["iterations", "mean", "median", "min", "max", "stddev"];

#[derive(Clone, Debug)]
pub struct CsvValidator {
    pub expected_columns: Vec<String>,
}

impl Default for CsvValidator {
    fn default() -> Self {
        Self {
            expected_columns: ["algorithm", "operation", "iterations", "mean", "median"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CsvValidator {
    pub fn new(expected_columns: Vec<String>) -> Self {
        Self { expected_columns }
    }

    pub fn validate(&self, path: &Path) -> ValidationResult {
        if let Some(rejected) = precheck(path) {
            return rejected;
        }
        let file_path = path.display().to_string();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => return ValidationResult::rejected(file_path, format!("Cannot read file: {e}")),
        };

        // Ragged rows are read as-is: extra cells are ignored and a short row
        // only matters once a checked column falls past its end.
        let mut rdr =
            csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(bytes.as_slice());
        let headers = match rdr.headers() {
            Ok(h) => h.clone(),
            Err(e) => return ValidationResult::rejected(file_path, format!("Error parsing CSV: {e}")),
        };
        if headers.is_empty() {
            return ValidationResult::rejected(file_path, "CSV file has no headers".into());
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let missing: Vec<&str> = self
            .expected_columns
            .iter()
            .map(String::as_str)
            .filter(|c| !headers.iter().any(|h| h == *c))
            .collect();
        if !missing.is_empty() {
            warnings.push(format!("Missing expected columns: {}", missing.join(", ")));
        }

        let column = |name: &'static str| headers.iter().position(|h| h == name).map(|i| (name, i));
        let critical: Vec<(&str, usize)> = CRITICAL_COLUMNS.iter().filter_map(|&c| column(c)).collect();
        let numeric: Vec<(&str, usize)> = NUMERIC_COLUMNS.iter().filter_map(|&c| column(c)).collect();

        let mut row_count = 0usize;
        // Row 1 is the header.
        for (i, rec) in rdr.records().enumerate() {
            let row_num = i + 2;
            let rec = match rec {
                Ok(r) => r,
                Err(e) => {
                    errors.push(format!("Error parsing CSV: {e}"));
                    return ValidationResult::new(file_path, errors, warnings, None);
                }
            };
            row_count += 1;

            for &(col, idx) in &critical {
                let Some(cell) = rec.get(idx) else {
                    return short_row(file_path, errors, warnings, row_num, col);
                };
                if cell.trim().is_empty() {
                    errors.push(format!("Row {row_num}: Empty value in column '{col}'"));
                }
            }

            for &(col, idx) in &numeric {
                let Some(raw) = rec.get(idx) else {
                    return short_row(file_path, errors, warnings, row_num, col);
                };
                if raw.trim().is_empty() {
                    continue;
                }
                match raw.trim().parse::<f64>() {
                    Ok(v) if v < 0.0 => {
                        errors.push(format!("Row {row_num}: Negative value in '{col}': {v}"))
                    }
                    Ok(_) => {}
                    Err(_) => {
                        errors.push(format!("Row {row_num}: Invalid numeric value in '{col}': {raw}"))
                    }
                }
            }
        }

        if row_count == 0 {
            warnings.push("CSV file has no data rows".to_string());
        }

        debug!(path = %file_path, rows = row_count, errors = errors.len(), "csv validated");
        ValidationResult::new(file_path, errors, warnings, Some(hashing::sha256_hex(&bytes)))
    }
}

/// A row that ends before a checked column cannot be judged; the file is
/// rejected the same way a reader failure is, keeping earlier findings.
fn short_row(
    file_path: String,
    mut errors: Vec<String>,
    warnings: Vec<String>,
    row_num: usize,
    col: &str,
) -> ValidationResult {
    errors.push(format!("Error parsing CSV: row {row_num} has no value for column '{col}'"));
    ValidationResult::new(file_path, errors, warnings, None)
}
