use crate::hashing;
use crate::validation::{precheck, ValidationResult};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Per-result statistics of the `results` layout, in microseconds.
pub const RESULT_STAT_FIELDS: [&str; 5] = ["mean_us", "median_us", "stddev_us", "min_us", "max_us"];

/// Per-operation statistics of the legacy `operations` layout.
pub const OPERATION_STAT_FIELDS: [&str; 5] = ["min", "max", "mean", "median", "stddev"];

/// Below this `num_samples` a result gets a low-sample advisory.
pub const MIN_SAMPLES: u64 = 100;

#[derive(Clone, Debug)]
pub struct JsonValidator {
    pub required_fields: Vec<String>,
}

impl Default for JsonValidator {
    fn default() -> Self {
        Self { required_fields: vec!["algorithm".to_string()] }
    }
}

impl JsonValidator {
    pub fn new(required_fields: Vec<String>) -> Self {
        Self { required_fields }
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
        let data: Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => return ValidationResult::rejected(file_path, format!("Invalid JSON: {e}")),
        };
        let Value::Object(obj) = &data else {
            return ValidationResult::rejected(file_path, "Root element must be a JSON object".into());
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for field in &self.required_fields {
            if !obj.contains_key(field) {
                errors.push(format!("Missing required field: {field}"));
            }
        }

        match (obj.get("results"), obj.get("operations")) {
            (Some(Value::Array(results)), _) => {
                check_results(results, &mut errors, &mut warnings)
            }
            (_, Some(Value::Object(ops))) => check_operations(ops, &mut errors, &mut warnings),
            _ => {}
        }

        debug!(path = %file_path, errors = errors.len(), warnings = warnings.len(), "json validated");
        ValidationResult::new(file_path, errors, warnings, Some(hashing::sha256_hex(&bytes)))
    }
}

fn check_results(results: &[Value], errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for (idx, item) in results.iter().enumerate() {
        let Some(item) = item.as_object() else {
            errors.push(format!("Result {idx} must be an object"));
            continue;
        };

        if !item.contains_key("operation") {
            warnings.push(format!("Result {idx} missing 'operation' field"));
        }

        let missing = missing_fields(item, &RESULT_STAT_FIELDS);
        if !missing.is_empty() {
            warnings.push(format!("Result {idx} missing stats: {}", missing.join(", ")));
        }

        for field in RESULT_STAT_FIELDS {
            if let Some(v) = item.get(field) {
                // Non-numbers (strings, bools, null) and negatives are both errors.
                if !v.as_f64().is_some_and(|x| x >= 0.0) {
                    errors.push(format!("Invalid {field} in result {idx}: {v}"));
                }
            }
        }

        if let Some(n) = item.get("num_samples") {
            if !n.as_u64().is_some_and(|n| n >= MIN_SAMPLES) {
                warnings.push(format!("Low sample count in result {idx}: {n}"));
            }
        }
    }
}

fn check_operations(
    ops: &Map<String, Value>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for (name, op) in ops {
        let Some(op) = op.as_object() else {
            errors.push(format!("Operation '{name}' must be an object"));
            continue;
        };
        let missing = missing_fields(op, &OPERATION_STAT_FIELDS);
        if !missing.is_empty() {
            warnings.push(format!("Operation '{name}' missing stats: {}", missing.join(", ")));
        }
    }
}

fn missing_fields<'a>(obj: &Map<String, Value>, fields: &[&'a str]) -> Vec<&'a str> {
    fields.iter().copied().filter(|f| !obj.contains_key(*f)).collect()
}
