use pqcb_core::csv_validator::CsvValidator;
use pqcb_core::hashing;
use pqcb_core::json_validator::JsonValidator;
use pqcb_core::validation::{ValidationResult, Validator};
use std::fs;
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn json(dir: &Path, body: &str) -> ValidationResult {
    JsonValidator::default().validate(&write(dir, "run.json", body))
}

fn csv(dir: &Path, body: &str) -> ValidationResult {
    CsvValidator::default().validate(&write(dir, "run.csv", body))
}

const GOOD_RESULT: &str = r#"{"operation":"keygen","mean_us":12.5,"median_us":12.3,
    "stddev_us":0.4,"min_us":11.9,"max_us":14.0,"num_samples":1000}"#;

#[test]
fn factory_dispatches_on_extension() {
    assert!(matches!(Validator::for_path(Path::new("a/b.json")), Some(Validator::Json(_))));
    assert!(matches!(Validator::for_path(Path::new("B.CSV")), Some(Validator::Csv(_))));
    assert!(Validator::for_path(Path::new("plot.png")).is_none());
    assert!(Validator::for_path(Path::new("README")).is_none());
}

#[test]
fn json_fast_fail_cases_have_one_error_and_no_checksum() {
    let td = tempfile::tempdir().unwrap();
    let cases = [
        JsonValidator::default().validate(&td.path().join("absent.json")),
        json(td.path(), ""),
        json(td.path(), "{\"algorithm\": "),
        json(td.path(), "[1, 2, 3]"),
    ];
    for r in &cases {
        assert!(!r.valid);
        assert_eq!(r.errors.len(), 1, "{:?}", r.errors);
        assert!(r.checksum.is_none());
    }
    assert!(cases[0].errors[0].starts_with("File not found"));
    assert!(cases[1].errors[0].starts_with("File is empty"));
    assert!(cases[2].errors[0].starts_with("Invalid JSON"));
    assert_eq!(cases[3].errors[0], "Root element must be a JSON object");
}

#[test]
fn json_well_formed_results_are_clean() {
    let td = tempfile::tempdir().unwrap();
    let body = format!(r#"{{"algorithm":"ML-KEM-768","results":[{GOOD_RESULT}]}}"#);
    let r = json(td.path(), &body);
    assert!(r.valid);
    assert!(r.errors.is_empty());
    assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    assert_eq!(r.checksum.as_deref(), Some(hashing::sha256_hex(body.as_bytes()).as_str()));
}

#[test]
fn json_missing_operation_is_only_a_warning() {
    let td = tempfile::tempdir().unwrap();
    let r = json(
        td.path(),
        r#"{"algorithm":"ML-DSA-65","results":[{"mean_us":1,"median_us":1,"stddev_us":0,"min_us":1,"max_us":1}]}"#,
    );
    assert!(r.valid);
    assert_eq!(r.warnings, vec!["Result 0 missing 'operation' field".to_string()]);
    assert!(r.checksum.is_some());
}

#[test]
fn json_schema_violations_accumulate() {
    let td = tempfile::tempdir().unwrap();
    let r = json(
        td.path(),
        r#"{"results":[
            "oops",
            {"operation":"sign","mean_us":-1,"median_us":"fast","stddev_us":0.1,"num_samples":50}
        ]}"#,
    );
    assert!(!r.valid);
    assert_eq!(
        r.errors,
        vec![
            "Missing required field: algorithm".to_string(),
            "Result 0 must be an object".to_string(),
            "Invalid mean_us in result 1: -1".to_string(),
            "Invalid median_us in result 1: \"fast\"".to_string(),
        ]
    );
    assert_eq!(
        r.warnings,
        vec![
            "Result 1 missing stats: min_us, max_us".to_string(),
            "Low sample count in result 1: 50".to_string(),
        ]
    );
    // Schema violations still carry a checksum.
    assert!(r.checksum.is_some());
}

#[test]
fn json_non_integer_sample_count_warns() {
    let td = tempfile::tempdir().unwrap();
    let r = json(
        td.path(),
        r#"{"algorithm":"x","results":[{"operation":"k","mean_us":1,"median_us":1,"stddev_us":1,"min_us":1,"max_us":1,"num_samples":"many"}]}"#,
    );
    assert!(r.valid);
    assert_eq!(r.warnings, vec!["Low sample count in result 0: \"many\"".to_string()]);
}

#[test]
fn json_legacy_operations_layout() {
    let td = tempfile::tempdir().unwrap();
    let r = json(
        td.path(),
        r#"{"algorithm":"ML-KEM-512","iterations":1000,"operations":{
            "decaps":{"min":1,"max":2,"mean":1.5,"median":1.5,"stddev":0.1},
            "encaps":{"min":1,"mean":1.5},
            "keygen":42
        }}"#,
    );
    assert!(!r.valid);
    assert_eq!(r.errors, vec!["Operation 'keygen' must be an object".to_string()]);
    assert_eq!(r.warnings, vec!["Operation 'encaps' missing stats: max, median, stddev".to_string()]);
}

#[test]
fn json_custom_required_fields() {
    let td = tempfile::tempdir().unwrap();
    let p = write(td.path(), "meta.json", r#"{"algorithm":"x"}"#);
    let r = JsonValidator::new(vec!["algorithm".into(), "architecture".into()]).validate(&p);
    assert_eq!(r.errors, vec!["Missing required field: architecture".to_string()]);
}

#[test]
fn csv_concrete_scenario_is_clean() {
    let td = tempfile::tempdir().unwrap();
    let body = "algorithm,operation,iterations,mean,median\nML-KEM-512,keygen,1000,12.5,12.3\n";
    let r = csv(td.path(), body);
    assert!(r.valid);
    assert!(r.errors.is_empty());
    assert!(r.warnings.is_empty());
    assert_eq!(r.checksum.as_deref(), Some(hashing::sha256_hex(body.as_bytes()).as_str()));
}

#[test]
fn csv_empty_operation_names_row_and_column() {
    let td = tempfile::tempdir().unwrap();
    let r = csv(td.path(), "algorithm,operation,iterations,mean,median\nML-KEM-512,,1000,12.5,12.3\n");
    assert!(!r.valid);
    assert_eq!(r.errors, vec!["Row 2: Empty value in column 'operation'".to_string()]);
}

#[test]
fn csv_negative_and_non_numeric_values() {
    let td = tempfile::tempdir().unwrap();
    let r = csv(
        td.path(),
        "algorithm,operation,iterations,mean,median\n\
         ML-KEM-512,keygen,1000,-5,12.3\n\
         ML-KEM-512,encaps,1000,abc,12.3\n\
         ML-KEM-512,decaps,1000, 7.25 ,\n",
    );
    assert!(!r.valid);
    assert_eq!(r.errors.len(), 2, "{:?}", r.errors);
    assert!(r.errors[0].starts_with("Row 2: Negative value in 'mean'"), "{}", r.errors[0]);
    assert_eq!(r.errors[1], "Row 3: Invalid numeric value in 'mean': abc");
    assert!(r.checksum.is_some());
}

#[test]
fn csv_missing_columns_and_no_rows_are_warnings() {
    let td = tempfile::tempdir().unwrap();
    let r = csv(td.path(), "algorithm,operation,cycles\n");
    assert!(r.valid);
    assert_eq!(
        r.warnings,
        vec![
            "Missing expected columns: iterations, mean, median".to_string(),
            "CSV file has no data rows".to_string(),
        ]
    );
}

#[test]
fn csv_fast_fail_cases() {
    let td = tempfile::tempdir().unwrap();
    let empty = csv(td.path(), "");
    assert_eq!(empty.errors.len(), 1);
    assert!(empty.errors[0].starts_with("File is empty"));
    assert!(empty.checksum.is_none());

    let blank = csv(td.path(), "\n\n");
    assert_eq!(blank.errors, vec!["CSV file has no headers".to_string()]);
    assert!(blank.checksum.is_none());

    let absent = CsvValidator::default().validate(&td.path().join("absent.csv"));
    assert!(absent.errors[0].starts_with("File not found"));
}

#[test]
fn csv_trailing_comma_and_unchecked_extra_column_stay_valid() {
    let td = tempfile::tempdir().unwrap();
    let trailing = csv(
        td.path(),
        "algorithm,operation,iterations,mean,median\nML-KEM-512,keygen,1000,12.5,12.3,\n",
    );
    assert!(trailing.valid, "{:?}", trailing.errors);
    assert!(trailing.checksum.is_some());

    // The unchecked `note` column is absent from the row.
    let short_note = csv(
        td.path(),
        "algorithm,operation,iterations,mean,median,note\nML-KEM-512,keygen,1000,12.5,12.3\n",
    );
    assert!(short_note.valid, "{:?}", short_note.errors);
    assert!(short_note.warnings.is_empty(), "{:?}", short_note.warnings);
    assert!(short_note.checksum.is_some());
}

#[test]
fn csv_row_ending_before_checked_column_short_circuits_without_checksum() {
    let td = tempfile::tempdir().unwrap();
    let r = csv(
        td.path(),
        "algorithm,operation,iterations,mean,median\n\
         ML-KEM-512,,1000,1,1\n\
         ML-KEM-512,keygen\n\
         ML-KEM-512,,1000,1,1\n",
    );
    assert!(!r.valid);
    assert_eq!(r.errors.len(), 2, "{:?}", r.errors);
    assert_eq!(r.errors[0], "Row 2: Empty value in column 'operation'");
    assert_eq!(r.errors[1], "Error parsing CSV: row 3 has no value for column 'iterations'");
    assert!(r.checksum.is_none());
}

#[test]
fn csv_invalid_utf8_is_a_reader_failure() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("bin.csv");
    let mut body = b"algorithm,operation\nML-KEM-512,".to_vec();
    body.extend_from_slice(&[0xff, 0xfe, b'\n']);
    fs::write(&p, body).unwrap();
    let r = CsvValidator::default().validate(&p);
    assert!(!r.valid);
    assert!(r.errors.last().unwrap().starts_with("Error parsing CSV"), "{:?}", r.errors);
    assert!(r.checksum.is_none());
}

#[test]
fn validation_is_deterministic() {
    let td = tempfile::tempdir().unwrap();
    let p = write(td.path(), "r.csv", "algorithm,operation,mean\nA,,-1\n");
    let v = Validator::for_path(&p).unwrap();
    let a = v.validate(&p);
    let b = v.validate(&p);
    assert_eq!(a, b);
    assert_eq!(a.checksum.as_deref(), Some(v.checksum(&p).unwrap().as_str()));
}
