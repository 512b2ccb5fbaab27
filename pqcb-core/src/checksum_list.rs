use crate::error::Result;
use crate::validation::ValidationResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const CHECKSUM_LIST_FILE: &str = "checksums.txt";

/// `sha256sum`-style listing: a commented header, then `<sha256>  <path>` for
/// every result that carries a checksum.
pub fn render_checksum_list(results: &[ValidationResult], generated: &str) -> String {
    let mut out = format!("# Checksums generated on {generated}\n# Total files: {}\n\n", results.len());
    for r in results {
        if let Some(sum) = &r.checksum {
            out.push_str(&format!("{sum}  {}\n", r.file_path));
        }
    }
    out
}

/// Write the listing to `path`; returns the number of checksum lines.
pub fn write_checksum_list(path: &Path, results: &[ValidationResult]) -> Result<usize> {
    let body = render_checksum_list(results, &chrono::Local::now().to_rfc3339());
    let mut f = File::create(path)?;
    f.write_all(body.as_bytes())?;
    Ok(results.iter().filter(|r| r.checksum.is_some()).count())
}
