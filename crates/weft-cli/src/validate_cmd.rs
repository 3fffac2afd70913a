//! `weft validate` command: check a plan and report errors and warnings.

use std::path::Path;

use anyhow::{Result, bail};

use weft_core::document::validate_file;

/// Run the validate command. Exits nonzero (via error) when the document
/// has blocking errors; warnings alone still succeed.
pub fn run_validate(path: &Path, json: bool) -> Result<()> {
    let report = validate_file(path)?;

    if json {
        let payload = serde_json::json!({
            "valid": report.is_valid(),
            "errors": report.errors,
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for error in &report.errors {
            println!("error: {error}");
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        if report.errors.is_empty() && report.warnings.is_empty() {
            println!("{}: ok", path.display());
        }
    }

    if !report.is_valid() {
        bail!(
            "{}: {} error(s), {} warning(s)",
            path.display(),
            report.errors.len(),
            report.warnings.len()
        );
    }
    Ok(())
}
