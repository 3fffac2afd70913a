//! `weft new` command: create a fresh plan document from the template.

use std::path::Path;

use anyhow::{Context, Result, bail};

use weft_core::document::render_document;

/// Run the new command.
pub fn run_new(path: &Path, name: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "plan file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, render_document(name))
        .with_context(|| format!("failed to write plan file {}", path.display()))?;

    println!("Plan written to {}", path.display());
    println!("Next: fill in the summary and stage 1, then run `weft validate`.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::document::parse_document;

    #[test]
    fn new_plan_is_written_and_parses() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("docs").join("PLAN.md");

        run_new(&path, "Rollout", false).unwrap();

        let source = std::fs::read_to_string(&path).unwrap();
        let doc = parse_document(&source).unwrap();
        assert_eq!(doc.stream_name, "Rollout");
    }

    #[test]
    fn existing_plan_requires_force() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("PLAN.md");
        std::fs::write(&path, "keep me").unwrap();

        let err = run_new(&path, "X", false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        run_new(&path, "X", true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("# Plan: X"));
    }
}
