//! `weft inputs` command: list declared input files and flag missing ones.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use weft_core::analysis::{extract_input_file_references, find_missing_input_files};
use weft_core::document::read_document;

#[derive(Serialize)]
struct InputEntry {
    path: String,
    found: bool,
}

/// Run the inputs command.
///
/// Existence is checked relative to the plan file's directory, the current
/// directory, and the path as written.
pub fn run_inputs(path: &Path, json: bool) -> Result<()> {
    let source = read_document(path)?;
    let doc_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let cwd = std::env::current_dir()?;

    let references = extract_input_file_references(&source);
    let missing = find_missing_input_files(&source, doc_dir, &cwd);

    let entries: Vec<InputEntry> = references
        .into_iter()
        .map(|reference| {
            let found = !missing.contains(&reference);
            InputEntry {
                path: reference,
                found,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No input files declared.");
        return Ok(());
    }

    for entry in &entries {
        let mark = if entry.found { "ok     " } else { "MISSING" };
        println!("{mark} {}", entry.path);
    }

    Ok(())
}
