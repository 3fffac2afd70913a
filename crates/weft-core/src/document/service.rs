//! File-backed operations over plan documents.
//!
//! Each edit is read, transform, write: the document is read in full, the
//! pure splice runs in memory, and the file is rewritten only when the
//! splice succeeds. A failed transform leaves the file untouched. There is
//! no lock held across the read-modify-write gap, so concurrent writers
//! can race; plans are single-author documents in practice.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::edit::{append_batch, append_stage, append_thread};
use super::model::StreamDocument;
use super::parser::parse_document;
use super::validate::{ValidationReport, validate_document};

/// Read a plan file into raw text.
pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read plan file {}", path.display()))
}

/// Read and parse a plan file.
pub fn load_document(path: &Path) -> Result<StreamDocument> {
    let source = read_document(path)?;
    let doc = parse_document(&source)
        .with_context(|| format!("failed to parse plan file {}", path.display()))?;
    debug!(path = %path.display(), stages = doc.stages.len(), "loaded plan document");
    Ok(doc)
}

/// Read, parse, and validate a plan file.
pub fn validate_file(path: &Path) -> Result<ValidationReport> {
    let source = read_document(path)?;
    let doc = parse_document(&source)
        .with_context(|| format!("failed to parse plan file {}", path.display()))?;
    Ok(validate_document(&doc, &source))
}

/// Append a stage to the plan file, returning the new stage id.
pub fn append_stage_to_file(path: &Path, name: &str) -> Result<u32> {
    let source = read_document(path)?;
    let result = append_stage(&source, name)
        .with_context(|| format!("failed to append stage to {}", path.display()))?;
    write_document(path, &result.text)?;
    debug!(path = %path.display(), stage = result.id, "appended stage");
    Ok(result.id)
}

/// Append a batch to a stage in the plan file, returning the new batch id.
pub fn append_batch_to_file(path: &Path, stage_id: u32, name: &str) -> Result<u32> {
    let source = read_document(path)?;
    let result = append_batch(&source, stage_id, name)
        .with_context(|| format!("failed to append batch to {}", path.display()))?;
    write_document(path, &result.text)?;
    debug!(path = %path.display(), stage = stage_id, batch = result.id, "appended batch");
    Ok(result.id)
}

/// Append a thread to a batch in the plan file, returning the new thread id.
pub fn append_thread_to_file(path: &Path, stage_id: u32, batch_id: u32, name: &str) -> Result<u32> {
    let source = read_document(path)?;
    let result = append_thread(&source, stage_id, batch_id, name)
        .with_context(|| format!("failed to append thread to {}", path.display()))?;
    write_document(path, &result.text)?;
    debug!(
        path = %path.display(),
        stage = stage_id,
        batch = batch_id,
        thread = result.id,
        "appended thread"
    );
    Ok(result.id)
}

fn write_document(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write plan file {}", path.display()))
}
