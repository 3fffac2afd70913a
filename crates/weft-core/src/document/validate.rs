//! Plan document validation.
//!
//! Structural completeness is the only blocking check: a plan with zero
//! stages is useless. Everything else is a warning so that validation
//! always returns partial, actionable feedback. A raw-text pass backs the
//! cross-cutting checks that need line numbers or inline markers the tree
//! no longer carries.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::analysis::extract_path_tokens;

use super::model::{BatchDefinition, StageDefinition, StreamDocument};
use super::scaffold::{PLACEHOLDER_MARK, PLACEHOLDER_NAME};

/// Validation outcome: blocking errors and advisory warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a parsed document against its raw text.
pub fn validate_document(doc: &StreamDocument, source: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    if doc.stages.is_empty() {
        report.errors.push("plan has no stages".to_string());
    }

    if doc.summary.is_empty() {
        report
            .warnings
            .push("summary section is empty".to_string());
    }

    let mut seen_ids: HashMap<u32, usize> = HashMap::new();
    for stage in &doc.stages {
        *seen_ids.entry(stage.id).or_insert(0) += 1;
        check_stage(stage, &mut report);
    }
    for (id, count) in seen_ids {
        if count > 1 {
            report
                .warnings
                .push(format!("stage id {id} appears {count} times"));
        }
    }

    check_placeholders(source, &mut report);

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated plan document"
    );
    report
}

fn is_placeholder_name(name: &str) -> bool {
    name.is_empty() || name == PLACEHOLDER_NAME
}

fn check_stage(stage: &StageDefinition, report: &mut ValidationReport) {
    if is_placeholder_name(&stage.name) {
        report
            .warnings
            .push(format!("stage {} has a placeholder name", stage.id));
    }
    if stage.definition.is_empty() {
        report
            .warnings
            .push(format!("stage {} has no definition", stage.id));
    }
    if stage.total_threads() == 0 {
        report
            .warnings
            .push(format!("stage {} has no threads in any batch", stage.id));
    }

    for batch in &stage.batches {
        for thread in &batch.threads {
            if is_placeholder_name(&thread.name) {
                report.warnings.push(format!(
                    "stage {} batch {}: thread {} has a placeholder name",
                    stage.id,
                    batch.prefix(),
                    thread.id
                ));
            }
        }
        lint_shared_files(stage.id, batch, report);
    }
}

/// Flag files referenced by more than one thread of the same batch.
///
/// Threads within a batch are intended to run concurrently, so two threads
/// touching the same file is a potential write-write or read-write race.
/// Advisory only.
fn lint_shared_files(stage_id: u32, batch: &BatchDefinition, report: &mut ValidationReport) {
    if batch.threads.len() < 2 {
        return;
    }

    // Normalized path -> (display form, referencing thread names).
    let mut refs: HashMap<String, (String, Vec<String>)> = HashMap::new();
    for thread in &batch.threads {
        let prose = format!("{}\n{}", thread.summary, thread.details);
        for token in extract_path_tokens(&prose) {
            let key = token.to_ascii_lowercase();
            let entry = refs.entry(key).or_insert_with(|| (token, Vec::new()));
            if !entry.1.contains(&thread.name) {
                entry.1.push(thread.name.clone());
            }
        }
    }

    let mut shared: Vec<(String, Vec<String>)> =
        refs.into_values().filter(|(_, names)| names.len() > 1).collect();
    shared.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, names) in shared {
        report.warnings.push(format!(
            "stage {} batch {}: file `{}` is referenced by threads {}",
            stage_id,
            batch.prefix(),
            path,
            names.join(", ")
        ));
    }
}

/// Warn about unedited template placeholder comments left in the raw text.
fn check_placeholders(source: &str, report: &mut ValidationReport) {
    let lines: Vec<String> = source
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(PLACEHOLDER_MARK))
        .map(|(idx, _)| (idx + 1).to_string())
        .collect();
    if !lines.is_empty() {
        report.warnings.push(format!(
            "template placeholder text remains on line(s) {}",
            lines.join(", ")
        ));
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
