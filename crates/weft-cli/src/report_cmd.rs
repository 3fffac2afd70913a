//! `weft report` command: show a structural summary of a plan document.

use std::path::Path;

use anyhow::{Context, Result};

use weft_core::analysis::find_open_questions;
use weft_core::document::{parse_document, read_document};

/// Run the report command.
pub fn run_report(path: &Path, json: bool) -> Result<()> {
    let source = read_document(path)?;
    let doc = parse_document(&source)
        .with_context(|| format!("failed to parse plan file {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Plan: {}", doc.stream_name);
    if !doc.summary.is_empty() {
        println!("Summary: {}", first_line(&doc.summary));
    }
    let open = find_open_questions(&source).len();
    println!("Stages: {}   Open questions: {open}", doc.stages.len());
    println!();

    println!(
        "{:<6} {:<30} {:>8} {:>8} {:>10}",
        "STAGE", "NAME", "BATCHES", "THREADS", "QUESTIONS"
    );
    println!("{}", "-".repeat(66));

    for stage in &doc.stages {
        let name_display = if stage.name.len() > 28 {
            format!("{}...", &stage.name[..25])
        } else {
            stage.name.clone()
        };
        println!(
            "{:<6} {:<30} {:>8} {:>8} {:>10}",
            stage.id,
            name_display,
            stage.batches.len(),
            stage.total_threads(),
            stage.questions.len()
        );
    }

    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
