//! `weft questions` command: list open (unchecked) questions.

use std::path::Path;

use anyhow::Result;

use weft_core::analysis::find_open_questions;
use weft_core::document::read_document;

/// Run the questions command.
pub fn run_questions(path: &Path, json: bool) -> Result<()> {
    let source = read_document(path)?;
    let questions = find_open_questions(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No open questions.");
        return Ok(());
    }

    println!("{:<6} {:<8} QUESTION", "LINE", "STAGE");
    println!("{}", "-".repeat(60));
    for q in &questions {
        let stage = match q.stage {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        println!("{:<6} {:<8} {}", q.line, stage, q.text);
    }

    Ok(())
}
