//! File-level workflows behind the CLI commands: create, grow, validate.

use weft_core::document::{
    append_batch_to_file, append_stage_to_file, append_thread_to_file, load_document,
    render_document, validate_file,
};

fn seed_plan(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join("PLAN.md");
    std::fs::write(&path, render_document(name)).expect("seed plan");
    path
}

#[test]
fn full_editing_workflow_keeps_the_plan_valid() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = seed_plan(&dir, "Migration");

    let stage = append_stage_to_file(&path, "Cutover").expect("add stage");
    let batch = append_batch_to_file(&path, stage, "Switch Traffic").expect("add batch");
    append_thread_to_file(&path, stage, batch, "Flip DNS").expect("add thread");
    append_thread_to_file(&path, stage, batch, "Watch Dashboards").expect("add thread");

    let doc = load_document(&path).expect("reload");
    let cutover = doc.stage(stage).expect("new stage");
    assert_eq!(cutover.batches[0].threads.len(), 2);

    let report = validate_file(&path).expect("validate");
    assert!(report.is_valid());
}

#[test]
fn edit_against_missing_stage_fails_cleanly() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = seed_plan(&dir, "Migration");
    let before = std::fs::read_to_string(&path).expect("read");

    let err = append_thread_to_file(&path, 7, 0, "Nope").expect_err("should fail");
    assert!(err.to_string().contains("append thread"));

    // The file is untouched after a failed edit.
    assert_eq!(std::fs::read_to_string(&path).expect("reread"), before);
}

#[test]
fn validate_reports_scaffold_placeholders() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = seed_plan(&dir, "Fresh");

    let report = validate_file(&path).expect("validate");
    assert!(report.is_valid());
    assert!(
        report
            .warnings
            .iter()
            .any(|w| w.contains("placeholder")),
        "warnings: {:?}",
        report.warnings
    );
}
