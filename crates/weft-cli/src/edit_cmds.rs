//! `weft add-stage` / `add-batch` / `add-thread` commands.

use std::path::Path;

use anyhow::Result;

use weft_core::document::{append_batch_to_file, append_stage_to_file, append_thread_to_file};

pub fn run_add_stage(path: &Path, name: &str) -> Result<()> {
    let id = append_stage_to_file(path, name)?;
    println!("Added stage {id}: {name}");
    Ok(())
}

pub fn run_add_batch(path: &Path, stage: u32, name: &str) -> Result<()> {
    let id = append_batch_to_file(path, stage, name)?;
    println!("Added batch {id:02} to stage {stage}: {name}");
    Ok(())
}

pub fn run_add_thread(path: &Path, stage: u32, batch: u32, name: &str) -> Result<()> {
    let id = append_thread_to_file(path, stage, batch, name)?;
    println!("Added thread {id:02} to stage {stage} batch {batch:02}: {name}");
    Ok(())
}
