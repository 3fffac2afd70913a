//! Structural editors: append a stage, batch, or thread to a plan document.
//!
//! Each operation runs in two passes. The parsed tree supplies the sibling
//! count at the target level (the next id is the count of existing
//! siblings, so gaps from prior deletions are never reused), and an
//! independent line scan over the raw text finds the insertion boundary.
//! Splicing into the raw line array preserves every byte of the sections
//! the edit does not touch; the system deliberately has no tree-to-text
//! renderer.
//!
//! On failure the input text is returned untouched inside the error path:
//! no partial output exists, so callers can guarantee the file on disk is
//! unmodified.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::parser::{ParseError, parse_document};
use super::scaffold;

/// Heading line for a stage, capturing its id.
pub(crate) static STAGE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^###\s+stage\s+(\d+)\s*:").expect("valid regex"));
/// Heading line for a batch, capturing its id.
pub(crate) static BATCH_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#####\s+batch\s+(\d+)\s*:").expect("valid regex"));

static STAGES_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^##\s+stages\s*$").expect("valid regex"));
static BATCHES_SUBSECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^####\s+.*(batches|threads)").expect("valid regex"));

// Boundary patterns: a heading at the given depth or shallower ends the
// enclosing block. Deeper headings have more hashes before the space and
// therefore do not match.
static H2_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,2}\s").expect("valid regex"));
static H3_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,3}\s").expect("valid regex"));
static H5_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,5}\s").expect("valid regex"));

/// Errors from append operations. The source text is never modified when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("stage {0} not found in document")]
    StageNotFound(u32),

    #[error("batch {batch} not found in stage {stage}")]
    BatchNotFound { stage: u32, batch: u32 },
}

/// Outcome of a successful append: the new node's id and the full
/// replacement text.
#[derive(Debug, Clone)]
pub struct AppendResult {
    pub id: u32,
    pub text: String,
}

/// Append a new stage at the end of the `## Stages` section.
///
/// Stage ids are 1-based: the new stage's id is the count of existing
/// stages plus one. A document without a Stages section gets one appended
/// at end of file.
pub fn append_stage(source: &str, name: &str) -> Result<AppendResult, EditError> {
    let doc = parse_document(source)?;
    let id = doc.stages.len() as u32 + 1;
    let fragment = scaffold::stage_fragment(id, name);

    let lines = split_lines(source);
    let fenced = fenced_lines(&lines);
    let Some(start) =
        (0..lines.len()).find(|&i| !fenced[i] && STAGES_HEADING_RE.is_match(lines[i]))
    else {
        let mut text = source.trim_end().to_string();
        text.push_str("\n\n## Stages\n\n");
        text.push_str(fragment.trim_matches('\n'));
        text.push('\n');
        return Ok(AppendResult { id, text });
    };

    let end = block_end(&lines, &fenced, start, &H2_BOUNDARY_RE);
    debug!(stage = id, line = end, "appending stage");
    Ok(AppendResult {
        id,
        text: splice(&lines, end, &fragment),
    })
}

/// Append a new batch at the end of the given stage's block.
///
/// Batch ids are 0-based: the new batch's id is the count of existing
/// batches in the stage, zero-padded to two digits in the heading. If the
/// stage has no batches subsection heading yet, one is inserted with the
/// fragment.
pub fn append_batch(source: &str, stage_id: u32, name: &str) -> Result<AppendResult, EditError> {
    let doc = parse_document(source)?;
    let stage = doc
        .stage(stage_id)
        .ok_or(EditError::StageNotFound(stage_id))?;
    let id = stage.batches.len() as u32;

    let lines = split_lines(source);
    let fenced = fenced_lines(&lines);
    let start =
        find_stage_line(&lines, &fenced, stage_id).ok_or(EditError::StageNotFound(stage_id))?;
    let end = block_end(&lines, &fenced, start, &H3_BOUNDARY_RE);

    let mut fragment = scaffold::batch_fragment(id, name);
    if !(start..end).any(|i| !fenced[i] && BATCHES_SUBSECTION_RE.is_match(lines[i])) {
        fragment = format!("#### Batches\n\n{}", fragment.trim_start_matches('\n'));
    }

    debug!(stage = stage_id, batch = id, line = end, "appending batch");
    Ok(AppendResult {
        id,
        text: splice(&lines, end, &fragment),
    })
}

/// Append a new thread at the end of the given batch's block.
///
/// Thread ids are 0-based within their batch; a batch with no threads gets
/// thread number zero.
pub fn append_thread(
    source: &str,
    stage_id: u32,
    batch_id: u32,
    name: &str,
) -> Result<AppendResult, EditError> {
    let doc = parse_document(source)?;
    let stage = doc
        .stage(stage_id)
        .ok_or(EditError::StageNotFound(stage_id))?;
    let batch = stage.batch(batch_id).ok_or(EditError::BatchNotFound {
        stage: stage_id,
        batch: batch_id,
    })?;
    let id = batch.threads.len() as u32;

    let lines = split_lines(source);
    let fenced = fenced_lines(&lines);
    let stage_start =
        find_stage_line(&lines, &fenced, stage_id).ok_or(EditError::StageNotFound(stage_id))?;
    let stage_end = block_end(&lines, &fenced, stage_start, &H3_BOUNDARY_RE);

    let batch_start = (stage_start..stage_end)
        .find(|&i| !fenced[i] && heading_id(&BATCH_LINE_RE, lines[i]) == Some(batch_id))
        .ok_or(EditError::BatchNotFound {
            stage: stage_id,
            batch: batch_id,
        })?;
    let batch_end = (batch_start + 1..stage_end)
        .find(|&i| !fenced[i] && H5_BOUNDARY_RE.is_match(lines[i]))
        .unwrap_or(stage_end);

    let fragment = scaffold::thread_fragment(id, name);
    debug!(
        stage = stage_id,
        batch = batch_id,
        thread = id,
        line = batch_end,
        "appending thread"
    );
    Ok(AppendResult {
        id,
        text: splice(&lines, batch_end, &fragment),
    })
}

// -----------------------------------------------------------------------
// Line-level helpers
// -----------------------------------------------------------------------

/// Split into lines without the synthetic empty tail a trailing newline
/// produces; [`splice`] restores the final newline.
fn split_lines(source: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Mark every line that sits inside a fenced code block, the fence
/// delimiter lines included. Thread details legitimately contain fences,
/// and a `#`-prefixed line inside one (a shell comment, say) must never be
/// taken for a heading boundary.
fn fenced_lines(lines: &[&str]) -> Vec<bool> {
    let mut mask = vec![false; lines.len()];
    let mut open = false;
    for (i, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("```") {
            mask[i] = true;
            open = !open;
        } else {
            mask[i] = open;
        }
    }
    mask
}

/// First unfenced line after `start` that matches the boundary pattern,
/// else end of input. This is the exclusive end of the block owned by the
/// heading at `start`.
fn block_end(lines: &[&str], fenced: &[bool], start: usize, boundary: &Regex) -> usize {
    (start + 1..lines.len())
        .find(|&i| !fenced[i] && boundary.is_match(lines[i]))
        .unwrap_or(lines.len())
}

fn find_stage_line(lines: &[&str], fenced: &[bool], stage_id: u32) -> Option<usize> {
    (0..lines.len()).find(|&i| !fenced[i] && heading_id(&STAGE_LINE_RE, lines[i]) == Some(stage_id))
}

/// Numeric id captured by a heading pattern, so `Batch 01` and `Batch 1`
/// compare equal.
pub(crate) fn heading_id(re: &Regex, line: &str) -> Option<u32> {
    re.captures(line).and_then(|c| c[1].parse().ok())
}

/// Insert the fragment's lines at the boundary index, adding a blank
/// separator line on either side where the neighbors are not already
/// blank. All original lines pass through byte-for-byte.
fn splice(lines: &[&str], at: usize, fragment: &str) -> String {
    let fragment = fragment.trim_matches('\n');
    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 16);
    out.extend_from_slice(&lines[..at]);
    if at > 0 && !lines[at - 1].trim().is_empty() {
        out.push("");
    }
    out.extend(fragment.split('\n'));
    if at < lines.len() && !lines[at].trim().is_empty() {
        out.push("");
    }
    out.extend_from_slice(&lines[at..]);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
