//! Analysis utilities over raw plan text.
//!
//! These scans never fail; absent patterns simply yield empty results.
//! They operate line-by-line on the raw text rather than the parsed tree
//! so they can report 1-based line numbers back to the reader.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::document::edit::STAGE_LINE_RE;

static UNCHECKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*+]\s*\[ \]\s*(.*)$").expect("valid regex"));
static INPUTS_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:#{1,6}\s+inputs\b.*|\*\*inputs\s*:?\s*\*\*\s*:?\s*.*)$")
        .expect("valid regex")
});
static ANY_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s").expect("valid regex"));
static BOLD_LABEL_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*[^*\n]+\*\*").expect("valid regex"));

static BACKTICK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(\s*([^)\s]+?)\s*\)").expect("valid regex"));
static BARE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\.{0,2}/)?(?:[A-Za-z0-9_.-]+/)+[A-Za-z0-9_.-]+|[A-Za-z0-9_-]+(?:\.[A-Za-z0-9]+)+")
        .expect("valid regex")
});

/// An unchecked checklist line, with its position and enclosing stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenQuestion {
    /// 1-based line number in the document.
    pub line: usize,
    /// Id of the most recently seen stage heading, if any.
    pub stage: Option<u32>,
    pub text: String,
}

/// Scan for unchecked checklist items, tracking the enclosing stage.
pub fn find_open_questions(source: &str) -> Vec<OpenQuestion> {
    let mut current_stage = None;
    let mut out = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        if let Some(caps) = STAGE_LINE_RE.captures(line) {
            current_stage = caps[1].parse().ok();
        } else if let Some(caps) = UNCHECKED_RE.captures(line) {
            out.push(OpenQuestion {
                line: idx + 1,
                stage: current_stage,
                text: caps[1].trim().to_string(),
            });
        }
    }
    out
}

/// Extract file-path-like tokens from the document's `Inputs` sub-blocks.
///
/// A sub-block starts at a heading or bold label reading `Inputs` and runs
/// until the next heading or bold label. Tokens are matched as
/// backtick-quoted paths, markdown link targets, and bare path-like words,
/// then deduplicated case-insensitively in first-seen order.
pub fn extract_input_file_references(source: &str) -> Vec<String> {
    let mut scope = String::new();
    let mut in_inputs = false;
    for line in source.lines() {
        let trimmed = line.trim();
        if INPUTS_MARKER_RE.is_match(trimmed) {
            in_inputs = true;
            scope.push_str(trimmed);
            scope.push('\n');
        } else if in_inputs
            && (ANY_HEADING_RE.is_match(trimmed) || BOLD_LABEL_LINE_RE.is_match(trimmed))
        {
            in_inputs = false;
        } else if in_inputs {
            scope.push_str(line);
            scope.push('\n');
        }
    }
    extract_path_tokens(&scope)
}

/// Check every declared input file against three candidate resolutions:
/// relative to the document's directory, relative to the project root, and
/// as given. A path missing from all three is reported.
pub fn find_missing_input_files(source: &str, doc_dir: &Path, project_root: &Path) -> Vec<String> {
    extract_input_file_references(source)
        .into_iter()
        .filter(|reference| {
            let candidates = [
                doc_dir.join(reference),
                project_root.join(reference),
                Path::new(reference).to_path_buf(),
            ];
            !candidates.iter().any(|p| p.exists())
        })
        .collect()
}

/// Extract path-like tokens from arbitrary prose, in first-seen order with
/// case-insensitive deduplication. Shared with the validator's shared-file
/// lint.
pub(crate) fn extract_path_tokens(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut push = |raw: &str, force: bool| {
        let token = normalize_token(raw);
        if token.is_empty() || (!force && !looks_like_path(&token)) {
            return;
        }
        if seen.insert(token.to_ascii_lowercase()) {
            out.push(token);
        }
    };

    for caps in BACKTICK_RE.captures_iter(text) {
        push(&caps[1], false);
    }
    for caps in LINK_RE.captures_iter(text) {
        let target = &caps[1];
        let force = target.starts_with("file://");
        push(target.trim_start_matches("file://"), force);
    }
    for m in BARE_PATH_RE.find_iter(text) {
        push(m.as_str(), false);
    }

    out
}

fn normalize_token(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['.', ',', ';', ':'])
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

/// Heuristic for "this token names a file": it has a path separator, or a
/// short extension containing at least one letter (which rejects version
/// numbers and abbreviations like `e.g.`).
fn looks_like_path(token: &str) -> bool {
    if token.contains(char::is_whitespace) {
        return false;
    }
    if token.contains('/') {
        return true;
    }
    match token.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && (2..=8).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
