//! Plan document parser.
//!
//! A single-pass state machine over the block token stream that builds a
//! [`StreamDocument`] tree. Heading depth maps to tree role (depth 3 =
//! stage, depth 5 = batch, depth 6 = thread); depth-4 headings select the
//! active stage subsection, and a depth-4 heading that matches no known
//! subsection clears it so prose under ad hoc headings is dropped instead
//! of leaking into the preceding subsection's buffers.
//!
//! The only fatal condition is a missing `Plan: {name}` title heading.
//! Malformed stage/batch/thread headings are skipped so partial documents
//! still parse.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::tokenize::{Block, ListItem, tokenize};

use super::model::{
    BatchDefinition, StageDefinition, StageQuestion, StreamDocument, ThreadDefinition,
};

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^plan\s*:\s*(.+)$").expect("valid regex"));
static STAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^stage\s+(\d+)\s*:\s*(.+)$").expect("valid regex"));
static BATCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^batch\s+(\d+)\s*:\s*(.+)$").expect("valid regex"));
static THREAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^thread\s+(\d+)\s*:\s*(.+)$").expect("valid regex"));
static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\*\*(summary|details)\s*:?\s*\*\*\s*:?\s*").expect("valid regex"));
static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([ xX])\]\s*(.*)$").expect("valid regex"));

/// Errors that abort parsing. Everything recoverable degrades to a skipped
/// node or an empty field instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document has no `# Plan: {{name}}` title heading")]
    MissingTitle,
}

/// Parse raw plan document text into a [`StreamDocument`] tree.
pub fn parse_document(source: &str) -> Result<StreamDocument, ParseError> {
    let blocks = tokenize(source);

    // First depth-1 heading matching the title pattern wins.
    let stream_name = blocks
        .iter()
        .find_map(|block| match block {
            Block::Heading { depth: 1, text } => TITLE_RE
                .captures(text.trim())
                .map(|c| c[1].trim().to_string()),
            _ => None,
        })
        .ok_or(ParseError::MissingTitle)?;

    let mut summary_buf: Vec<String> = Vec::new();
    let mut references: Vec<String> = Vec::new();
    let mut stages: Vec<StageDefinition> = Vec::new();
    let mut section = TopSection::Preamble;
    let mut state = StageState::default();

    for block in &blocks {
        // Depth-1/2 headings delimit the top-level sections.
        if let Block::Heading { depth, text } = block
            && *depth <= 2
        {
            if section == TopSection::Stages {
                state.flush_stage(&mut stages);
            }
            section = if *depth == 2 {
                TopSection::classify(text.trim())
            } else {
                TopSection::Preamble
            };
            continue;
        }

        match section {
            TopSection::Summary => {
                if let Block::Paragraph { text } = block
                    && !is_comment_only(text)
                {
                    summary_buf.push(text.clone());
                }
            }
            TopSection::References => match block {
                Block::List { items } => {
                    references.extend(items.iter().map(|i| i.text.clone()));
                }
                Block::Paragraph { text } if !is_comment_only(text) => {
                    references.push(text.clone());
                }
                _ => {}
            },
            TopSection::Stages => state.consume(block, &mut stages),
            TopSection::Preamble | TopSection::Other => {}
        }
    }
    state.flush_stage(&mut stages);

    debug!(
        stream = %stream_name,
        stages = stages.len(),
        "parsed plan document"
    );

    Ok(StreamDocument {
        stream_name,
        summary: join_prose(&summary_buf),
        references,
        stages,
    })
}

/// True when a paragraph is nothing but an HTML comment (placeholder text).
pub(crate) fn is_comment_only(text: &str) -> bool {
    let t = text.trim();
    t.starts_with("<!--") && t.ends_with("-->")
}

fn join_prose(buf: &[String]) -> String {
    buf.join("\n").trim().to_string()
}

// -----------------------------------------------------------------------
// Section and subsection states
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum TopSection {
    Preamble,
    Summary,
    References,
    Stages,
    Other,
}

impl TopSection {
    fn classify(heading: &str) -> Self {
        if heading.eq_ignore_ascii_case("summary") {
            Self::Summary
        } else if heading.eq_ignore_ascii_case("references") {
            Self::References
        } else if heading.eq_ignore_ascii_case("stages") {
            Self::Stages
        } else {
            Self::Other
        }
    }
}

/// Active subsection within a stage, selected by depth-4 headings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Subsection {
    #[default]
    None,
    Definition,
    Constitution,
    Questions,
    Batches,
}

impl Subsection {
    /// Case-insensitive substring match on the heading text. Unrecognized
    /// headings map to `None`, which drops the prose beneath them.
    fn classify(heading: &str) -> Self {
        let lower = heading.to_ascii_lowercase();
        if lower.contains("definition") {
            Self::Definition
        } else if lower.contains("constitution") {
            Self::Constitution
        } else if lower.contains("questions") {
            Self::Questions
        } else if lower.contains("batches") || lower.contains("threads") {
            Self::Batches
        } else {
            Self::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum ThreadField {
    #[default]
    Summary,
    Details,
}

// -----------------------------------------------------------------------
// Accumulators
// -----------------------------------------------------------------------

#[derive(Default)]
struct ThreadAccum {
    id: u32,
    name: String,
    summary: Vec<String>,
    details: Vec<String>,
    active: ThreadField,
}

impl ThreadAccum {
    fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            ..Self::default()
        }
    }

    fn active_buf(&mut self) -> &mut Vec<String> {
        match self.active {
            ThreadField::Summary => &mut self.summary,
            ThreadField::Details => &mut self.details,
        }
    }

    /// Route a paragraph, honoring a leading bold `Summary`/`Details` label:
    /// the label switches the active buffer and is stripped from the text.
    fn push_paragraph(&mut self, text: &str) {
        if let Some(caps) = LABEL_RE.captures(text) {
            self.active = if caps[1].eq_ignore_ascii_case("details") {
                ThreadField::Details
            } else {
                ThreadField::Summary
            };
            let matched_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let rest = text[matched_len..].trim();
            if !rest.is_empty() && !is_comment_only(rest) {
                self.active_buf().push(rest.to_string());
            }
            return;
        }
        self.active_buf().push(text.to_string());
    }

    fn finish(self) -> ThreadDefinition {
        ThreadDefinition {
            id: self.id,
            name: self.name,
            summary: join_prose(&self.summary),
            details: join_prose(&self.details),
        }
    }
}

#[derive(Default)]
struct BatchAccum {
    id: u32,
    name: String,
    summary: Vec<String>,
    threads: Vec<ThreadDefinition>,
    current: Option<ThreadAccum>,
}

impl BatchAccum {
    fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            ..Self::default()
        }
    }

    fn flush_thread(&mut self) {
        if let Some(thread) = self.current.take() {
            self.threads.push(thread.finish());
        }
    }

    fn finish(mut self) -> BatchDefinition {
        self.flush_thread();
        BatchDefinition {
            id: self.id,
            name: self.name,
            summary: join_prose(&self.summary),
            threads: self.threads,
        }
    }
}

#[derive(Default)]
struct StageAccum {
    id: u32,
    name: String,
    definition: Vec<String>,
    constitution: Vec<String>,
    questions: Vec<StageQuestion>,
    batches: Vec<BatchDefinition>,
    current: Option<BatchAccum>,
}

impl StageAccum {
    fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            ..Self::default()
        }
    }

    fn flush_batch(&mut self) {
        if let Some(batch) = self.current.take() {
            self.batches.push(batch.finish());
        }
    }

    fn finish(mut self) -> StageDefinition {
        self.flush_batch();
        StageDefinition {
            id: self.id,
            name: self.name,
            definition: join_prose(&self.definition),
            constitution: join_prose(&self.constitution),
            questions: self.questions,
            batches: self.batches,
        }
    }
}

// -----------------------------------------------------------------------
// Stage-section state machine
// -----------------------------------------------------------------------

/// The explicit parser state threaded through the Stages-section loop.
#[derive(Default)]
struct StageState {
    current: Option<StageAccum>,
    subsection: Subsection,
}

impl StageState {
    fn flush_stage(&mut self, stages: &mut Vec<StageDefinition>) {
        if let Some(stage) = self.current.take() {
            stages.push(stage.finish());
        }
        self.subsection = Subsection::None;
    }

    fn consume(&mut self, block: &Block, stages: &mut Vec<StageDefinition>) {
        match block {
            Block::Heading { depth, text } => self.heading(*depth, text.trim(), stages),
            Block::Paragraph { text } => self.paragraph(text),
            Block::List { items } => self.list(items),
            Block::CodeBlock { lang, code } => self.code_block(lang.as_deref(), code),
        }
    }

    fn heading(&mut self, depth: u8, text: &str, stages: &mut Vec<StageDefinition>) {
        match depth {
            3 => {
                // Malformed stage headings are skipped; no node is created.
                // An id too large for u32 counts as malformed.
                if let Some(caps) = STAGE_RE.captures(text)
                    && let Ok(id) = caps[1].parse()
                {
                    self.flush_stage(stages);
                    self.current = Some(StageAccum::new(id, caps[2].trim().to_string()));
                }
            }
            4 => {
                if let Some(stage) = self.current.as_mut() {
                    // Leaving the batches subsection closes the open batch.
                    stage.flush_batch();
                    self.subsection = Subsection::classify(text);
                }
            }
            5 => {
                if self.subsection == Subsection::Batches
                    && let Some(stage) = self.current.as_mut()
                    && let Some(caps) = BATCH_RE.captures(text)
                    && let Ok(id) = caps[1].parse()
                {
                    stage.flush_batch();
                    stage.current = Some(BatchAccum::new(id, caps[2].trim().to_string()));
                }
            }
            6 => {
                if let Some(batch) = self.current.as_mut().and_then(|s| s.current.as_mut())
                    && let Some(caps) = THREAD_RE.captures(text)
                    && let Ok(id) = caps[1].parse()
                {
                    batch.flush_thread();
                    batch.current = Some(ThreadAccum::new(id, caps[2].trim().to_string()));
                }
            }
            _ => {}
        }
    }

    fn paragraph(&mut self, text: &str) {
        if is_comment_only(text) {
            return;
        }
        let Some(stage) = self.current.as_mut() else {
            return;
        };
        if let Some(batch) = stage.current.as_mut() {
            match batch.current.as_mut() {
                Some(thread) => thread.push_paragraph(text),
                None => batch.summary.push(text.to_string()),
            }
            return;
        }
        match self.subsection {
            Subsection::Definition => stage.definition.push(text.to_string()),
            Subsection::Constitution => stage.constitution.push(text.to_string()),
            Subsection::Questions => stage.questions.push(StageQuestion {
                question: text.to_string(),
                resolved: false,
            }),
            Subsection::Batches | Subsection::None => {}
        }
    }

    fn list(&mut self, items: &[ListItem]) {
        let Some(stage) = self.current.as_mut() else {
            return;
        };
        if let Some(batch) = stage.current.as_mut() {
            let rendered = items.iter().map(render_item);
            match batch.current.as_mut() {
                Some(thread) => thread.active_buf().extend(rendered),
                None => batch.summary.extend(rendered),
            }
            return;
        }
        match self.subsection {
            Subsection::Questions => {
                stage.questions.extend(items.iter().map(question_from_item));
            }
            Subsection::Definition => stage.definition.extend(items.iter().map(render_item)),
            Subsection::Constitution => stage.constitution.extend(items.iter().map(render_item)),
            Subsection::Batches | Subsection::None => {}
        }
    }

    /// Code fences are only meaningful inside a thread's details buffer.
    fn code_block(&mut self, lang: Option<&str>, code: &str) {
        if let Some(thread) = self
            .current
            .as_mut()
            .and_then(|s| s.current.as_mut())
            .and_then(|b| b.current.as_mut())
            && thread.active == ThreadField::Details
        {
            let newline = if code.ends_with('\n') { "" } else { "\n" };
            thread.details.push(format!(
                "```{}\n{code}{newline}```",
                lang.unwrap_or_default()
            ));
        }
    }
}

/// Re-render a list item as a prefixed prose line so detail text
/// round-trips as prose.
fn render_item(item: &ListItem) -> String {
    match item.checked {
        Some(true) => format!("- [x] {}", item.text),
        Some(false) => format!("- [ ] {}", item.text),
        None => format!("- {}", item.text),
    }
}

/// Build a stage question from a list item, preserving checklist state from
/// native syntax where present, else from a literal `[ ]`/`[x]` prefix,
/// else treating the item as an unresolved plain note.
fn question_from_item(item: &ListItem) -> StageQuestion {
    if let Some(resolved) = item.checked {
        return StageQuestion {
            question: item.text.clone(),
            resolved,
        };
    }
    if let Some(caps) = CHECKBOX_RE.captures(&item.text) {
        return StageQuestion {
            question: caps[2].trim().to_string(),
            resolved: !caps[1].trim().is_empty(),
        };
    }
    StageQuestion {
        question: item.text.clone(),
        resolved: false,
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_scenario() {
        let doc = parse_document(
            "# Plan: X\n## Summary\nS\n## Stages\n### Stage 1: A\n#### Stages Batches\n##### Batch 01: B\n###### Thread 01: T\n**Summary:** hi\n",
        )
        .expect("should parse");

        assert_eq!(doc.stream_name, "X");
        assert_eq!(doc.summary, "S");
        assert_eq!(doc.stages.len(), 1);

        let stage = &doc.stages[0];
        assert_eq!(stage.id, 1);
        assert_eq!(stage.name, "A");
        assert_eq!(stage.batches.len(), 1);

        let batch = &stage.batches[0];
        assert_eq!(batch.id, 1);
        assert_eq!(batch.name, "B");
        assert_eq!(batch.threads.len(), 1);

        let thread = &batch.threads[0];
        assert_eq!(thread.id, 1);
        assert_eq!(thread.name, "T");
        assert_eq!(thread.summary, "hi");
    }

    #[test]
    fn missing_title_is_fatal() {
        let err = parse_document("## Summary\nno title here\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingTitle));
    }

    #[test]
    fn first_title_heading_wins() {
        let doc = parse_document("# Plan: First\n\n# Plan: Second\n## Stages\n").unwrap();
        assert_eq!(doc.stream_name, "First");
    }

    #[test]
    fn missing_summary_section_records_empty_string() {
        let doc = parse_document("# Plan: X\n## Stages\n### Stage 1: A\n").unwrap();
        assert_eq!(doc.summary, "");
    }

    #[test]
    fn unknown_subsection_heading_drops_prose() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Definition\ndef text\n#### Risk Analysis\nleaky prose\n#### Questions\n- [ ] real question\n",
        )
        .unwrap();

        let stage = &doc.stages[0];
        assert_eq!(stage.definition, "def text");
        assert_eq!(stage.questions.len(), 1);
        assert_eq!(stage.questions[0].question, "real question");
        assert!(!stage.constitution.contains("leaky prose"));
        assert!(!stage.definition.contains("leaky prose"));
    }

    #[test]
    fn questions_preserve_checklist_state() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Questions\n- [ ] open one\n- [x] settled one\n- plain note\n",
        )
        .unwrap();

        let qs = &doc.stages[0].questions;
        assert_eq!(qs.len(), 3);
        assert!(!qs[0].resolved);
        assert_eq!(qs[0].question, "open one");
        assert!(qs[1].resolved);
        assert!(!qs[2].resolved);
        assert_eq!(qs[2].question, "plain note");
    }

    #[test]
    fn constitution_lists_become_prefixed_prose() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Constitution\nrule zero\n\n- keep diffs small\n- no drive-by renames\n",
        )
        .unwrap();

        let constitution = &doc.stages[0].constitution;
        assert!(constitution.contains("rule zero"));
        assert!(constitution.contains("- keep diffs small"));
        assert!(constitution.contains("- no drive-by renames"));
    }

    #[test]
    fn thread_details_label_switches_buffer() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Batches\n##### Batch 00: B\n###### Thread 00: T\n**Summary:** quick note\n\n**Details:**\n\nlong explanation\n\nmore detail\n",
        )
        .unwrap();

        let thread = &doc.stages[0].batches[0].threads[0];
        assert_eq!(thread.summary, "quick note");
        assert!(thread.details.contains("long explanation"));
        assert!(thread.details.contains("more detail"));
        assert!(!thread.summary.contains("long explanation"));
    }

    #[test]
    fn code_fence_reproduced_in_details() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Batches\n##### Batch 00: B\n###### Thread 00: T\n**Details:**\n\n```yaml\nkey: 1\n```\n",
        )
        .unwrap();

        let thread = &doc.stages[0].batches[0].threads[0];
        assert!(
            thread.details.contains("```yaml\nkey: 1\n```"),
            "details should keep the fence: {:?}",
            thread.details
        );
    }

    #[test]
    fn comment_only_paragraphs_are_filtered() {
        let doc = parse_document(
            "# Plan: X\n## Summary\n<!-- fill me in -->\n## Stages\n### Stage 1: A\n#### Definition\n<!-- placeholder -->\n",
        )
        .unwrap();

        assert_eq!(doc.summary, "");
        assert_eq!(doc.stages[0].definition, "");
    }

    #[test]
    fn malformed_stage_heading_is_skipped() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage one: bad\n### Stage 2: Good\n#### Definition\nd\n",
        )
        .unwrap();

        assert_eq!(doc.stages.len(), 1);
        assert_eq!(doc.stages[0].id, 2);
        assert_eq!(doc.stages[0].name, "Good");
    }

    #[test]
    fn overflowing_heading_ids_are_skipped() {
        // Ids past u32 are malformed headings, not id-zero nodes.
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 99999999999: Huge\n### Stage 2: Good\n#### Batches\n##### Batch 99999999999: H\n##### Batch 00: B\n###### Thread 99999999999: H\n###### Thread 00: T\n**Summary:** t\n",
        )
        .unwrap();

        assert_eq!(doc.stages.len(), 1);
        assert_eq!(doc.stages[0].id, 2);
        let batches = &doc.stages[0].batches;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].id, 0);
        assert_eq!(batches[0].threads.len(), 1);
        assert_eq!(batches[0].threads[0].id, 0);
    }

    #[test]
    fn batch_heading_outside_batches_subsection_is_skipped() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Definition\n##### Batch 00: stray\n",
        )
        .unwrap();
        assert!(doc.stages[0].batches.is_empty());
    }

    #[test]
    fn batch_summary_is_prose_before_threads() {
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Batches\n##### Batch 00: B\nbatch intro\n###### Thread 00: T\n**Summary:** t\n",
        )
        .unwrap();

        let batch = &doc.stages[0].batches[0];
        assert_eq!(batch.summary, "batch intro");
        assert_eq!(batch.threads.len(), 1);
    }

    #[test]
    fn references_collects_list_items_in_order() {
        let doc = parse_document(
            "# Plan: X\n## References\n- design doc\n- incident report\n## Stages\n",
        )
        .unwrap();
        assert_eq!(doc.references, vec!["design doc", "incident report"]);
    }

    #[test]
    fn stage_id_taken_verbatim_from_heading() {
        let doc = parse_document("# Plan: X\n## Stages\n### Stage 7: Seven\n").unwrap();
        assert_eq!(doc.stages[0].id, 7);
    }

    #[test]
    fn prose_after_batches_returns_to_named_subsection() {
        // A depth-4 heading after the batches subsection closes the open
        // batch; prose then routes to the newly named subsection.
        let doc = parse_document(
            "# Plan: X\n## Stages\n### Stage 1: A\n#### Batches\n##### Batch 00: B\nbatch prose\n#### Questions\n- [ ] follow-up\n",
        )
        .unwrap();

        let stage = &doc.stages[0];
        assert_eq!(stage.batches.len(), 1);
        assert_eq!(stage.batches[0].summary, "batch prose");
        assert_eq!(stage.questions.len(), 1);
    }
}
