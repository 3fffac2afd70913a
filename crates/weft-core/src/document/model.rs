//! Parsed document tree for a workstream plan.
//!
//! The tree is rebuilt from scratch on every parse and is never serialized
//! back to text; edits happen as surgical insertions into the raw document
//! (see [`super::edit`]) followed by a re-parse on the next read.

use serde::{Deserialize, Serialize};

/// Root of a parsed workstream plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDocument {
    /// Stream name, taken from the `Plan: {name}` title heading.
    pub stream_name: String,
    /// Summary section prose; empty when the section is missing or blank.
    pub summary: String,
    /// Free-text entries from the References section, in document order.
    pub references: Vec<String>,
    pub stages: Vec<StageDefinition>,
}

impl StreamDocument {
    /// Look up a stage by its heading id.
    pub fn stage(&self, id: u32) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.id == id)
    }
}

/// One stage of the workstream: prose sections plus child batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Taken verbatim from the `Stage {n}: ...` heading; the parser never
    /// assigns ids.
    pub id: u32,
    pub name: String,
    pub definition: String,
    /// Free-form planning-rationale block.
    pub constitution: String,
    pub questions: Vec<StageQuestion>,
    pub batches: Vec<BatchDefinition>,
}

impl StageDefinition {
    /// Look up a batch by id within this stage.
    pub fn batch(&self, id: u32) -> Option<&BatchDefinition> {
        self.batches.iter().find(|b| b.id == id)
    }

    /// Total thread count across all batches of this stage.
    pub fn total_threads(&self) -> usize {
        self.batches.iter().map(|b| b.threads.len()).sum()
    }
}

/// A group of threads intended to run concurrently within a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDefinition {
    pub id: u32,
    pub name: String,
    /// Prose preceding any thread heading.
    pub summary: String,
    pub threads: Vec<ThreadDefinition>,
}

impl BatchDefinition {
    /// Zero-padded two-digit form of the batch id, as rendered in headings.
    pub fn prefix(&self) -> String {
        format!("{:02}", self.id)
    }
}

/// A single unit of work within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDefinition {
    pub id: u32,
    pub name: String,
    pub summary: String,
    /// Long-form prose; embedded list items and code fences are reproduced
    /// as prose lines.
    pub details: String,
}

/// An open or resolved note attached to a stage.
///
/// Derived from checklist syntax where present; a plain list item becomes
/// an unresolved note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageQuestion {
    pub question: String,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_prefix_is_zero_padded() {
        let batch = BatchDefinition {
            id: 3,
            name: "b".to_string(),
            summary: String::new(),
            threads: Vec::new(),
        };
        assert_eq!(batch.prefix(), "03");
    }

    #[test]
    fn stage_lookup_by_id() {
        let doc = StreamDocument {
            stream_name: "x".to_string(),
            summary: String::new(),
            references: Vec::new(),
            stages: vec![StageDefinition {
                id: 2,
                name: "two".to_string(),
                definition: String::new(),
                constitution: String::new(),
                questions: Vec::new(),
                batches: Vec::new(),
            }],
        };
        assert!(doc.stage(2).is_some());
        assert!(doc.stage(1).is_none());
    }

    #[test]
    fn document_serializes_to_json() {
        let doc = StreamDocument {
            stream_name: "x".to_string(),
            summary: "s".to_string(),
            references: vec!["ref".to_string()],
            stages: Vec::new(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["stream_name"], "x");
        assert_eq!(json["stages"].as_array().unwrap().len(), 0);
    }
}
