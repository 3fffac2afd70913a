//! Core library for maintaining hierarchical workstream plan documents.
//!
//! A plan is a markdown file with a fixed heading discipline: one stream,
//! its stages, their batches, and the threads inside each batch. This
//! crate parses that shape into a typed tree, validates it, performs
//! structural edits as surgical text splices on the original bytes, and
//! offers a few read-only analyses over the raw text.

pub mod analysis;
pub mod document;
pub mod tokenize;

pub use document::{
    BatchDefinition, StageDefinition, StageQuestion, StreamDocument, ThreadDefinition,
    ValidationReport, parse_document, validate_document,
};
