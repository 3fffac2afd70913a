//! Plan document model, parser, validator, templates, and editors.

pub mod edit;
pub mod model;
pub mod parser;
pub mod scaffold;
pub mod service;
pub mod validate;

pub use edit::{AppendResult, EditError, append_batch, append_stage, append_thread};
pub use model::{
    BatchDefinition, StageDefinition, StageQuestion, StreamDocument, ThreadDefinition,
};
pub use parser::{ParseError, parse_document};
pub use scaffold::{
    PLACEHOLDER_NAME, batch_fragment, render_document, stage_fragment, thread_fragment,
};
pub use service::{
    append_batch_to_file, append_stage_to_file, append_thread_to_file, load_document,
    read_document, validate_file,
};
pub use validate::{ValidationReport, validate_document};
