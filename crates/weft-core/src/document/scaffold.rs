//! Template fragments for new documents, stages, batches, and threads.
//!
//! These templates are the only text this system renders; parsed trees are
//! never serialized back to markdown. Placeholder bodies are HTML comments
//! carrying the `weft:` marker so the validator can spot unedited
//! templates, and placeholder names use [`PLACEHOLDER_NAME`].

/// Name given to nodes created without an explicit name.
pub const PLACEHOLDER_NAME: &str = "TBD";

/// Marker prefix inside template placeholder comments.
pub const PLACEHOLDER_MARK: &str = "<!-- weft:";

/// Render a complete fresh plan document with one empty stage.
pub fn render_document(name: &str) -> String {
    format!(
        "# Plan: {name}\n\n\
         ## Summary\n\n\
         <!-- weft: one-paragraph description of this workstream -->\n\n\
         ## References\n\n\
         ## Stages\n\n\
         {}",
        stage_fragment(1, PLACEHOLDER_NAME)
    )
}

/// Stage fragment with its four subsection headings.
pub fn stage_fragment(id: u32, name: &str) -> String {
    format!(
        "### Stage {id}: {name}\n\n\
         #### Definition\n\n\
         <!-- weft: what this stage delivers -->\n\n\
         #### Constitution\n\n\
         <!-- weft: ground rules and rationale for this stage -->\n\n\
         #### Questions\n\n\
         #### Batches\n"
    )
}

/// Batch fragment; the id renders zero-padded to two digits.
pub fn batch_fragment(id: u32, name: &str) -> String {
    format!(
        "##### Batch {id:02}: {name}\n\n\
         <!-- weft: what these threads accomplish together -->\n"
    )
}

/// Thread fragment; the id renders zero-padded to two digits.
pub fn thread_fragment(id: u32, name: &str) -> String {
    format!(
        "###### Thread {id:02}: {name}\n\n\
         **Summary:** <!-- weft: one-line summary -->\n\n\
         **Details:**\n\n\
         <!-- weft: steps, files touched, expected outcome -->\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_document;

    #[test]
    fn fresh_document_reparses_cleanly() {
        let text = render_document("Rollout");
        let doc = parse_document(&text).expect("scaffold should parse");
        assert_eq!(doc.stream_name, "Rollout");
        assert_eq!(doc.stages.len(), 1);
        assert_eq!(doc.stages[0].id, 1);
        assert_eq!(doc.stages[0].name, PLACEHOLDER_NAME);
        // Placeholder comments are filtered from prose buffers.
        assert_eq!(doc.summary, "");
        assert_eq!(doc.stages[0].definition, "");
        assert!(doc.stages[0].questions.is_empty());
    }

    #[test]
    fn fragments_carry_zero_padded_ids() {
        assert!(batch_fragment(0, "x").starts_with("##### Batch 00: x"));
        assert!(batch_fragment(12, "x").starts_with("##### Batch 12: x"));
        assert!(thread_fragment(3, "y").starts_with("###### Thread 03: y"));
    }

    #[test]
    fn fragments_carry_placeholder_marks() {
        assert!(stage_fragment(1, "n").contains(PLACEHOLDER_MARK));
        assert!(batch_fragment(0, "n").contains(PLACEHOLDER_MARK));
        assert!(thread_fragment(0, "n").contains(PLACEHOLDER_MARK));
    }
}
