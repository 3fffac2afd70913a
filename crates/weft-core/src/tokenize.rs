//! Block-level tokenizer over raw plan document text.
//!
//! Wraps pulldown-cmark and flattens its event stream into the four block
//! shapes the document parser consumes: headings, paragraphs, lists, and
//! fenced code blocks. Paragraph tokens carry the raw source slice so that
//! inline markers (bold labels, backticked paths, HTML comments) survive
//! verbatim. Pure function; no state is carried between documents.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// A block-level token produced from the raw document text.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Heading with its depth (1-6) and inline text.
    Heading { depth: u8, text: String },
    /// Paragraph, as the raw source slice with inline markers intact.
    Paragraph { text: String },
    /// List; nested items are flattened in document order.
    List { items: Vec<ListItem> },
    /// Fenced code block with its language tag.
    CodeBlock { lang: Option<String>, code: String },
}

/// One list item, with task-list state when checklist syntax is present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    pub text: String,
    pub checked: Option<bool>,
}

/// Tokenize a document into an ordered block sequence.
pub fn tokenize(source: &str) -> Vec<Block> {
    let mut events = Parser::new_ext(source, Options::ENABLE_TASKLISTS).into_offset_iter();
    let mut blocks = Vec::new();

    while let Some((event, range)) = events.next() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let text = collect_inline(&mut events, TagEnd::Heading(level));
                blocks.push(Block::Heading {
                    depth: level as u8,
                    text,
                });
            }
            Event::Start(Tag::Paragraph) => {
                skip_to(&mut events, TagEnd::Paragraph);
                blocks.push(Block::Paragraph {
                    text: source[range].trim().to_string(),
                });
            }
            Event::Start(Tag::HtmlBlock) => {
                skip_to(&mut events, TagEnd::HtmlBlock);
                // Raw HTML blocks (typically placeholder comments) surface as
                // paragraphs so the parser's comment filter sees them.
                blocks.push(Block::Paragraph {
                    text: source[range].trim().to_string(),
                });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(tag) if !tag.is_empty() => Some(tag.to_string()),
                    _ => None,
                };
                let code = collect_code(&mut events);
                blocks.push(Block::CodeBlock { lang, code });
            }
            Event::Start(Tag::List(_)) => {
                blocks.push(Block::List {
                    items: collect_list(&mut events),
                });
            }
            _ => {}
        }
    }

    blocks
}

/// Accumulate the inline text of an element until its end tag.
fn collect_inline<'a, I>(events: &mut I, end: TagEnd) -> String
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut text = String::new();
    for (event, _) in events.by_ref() {
        match event {
            Event::End(tag) if tag == end => break,
            Event::Text(t) => text.push_str(&t),
            Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Consume events until the given end tag, discarding content.
fn skip_to<'a, I>(events: &mut I, end: TagEnd)
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    for (event, _) in events.by_ref() {
        if matches!(event, Event::End(tag) if tag == end) {
            break;
        }
    }
}

/// Accumulate the body of a code block until its end tag.
fn collect_code<'a, I>(events: &mut I) -> String
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut code = String::new();
    for (event, _) in events.by_ref() {
        match event {
            Event::End(TagEnd::CodeBlock) => break,
            Event::Text(t) => code.push_str(&t),
            _ => {}
        }
    }
    code
}

/// Collect list items until the matching list end tag, flattening nested
/// lists in document order. An item's own text is finalized as soon as a
/// child item begins, so parents precede children in the output.
fn collect_list<'a, I>(events: &mut I) -> Vec<ListItem>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut items = Vec::new();
    let mut current: Option<ListItem> = None;
    let mut depth = 0usize;

    for (event, _) in events.by_ref() {
        match event {
            Event::Start(Tag::Item) => {
                if let Some(item) = current.take() {
                    push_item(&mut items, item);
                }
                current = Some(ListItem::default());
            }
            Event::End(TagEnd::Item) => {
                if let Some(item) = current.take() {
                    push_item(&mut items, item);
                }
            }
            Event::Start(Tag::List(_)) => depth += 1,
            Event::End(TagEnd::List(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::TaskListMarker(done) => {
                if let Some(item) = current.as_mut() {
                    item.checked = Some(done);
                }
            }
            Event::Text(t) => {
                if let Some(item) = current.as_mut() {
                    item.text.push_str(&t);
                }
            }
            Event::Code(t) => {
                // Keep backticks so file references stay recognizable.
                if let Some(item) = current.as_mut() {
                    item.text.push('`');
                    item.text.push_str(&t);
                    item.text.push('`');
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(item) = current.as_mut() {
                    item.text.push(' ');
                }
            }
            _ => {}
        }
    }

    items
}

fn push_item(items: &mut Vec<ListItem>, item: ListItem) {
    let text = item.text.trim().to_string();
    if !text.is_empty() || item.checked.is_some() {
        items.push(ListItem {
            text,
            checked: item.checked,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_carry_depth_and_text() {
        let blocks = tokenize("# Plan: X\n\n### Stage 1: Alpha\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    depth: 1,
                    text: "Plan: X".to_string()
                },
                Block::Heading {
                    depth: 3,
                    text: "Stage 1: Alpha".to_string()
                },
            ]
        );
    }

    #[test]
    fn paragraphs_keep_inline_markers() {
        let blocks = tokenize("**Summary:** hi there\n");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                text: "**Summary:** hi there".to_string()
            }]
        );
    }

    #[test]
    fn html_comment_surfaces_as_paragraph() {
        let blocks = tokenize("<!-- placeholder -->\n");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                text: "<!-- placeholder -->".to_string()
            }]
        );
    }

    #[test]
    fn task_list_items_carry_checked_state() {
        let blocks = tokenize("- [ ] open item\n- [x] done item\n- plain note\n");
        let Block::List { items } = &blocks[0] else {
            panic!("expected a list, got: {blocks:?}");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].checked, Some(false));
        assert_eq!(items[0].text, "open item");
        assert_eq!(items[1].checked, Some(true));
        assert_eq!(items[2].checked, None);
        assert_eq!(items[2].text, "plain note");
    }

    #[test]
    fn fenced_code_block_keeps_language() {
        let blocks = tokenize("```yaml\nkey: value\n```\n");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                lang: Some("yaml".to_string()),
                code: "key: value\n".to_string()
            }]
        );
    }

    #[test]
    fn inline_code_in_items_keeps_backticks() {
        let blocks = tokenize("- touch `config.yaml` first\n");
        let Block::List { items } = &blocks[0] else {
            panic!("expected a list");
        };
        assert_eq!(items[0].text, "touch `config.yaml` first");
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(tokenize("").is_empty());
    }
}
