//! Turns raw generator output into a document.
//!
//! # Invariants
//! - Output that does not start with a markup tag is split into paragraphs
//!   on blank lines.
//! - Callout detection works on blocks, never by rewriting markup strings.

use crate::generate::GenerationError;
use crate::model::document::{Block, BlockKind, Document};
use crate::model::html::parse_html;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```\s*$").expect("valid code fence regex")
});
static BLANK_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid blank line regex"));
static DEFINITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)definition\s*:").expect("valid definition regex"));
static EXAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(example\s*:|for example\b)").expect("valid example regex"));

/// Parses raw generator output.
///
/// # Errors
/// - `EmptyResponse` when the output carries no visible text.
pub fn normalize_response(raw: &str) -> Result<Document, GenerationError> {
    let trimmed = raw.trim();
    let body = CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |inner| inner.as_str().trim());

    let document = if body.starts_with('<') {
        parse_html(body)
    } else {
        wrap_paragraphs(body)
    };

    if document.plain_text().trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(mark_callouts(&document))
}

/// One paragraph per blank-line separated chunk.
pub fn wrap_paragraphs(text: &str) -> Document {
    let normalized = text.replace("\r\n", "\n");
    Document::from_blocks(
        BLANK_LINE_RE
            .split(&normalized)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                let joined = chunk.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                Block::paragraph().with_text(joined)
            })
            .collect(),
    )
}

/// Promotes paragraphs opening with `Definition:` or `Example:` to callouts.
pub fn mark_callouts(document: &Document) -> Document {
    Document::from_blocks(
        document
            .blocks()
            .iter()
            .map(|block| {
                let mut block = block.clone();
                if block.kind == BlockKind::Paragraph {
                    let text = block.plain_text();
                    let text = text.trim_start();
                    if DEFINITION_RE.is_match(text) {
                        block.kind = BlockKind::Definition;
                    } else if EXAMPLE_RE.is_match(text) {
                        block.kind = BlockKind::Example;
                    }
                }
                block
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_output_is_an_empty_response() {
        assert_eq!(
            normalize_response("  \n\t"),
            Err(GenerationError::EmptyResponse)
        );
        assert_eq!(
            normalize_response("<p> </p>"),
            Err(GenerationError::EmptyResponse)
        );
    }

    #[test]
    fn plain_text_is_wrapped_on_blank_lines() {
        let doc = normalize_response("First line\ncontinued.\n\n  \nSecond.").unwrap();
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.blocks()[0].plain_text(), "First line continued.");
        assert_eq!(doc.blocks()[1].plain_text(), "Second.");
    }

    #[test]
    fn fenced_markup_is_unwrapped() {
        let doc = normalize_response("```html\n<h1>Heaps</h1>\n<p>Tree.</p>\n```").unwrap();
        assert_eq!(doc.blocks()[0].kind, BlockKind::Heading { level: 1 });
        assert_eq!(doc.plain_text(), "Heaps\nTree.");
    }

    #[test]
    fn callout_paragraphs_are_promoted() {
        let doc = normalize_response(
            "<p><strong>Definition:</strong> a heap is a tree.</p>\
             <p>For example, a priority queue.</p><p>Plain.</p>",
        )
        .unwrap();
        let kinds: Vec<BlockKind> = doc.blocks().iter().map(|block| block.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Definition, BlockKind::Example, BlockKind::Paragraph]
        );
    }
}
