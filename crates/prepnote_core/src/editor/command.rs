//! Formatting commands and their pure document transforms.
//!
//! # Responsibility
//! - Enumerate the named formatting/insertion commands a surface can issue.
//! - Map each command onto a document transform at a target range.
//!
//! # Invariants
//! - `apply_command` never mutates its input document.
//! - A disabled surface rejects every command before any transform runs.
//! - Range-formatting and span-wrapping commands require a non-empty target.
//! - Link targets and colors are accepted verbatim; no URL validation.

use crate::editor::selection::SelectionAfter;
use crate::model::document::{
    Alignment, Block, BlockKind, Document, Inline, StyleChange, TextRange, TextRun, TextStyle,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Alignment direction for `Command::Justify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Center,
    Right,
}

impl From<Justify> for Alignment {
    fn from(value: Justify) -> Self {
        match value {
            Justify::Left => Alignment::Left,
            Justify::Center => Alignment::Center,
            Justify::Right => Alignment::Right,
        }
    }
}

/// Named editing command issued by a surface toolbar or keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    ForeColor(String),
    /// Legacy size step in `1..=7`.
    FontSize(u8),
    Justify(Justify),
    InsertUnorderedList,
    InsertOrderedList,
    /// Without `text` (or with empty text) the URL itself is shown.
    CreateLink {
        url: String,
        text: Option<String>,
    },
    /// Image source, usually a data URI.
    InsertImage(String),
    InsertHighlightSpan,
    InsertDefinitionBlock,
    InsertExampleBlock,
    RemoveFormatting,
    InsertPlainText(String),
}

impl Command {
    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::ForeColor(_) => "fore_color",
            Self::FontSize(_) => "font_size",
            Self::Justify(_) => "justify",
            Self::InsertUnorderedList => "insert_unordered_list",
            Self::InsertOrderedList => "insert_ordered_list",
            Self::CreateLink { .. } => "create_link",
            Self::InsertImage(_) => "insert_image",
            Self::InsertHighlightSpan => "insert_highlight_span",
            Self::InsertDefinitionBlock => "insert_definition_block",
            Self::InsertExampleBlock => "insert_example_block",
            Self::RemoveFormatting => "remove_formatting",
            Self::InsertPlainText(_) => "insert_plain_text",
        }
    }

    /// Whether the command is rejected without a non-empty selection.
    pub fn requires_selection(&self) -> bool {
        matches!(
            self,
            Self::Bold
                | Self::Italic
                | Self::Underline
                | Self::Strikethrough
                | Self::ForeColor(_)
                | Self::FontSize(_)
                | Self::InsertHighlightSpan
                | Self::InsertDefinitionBlock
                | Self::InsertExampleBlock
                | Self::RemoveFormatting
        )
    }
}

/// Reason a command was not applied.
///
/// All variants are silently ignored by sessions; they exist for logging
/// and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The surface is read-only.
    NotEditable,
    /// The command needs a non-empty selection.
    EmptySelection,
    /// A command argument is out of range or blank.
    InvalidArgument(&'static str),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEditable => write!(f, "editing is disabled"),
            Self::EmptySelection => write!(f, "command requires a non-empty selection"),
            Self::InvalidArgument(details) => write!(f, "invalid command argument: {details}"),
        }
    }
}

impl Error for CommandError {}

/// Result of a successfully applied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub document: Document,
    pub selection: SelectionAfter,
}

/// Applies `command` to `document` at `target`.
///
/// # Errors
/// - `NotEditable` when `editable` is false.
/// - `EmptySelection` when the command needs a selection and `target` is
///   collapsed after clamping into the document.
/// - `InvalidArgument` for blank colors or image sources and for font sizes
///   outside `1..=7`. Link URLs are taken verbatim.
pub fn apply_command(
    document: &Document,
    target: &TextRange,
    command: &Command,
    editable: bool,
) -> Result<CommandOutput, CommandError> {
    if !editable {
        return Err(CommandError::NotEditable);
    }
    let target = document
        .clamp_range(target)
        .unwrap_or_else(|| TextRange::collapsed(Default::default()));
    if command.requires_selection() && target.is_collapsed() {
        return Err(CommandError::EmptySelection);
    }

    let output = match command {
        Command::Bold => toggle_style(document, &target, |style| style.bold, StyleChange::Bold),
        Command::Italic => {
            toggle_style(document, &target, |style| style.italic, StyleChange::Italic)
        }
        Command::Underline => toggle_style(
            document,
            &target,
            |style| style.underline,
            StyleChange::Underline,
        ),
        Command::Strikethrough => toggle_style(
            document,
            &target,
            |style| style.strikethrough,
            StyleChange::Strikethrough,
        ),
        Command::ForeColor(color) => {
            let color = color.trim();
            if color.is_empty() {
                return Err(CommandError::InvalidArgument("color cannot be blank"));
            }
            keep_range(
                document.apply_style(&target, &StyleChange::Color(Some(color.to_string()))),
                target,
            )
        }
        Command::FontSize(size) => {
            if !(1..=7).contains(size) {
                return Err(CommandError::InvalidArgument(
                    "font size must be within 1..=7",
                ));
            }
            keep_range(
                document.apply_style(&target, &StyleChange::FontSize(Some(*size))),
                target,
            )
        }
        Command::Justify(direction) => {
            keep_range(document.set_alignment(&target, (*direction).into()), target)
        }
        Command::InsertUnorderedList => toggle_list(document, &target, false),
        Command::InsertOrderedList => toggle_list(document, &target, true),
        Command::CreateLink { url, text } => {
            let visible = text
                .as_deref()
                .filter(|value| !value.is_empty())
                .unwrap_or(url.as_str());
            let style = TextStyle {
                link: Some(url.clone()),
                ..TextStyle::default()
            };
            insert_lines(
                document,
                &target,
                &[vec![Inline::Text(TextRun::new(visible, style))]],
            )
        }
        Command::InsertImage(src) => {
            if src.trim().is_empty() {
                return Err(CommandError::InvalidArgument("image source cannot be blank"));
            }
            insert_lines(
                document,
                &target,
                &[vec![Inline::Image { src: src.clone() }]],
            )
        }
        Command::InsertHighlightSpan => keep_range(
            document.apply_style(&target, &StyleChange::Highlight(true)),
            target,
        ),
        Command::InsertDefinitionBlock => isolate(document, &target, BlockKind::Definition),
        Command::InsertExampleBlock => isolate(document, &target, BlockKind::Example),
        Command::RemoveFormatting => keep_range(document.clear_styles(&target), target),
        Command::InsertPlainText(text) => {
            let normalized = text.replace("\r\n", "\n");
            let lines: Vec<Vec<Inline>> = normalized
                .split('\n')
                .map(|line| vec![Inline::Text(TextRun::plain(line))])
                .collect();
            if normalized.is_empty() && target.is_collapsed() {
                keep_range(document.clone(), target)
            } else {
                insert_lines(document, &target, &lines)
            }
        }
    };

    Ok(output)
}

fn keep_range(document: Document, target: TextRange) -> CommandOutput {
    let selection = if target.is_collapsed() {
        SelectionAfter::Caret(target.start)
    } else {
        SelectionAfter::Range(target)
    };
    CommandOutput {
        document,
        selection,
    }
}

/// Sets the style when any run lacks it, clears it when all runs have it.
fn toggle_style(
    document: &Document,
    target: &TextRange,
    is_set: fn(&TextStyle) -> bool,
    change: fn(bool) -> StyleChange,
) -> CommandOutput {
    let enable = !document.runs_match(target, is_set);
    keep_range(document.apply_style(target, &change(enable)), *target)
}

fn toggle_list(document: &Document, target: &TextRange, ordered: bool) -> CommandOutput {
    let kind = BlockKind::ListItem { ordered };
    let base = if document.is_empty() {
        Document::from_blocks(vec![Block::paragraph()])
    } else {
        document.clone()
    };
    let next_kind = if base.blocks_match(target, |block| block.kind == kind) {
        BlockKind::Paragraph
    } else {
        kind
    };
    keep_range(base.set_block_kind(target, next_kind), *target)
}

fn isolate(document: &Document, target: &TextRange, kind: BlockKind) -> CommandOutput {
    let (document, isolated) = document.isolate_blocks(target, kind);
    CommandOutput {
        document,
        selection: SelectionAfter::Range(isolated),
    }
}

fn insert_lines(document: &Document, target: &TextRange, lines: &[Vec<Inline>]) -> CommandOutput {
    let (document, caret) = document.replace_range(target, lines);
    CommandOutput {
        document,
        selection: SelectionAfter::Caret(caret),
    }
}
