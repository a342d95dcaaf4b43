//! Structured rich-text document model.
//!
//! # Responsibility
//! - Represent editable note content as blocks of styled text runs.
//! - Provide pure range transforms used by the command layer.
//!
//! # Invariants
//! - Transforms never mutate their input; every edit returns a new `Document`.
//! - Adjacent text runs with equal style are merged after every transform.
//! - Offsets count characters; an image occupies exactly one.
//!
//! # See also
//! - `model::html` for the persisted markup form.

use serde::{Deserialize, Serialize};
use std::cmp::min;

/// Character used by `plain_text` to stand in for an inline image.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Inline formatting attached to one text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Highlight span (`<span class="highlight">`).
    pub highlight: bool,
    /// CSS color value, accepted verbatim.
    pub color: Option<String>,
    /// Legacy font size step in `1..=7`.
    pub font_size: Option<u8>,
    /// Link target, accepted verbatim.
    pub link: Option<String>,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Returns this style with formatting removed. Links survive.
    pub fn without_formatting(&self) -> Self {
        Self {
            link: self.link.clone(),
            ..Self::default()
        }
    }
}

/// One property change applied to every run inside a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleChange {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Strikethrough(bool),
    Highlight(bool),
    Color(Option<String>),
    FontSize(Option<u8>),
    Link(Option<String>),
}

impl StyleChange {
    fn apply_to(&self, style: &mut TextStyle) {
        match self {
            Self::Bold(value) => style.bold = *value,
            Self::Italic(value) => style.italic = *value,
            Self::Underline(value) => style.underline = *value,
            Self::Strikethrough(value) => style.strikethrough = *value,
            Self::Highlight(value) => style.highlight = *value,
            Self::Color(value) => style.color = value.clone(),
            Self::FontSize(value) => style.font_size = *value,
            Self::Link(value) => style.link = value.clone(),
        }
    }
}

/// A contiguous piece of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Inline content of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inline {
    Text(TextRun),
    /// Embedded image; `src` is usually a data URI.
    Image { src: String },
}

impl Inline {
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(run) => run.char_len(),
            Self::Image { .. } => 1,
        }
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Self::Text(run) => out.push_str(&run.text),
            Self::Image { .. } => out.push(OBJECT_REPLACEMENT),
        }
    }
}

/// Block-level role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    ListItem { ordered: bool },
    /// Boxed definition callout.
    Definition,
    /// Boxed example callout.
    Example,
}

/// Horizontal alignment of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// One block of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub align: Alignment,
    pub content: Vec<Inline>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            align: Alignment::Left,
            content: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        Self::new(BlockKind::Paragraph)
    }

    pub fn heading(level: u8) -> Self {
        Self::new(BlockKind::Heading {
            level: level.clamp(1, 6),
        })
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_run(TextRun::plain(text))
    }

    pub fn with_run(mut self, run: TextRun) -> Self {
        self.content.push(Inline::Text(run));
        self.content = normalize_inlines(std::mem::take(&mut self.content));
        self
    }

    pub fn char_len(&self) -> usize {
        self.content.iter().map(Inline::char_len).sum()
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            item.push_plain_text(&mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }
}

/// Logical position: a block index plus a character offset inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentPosition {
    pub block: usize,
    pub offset: usize,
}

impl DocumentPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Ordered, direction-free range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: DocumentPosition,
    pub end: DocumentPosition,
}

impl TextRange {
    /// Builds a range from two positions in any order.
    pub fn new(a: DocumentPosition, b: DocumentPosition) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn collapsed(position: DocumentPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Editable document content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from blocks, normalizing inline runs.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let blocks = blocks
            .into_iter()
            .map(|mut block| {
                block.content = normalize_inlines(block.content);
                block
            })
            .collect();
        Self { blocks }
    }

    /// One paragraph per line; empty input yields an empty document.
    pub fn from_plain_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }
        Self::from_blocks(
            text.split('\n')
                .map(|line| Block::paragraph().with_text(line))
                .collect(),
        )
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block texts joined with `\n`.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn block_len(&self, block: usize) -> Option<usize> {
        self.blocks.get(block).map(Block::char_len)
    }

    pub fn end_position(&self) -> DocumentPosition {
        match self.blocks.last() {
            Some(last) => DocumentPosition::new(self.blocks.len() - 1, last.char_len()),
            None => DocumentPosition::default(),
        }
    }

    /// Whether `position` addresses an existing block and offset.
    ///
    /// The origin is always valid, even for an empty document.
    pub fn contains_position(&self, position: DocumentPosition) -> bool {
        if self.blocks.is_empty() {
            return position == DocumentPosition::default();
        }
        self.block_len(position.block)
            .is_some_and(|len| position.offset <= len)
    }

    /// Plain text covered by `range`, blocks joined with `\n`.
    pub fn text_in_range(&self, range: &TextRange) -> String {
        let Some(range) = self.clamp_range(range) else {
            return String::new();
        };
        let mut parts = Vec::new();
        for index in range.start.block..=range.end.block {
            let block = &self.blocks[index];
            let (from, to) = local_bounds(&range, index, block.char_len());
            let text = block.plain_text();
            parts.push(text.chars().skip(from).take(to - from).collect::<String>());
        }
        parts.join("\n")
    }

    /// Sets one style property on every text run inside `range`.
    pub fn apply_style(&self, range: &TextRange, change: &StyleChange) -> Self {
        self.map_runs(range, |style| change.apply_to(style))
    }

    /// Resets formatting inside `range`, keeping links.
    pub fn clear_styles(&self, range: &TextRange) -> Self {
        self.map_runs(range, |style| *style = style.without_formatting())
    }

    /// Whether every text run inside `range` satisfies `predicate`.
    ///
    /// Returns `false` when the range covers no text.
    pub fn runs_match<P>(&self, range: &TextRange, predicate: P) -> bool
    where
        P: Fn(&TextStyle) -> bool,
    {
        let runs = self.runs_in_range(range);
        !runs.is_empty() && runs.iter().all(|run| predicate(&run.style))
    }

    /// Whether every block touched by `range` satisfies `predicate`.
    pub fn blocks_match<P>(&self, range: &TextRange, predicate: P) -> bool
    where
        P: Fn(&Block) -> bool,
    {
        match self.block_span(range) {
            Some((first, last)) => self.blocks[first..=last].iter().all(predicate),
            None => false,
        }
    }

    /// Sets the kind of every block touched by `range`.
    pub fn set_block_kind(&self, range: &TextRange, kind: BlockKind) -> Self {
        self.map_blocks(range, |block| block.kind = kind)
    }

    /// Sets the alignment of every block touched by `range`.
    pub fn set_alignment(&self, range: &TextRange, align: Alignment) -> Self {
        self.map_blocks(range, |block| block.align = align)
    }

    /// Splits blocks at the range boundaries so the covered content becomes
    /// standalone block(s) of `kind`.
    ///
    /// Returns the new document and the range now spanning those blocks.
    pub fn isolate_blocks(&self, range: &TextRange, kind: BlockKind) -> (Self, TextRange) {
        let Some(range) = self.clamp_range(range).map(|range| self.trim_block_boundary(range))
        else {
            return (self.clone(), *range);
        };

        let mut blocks = Vec::with_capacity(self.blocks.len() + 2);
        let mut first_isolated = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            if index < range.start.block || index > range.end.block {
                blocks.push(block.clone());
                continue;
            }

            let (from, to) = local_bounds(&range, index, block.char_len());
            let (before, rest) = split_inlines(&block.content, from);
            let (middle, after) = split_inlines(&rest, to - from);

            if !before.is_empty() {
                blocks.push(Block {
                    kind: block.kind,
                    align: block.align,
                    content: normalize_inlines(before),
                });
            }
            if index == range.start.block {
                first_isolated = blocks.len();
            }
            blocks.push(Block {
                kind,
                align: block.align,
                content: normalize_inlines(middle),
            });
            if !after.is_empty() {
                blocks.push(Block {
                    kind: block.kind,
                    align: block.align,
                    content: normalize_inlines(after),
                });
            }
        }

        let last_isolated = first_isolated + (range.end.block - range.start.block);
        let isolated = TextRange::new(
            DocumentPosition::new(first_isolated, 0),
            DocumentPosition::new(last_isolated, blocks[last_isolated].char_len()),
        );
        (Self { blocks }, isolated)
    }

    /// Deletes `range` and inserts `lines` in its place.
    ///
    /// The first line continues the start block, every further line opens a
    /// new block of the same kind. Returns the new document and the caret
    /// after the inserted content.
    pub fn replace_range(&self, range: &TextRange, lines: &[Vec<Inline>]) -> (Self, DocumentPosition) {
        let mut working = self.blocks.clone();
        if working.is_empty() {
            working.push(Block::paragraph());
        }
        let range = clamp_range_in(&working, range);
        let start_block = &working[range.start.block];
        let end_block = &working[range.end.block];
        let (head, _) = split_inlines(&start_block.content, range.start.offset);
        let (_, tail) = split_inlines(&end_block.content, range.end.offset);
        let kind = start_block.kind;
        let align = start_block.align;

        let empty_line = Vec::new();
        let lines: Vec<&Vec<Inline>> = if lines.is_empty() {
            vec![&empty_line]
        } else {
            lines.iter().collect()
        };
        let line_count = lines.len();

        let mut replacement = Vec::with_capacity(line_count);
        let mut caret = range.start;
        for (line_index, line) in lines.into_iter().enumerate() {
            let line_len: usize = line.iter().map(Inline::char_len).sum();
            let mut content = Vec::new();
            if line_index == 0 {
                content.extend(head.iter().cloned());
                caret.offset = range.start.offset + line_len;
            } else {
                caret = DocumentPosition::new(range.start.block + line_index, line_len);
            }
            content.extend(line.iter().cloned());
            if line_index == line_count - 1 {
                content.extend(tail.iter().cloned());
            }
            replacement.push(Block {
                kind,
                align,
                content: normalize_inlines(content),
            });
        }

        working.splice(range.start.block..=range.end.block, replacement);
        (Self { blocks: working }, caret)
    }

    /// Clamps both ends of `range` into the document.
    ///
    /// Returns `None` for an empty document.
    pub fn clamp_range(&self, range: &TextRange) -> Option<TextRange> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(clamp_range_in(&self.blocks, range))
        }
    }

    fn runs_in_range(&self, range: &TextRange) -> Vec<TextRun> {
        let Some(range) = self.clamp_range(range) else {
            return Vec::new();
        };
        let mut runs = Vec::new();
        for index in range.start.block..=range.end.block {
            let block = &self.blocks[index];
            let (from, to) = local_bounds(&range, index, block.char_len());
            if from >= to {
                continue;
            }
            let (_, rest) = split_inlines(&block.content, from);
            let (middle, _) = split_inlines(&rest, to - from);
            runs.extend(middle.into_iter().filter_map(|item| match item {
                Inline::Text(run) if !run.text.is_empty() => Some(run),
                _ => None,
            }));
        }
        runs
    }

    fn map_runs<F>(&self, range: &TextRange, mut edit: F) -> Self
    where
        F: FnMut(&mut TextStyle),
    {
        let mut next = self.clone();
        let Some(range) = self.clamp_range(range) else {
            return next;
        };
        for index in range.start.block..=range.end.block {
            let block = &mut next.blocks[index];
            let (from, to) = local_bounds(&range, index, block.char_len());
            if from >= to {
                continue;
            }
            let (before, rest) = split_inlines(&block.content, from);
            let (mut middle, after) = split_inlines(&rest, to - from);
            for item in &mut middle {
                if let Inline::Text(run) = item {
                    edit(&mut run.style);
                }
            }
            block.content =
                normalize_inlines(before.into_iter().chain(middle).chain(after).collect());
        }
        next
    }

    fn map_blocks<F>(&self, range: &TextRange, mut edit: F) -> Self
    where
        F: FnMut(&mut Block),
    {
        let mut next = self.clone();
        if let Some((first, last)) = self.block_span(range) {
            for block in &mut next.blocks[first..=last] {
                edit(block);
            }
        }
        next
    }

    /// First and last block index touched by `range`.
    fn block_span(&self, range: &TextRange) -> Option<(usize, usize)> {
        let range = self.trim_block_boundary(self.clamp_range(range)?);
        Some((range.start.block, range.end.block))
    }

    /// Drops block edges the range only touches: an end at offset 0 of a
    /// later block, or a start at the end of an earlier block.
    fn trim_block_boundary(&self, mut range: TextRange) -> TextRange {
        if range.end.offset == 0 && range.end.block > range.start.block {
            let block = range.end.block - 1;
            range.end = DocumentPosition::new(block, self.blocks[block].char_len());
        }
        if range.start.block < range.end.block
            && range.start.offset == self.blocks[range.start.block].char_len()
        {
            range.start = DocumentPosition::new(range.start.block + 1, 0);
        }
        range
    }
}

fn clamp_position_in(blocks: &[Block], position: DocumentPosition) -> DocumentPosition {
    let last = blocks.len() - 1;
    if position.block > last {
        return DocumentPosition::new(last, blocks[last].char_len());
    }
    DocumentPosition::new(
        position.block,
        min(position.offset, blocks[position.block].char_len()),
    )
}

fn clamp_range_in(blocks: &[Block], range: &TextRange) -> TextRange {
    TextRange::new(
        clamp_position_in(blocks, range.start),
        clamp_position_in(blocks, range.end),
    )
}

/// Offsets covered by `range` inside block `index`.
fn local_bounds(range: &TextRange, index: usize, block_len: usize) -> (usize, usize) {
    let from = if index == range.start.block {
        range.start.offset
    } else {
        0
    };
    let to = if index == range.end.block {
        range.end.offset
    } else {
        block_len
    };
    (min(from, block_len), min(to.max(from), block_len))
}

fn split_text(text: &str, char_offset: usize) -> (String, String) {
    let byte = text
        .char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index);
    let (left, right) = text.split_at(byte);
    (left.to_string(), right.to_string())
}

/// Splits inline content at a character offset.
pub(crate) fn split_inlines(content: &[Inline], offset: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0usize;
    for item in content {
        let len = item.char_len();
        if pos + len <= offset {
            left.push(item.clone());
        } else if pos >= offset {
            right.push(item.clone());
        } else if let Inline::Text(run) = item {
            let (head, tail) = split_text(&run.text, offset - pos);
            left.push(Inline::Text(TextRun::new(head, run.style.clone())));
            right.push(Inline::Text(TextRun::new(tail, run.style.clone())));
        } else {
            right.push(item.clone());
        }
        pos += len;
    }
    (left, right)
}

/// Drops empty runs and merges neighbours with equal style.
pub(crate) fn normalize_inlines(content: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for item in content {
        match item {
            Inline::Text(run) if run.text.is_empty() => {}
            Inline::Text(run) => {
                if let Some(Inline::Text(previous)) = out.last_mut() {
                    if previous.style == run.style {
                        previous.text.push_str(&run.text);
                        continue;
                    }
                }
                out.push(Inline::Text(run));
            }
            image => out.push(image),
        }
    }
    out
}
