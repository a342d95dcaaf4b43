//! HTML codec for persisted note content.
//!
//! # Responsibility
//! - Serialize `Document` into the markup stored in note records.
//! - Parse stored or generated markup back into a `Document`.
//! - Render a standalone page for print/export.
//!
//! # Invariants
//! - Parsing never fails; unknown tags are dropped and their text kept.
//! - `parse_html(&to_html(doc)) == doc` for normalized documents; spaces the
//!   parser would collapse or trim are written as entities.
//! - Print export is one-way and never re-imported.

use crate::model::document::{Alignment, Block, BlockKind, Document, Inline, TextRun, TextStyle};
use std::fmt::Write as _;

const PRINT_STYLESHEET: &str = "body { font-family: Georgia, 'Times New Roman', serif; \
line-height: 1.6; max-width: 46rem; margin: 2rem auto; color: #1f2328; }
h1, h2, h3 { font-family: Helvetica, Arial, sans-serif; color: #0b3d91; }
.definition { border-left: 4px solid #0b3d91; background: #eef3fb; padding: 0.6rem 1rem; margin: 1rem 0; }
.example { border-left: 4px solid #1a7f37; background: #effaf2; padding: 0.6rem 1rem; margin: 1rem 0; }
.highlight { background: #fff3a3; }
img { max-width: 100%; }
@media print { body { margin: 0; } a { color: inherit; } }";

/// Serializes a document into note markup.
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<bool> = None;

    for block in document.blocks() {
        match block.kind {
            BlockKind::ListItem { ordered } => {
                if open_list != Some(ordered) {
                    close_list(&mut out, open_list);
                    out.push_str(if ordered { "<ol>" } else { "<ul>" });
                    open_list = Some(ordered);
                }
            }
            _ => close_list(&mut out, open_list.take()),
        }
        write_block(&mut out, block);
    }
    close_list(&mut out, open_list);
    out
}

/// Renders a standalone, print-ready page for the document.
pub fn render_print_page(document: &Document, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(title),
        PRINT_STYLESHEET,
        to_html(document)
    )
}

fn close_list(out: &mut String, open_list: Option<bool>) {
    match open_list {
        Some(true) => out.push_str("</ol>"),
        Some(false) => out.push_str("</ul>"),
        None => {}
    }
}

fn write_block(out: &mut String, block: &Block) {
    let align = match block.align {
        Alignment::Left => "",
        Alignment::Center => " style=\"text-align:center\"",
        Alignment::Right => " style=\"text-align:right\"",
    };
    let close = match block.kind {
        BlockKind::Paragraph => {
            let _ = write!(out, "<p{align}>");
            "</p>".to_string()
        }
        BlockKind::Heading { level } => {
            let level = level.clamp(1, 6);
            let _ = write!(out, "<h{level}{align}>");
            format!("</h{level}>")
        }
        BlockKind::ListItem { .. } => {
            let _ = write!(out, "<li{align}>");
            "</li>".to_string()
        }
        BlockKind::Definition => {
            let _ = write!(out, "<div class=\"definition\"{align}>");
            "</div>".to_string()
        }
        BlockKind::Example => {
            let _ = write!(out, "<div class=\"example\"{align}>");
            "</div>".to_string()
        }
    };

    if block.content.is_empty() {
        out.push_str("<br>");
    }
    // Block start behaves like a preceding space: a leading space is kept.
    let mut after_space = true;
    for (index, item) in block.content.iter().enumerate() {
        match item {
            Inline::Text(run) => {
                let at_block_end = block.content[index + 1..]
                    .iter()
                    .all(|next| matches!(next, Inline::Text(next) if next.text.is_empty()));
                write_run(out, run, &mut after_space, at_block_end);
            }
            Inline::Image { src } => {
                let _ = write!(out, "<img src=\"{}\">", escape_attr(src));
                after_space = false;
            }
        }
    }
    out.push_str(&close);
}

fn write_run(out: &mut String, run: &TextRun, after_space: &mut bool, at_block_end: bool) {
    let style = &run.style;
    let mut closers: Vec<&'static str> = Vec::new();

    if let Some(link) = &style.link {
        let _ = write!(out, "<a href=\"{}\">", escape_attr(link));
        closers.push("</a>");
    }
    if let Some(color) = &style.color {
        let _ = write!(out, "<font color=\"{}\">", escape_attr(color));
        closers.push("</font>");
    }
    if let Some(size) = style.font_size {
        let _ = write!(out, "<font size=\"{size}\">");
        closers.push("</font>");
    }
    if style.highlight {
        out.push_str("<span class=\"highlight\">");
        closers.push("</span>");
    }
    if style.bold {
        out.push_str("<b>");
        closers.push("</b>");
    }
    if style.italic {
        out.push_str("<i>");
        closers.push("</i>");
    }
    if style.underline {
        out.push_str("<u>");
        closers.push("</u>");
    }
    if style.strikethrough {
        out.push_str("<s>");
        closers.push("</s>");
    }

    write_block_text(out, &run.text, after_space, at_block_end);
    for closer in closers.iter().rev() {
        out.push_str(closer);
    }
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes block text so that whitespace survives the parser's collapsing.
fn write_block_text(out: &mut String, value: &str, after_space: &mut bool, at_block_end: bool) {
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        let is_last = at_block_end && chars.peek().is_none();
        match ch {
            ' ' if *after_space || is_last => out.push_str("&nbsp;"),
            '\t' | '\n' | '\r' | '\x0c' => {
                let _ = write!(out, "&#{};", u32::from(ch));
            }
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
        *after_space = ch.is_ascii_whitespace();
    }
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Parses note markup into a document.
///
/// Accepts the serializer's output plus common contentEditable and
/// generated-markup equivalents (`strong`, `em`, `del`, `mark`, `br`,
/// `span style="color:.."`).
pub fn parse_html(markup: &str) -> Document {
    let mut builder = HtmlBuilder::default();
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            builder.text(rest);
            break;
        };
        if lt > 0 {
            builder.text(&rest[..lt]);
            rest = &rest[lt..];
            continue;
        }

        if let Some(comment) = rest.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }

        if !rest[1..].starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '/' || ch == '!') {
            builder.text("<");
            rest = &rest[1..];
            continue;
        }

        let Some(gt) = rest.find('>') else {
            builder.text(rest);
            break;
        };
        let tag = parse_tag(&rest[1..gt]);
        rest = &rest[gt + 1..];

        if let Some(tag) = tag {
            if !tag.closing && (tag.name == "script" || tag.name == "style") {
                let closer = format!("</{}", tag.name);
                rest = find_ascii_case_insensitive(rest, &closer)
                    .and_then(|start| rest[start..].find('>').map(|end| &rest[start + end + 1..]))
                    .unwrap_or("");
                continue;
            }
            builder.tag(&tag);
        }
    }

    builder.finish()
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    attrs: Vec<(String, String)>,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|value| value.split_whitespace().any(|item| item == class))
    }

    fn style_property(&self, property: &str) -> Option<String> {
        self.attr("style").and_then(|style| {
            style.split(';').find_map(|declaration| {
                let (key, value) = declaration.split_once(':')?;
                (key.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_string())
            })
        })
    }
}

fn parse_tag(body: &str) -> Option<Tag> {
    let body = body.trim();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, body),
    };
    let body = body.strip_suffix('/').unwrap_or(body);

    let name_end = body
        .find(|ch: char| ch.is_whitespace())
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return None;
    }

    Some(Tag {
        name,
        closing,
        attrs: parse_attrs(&body[name_end..]),
    })
}

fn parse_attrs(mut input: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            break;
        }
        let key_end = input
            .find(|ch: char| ch == '=' || ch.is_whitespace())
            .unwrap_or(input.len());
        let key = input[..key_end].to_ascii_lowercase();
        input = input[key_end..].trim_start();

        let value = if let Some(after_eq) = input.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    match inner.find(quote) {
                        Some(end) => (&inner[..end], &inner[end + 1..]),
                        None => (inner, ""),
                    }
                }
                _ => {
                    let end = after_eq
                        .find(char::is_whitespace)
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            input = remaining;
            decode_entities(value)
        } else {
            String::new()
        };

        if key.is_empty() {
            // Stray `=` or quote; skip one character to make progress.
            let mut chars = input.chars();
            chars.next();
            input = chars.as_str();
            continue;
        }
        attrs.push((key, value));
    }
    attrs
}

/// Decodes the named and numeric entities contentEditable emits.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity.strip_prefix('#').and_then(|number| {
                    let code = match number.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|ch| (ch, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

struct OpenBlock {
    block: Block,
    explicit: bool,
}

struct BlockFrame {
    tag: String,
    kind: BlockKind,
    align: Alignment,
}

#[derive(Default)]
struct HtmlBuilder {
    blocks: Vec<Block>,
    current: Option<OpenBlock>,
    frames: Vec<BlockFrame>,
    lists: Vec<bool>,
    style: TextStyle,
    inline_stack: Vec<(String, TextStyle)>,
    /// The last pushed text ends with a collapsed source space.
    soft_tail: bool,
}

impl HtmlBuilder {
    /// Collapses source whitespace, then decodes entities so that encoded
    /// spaces are kept verbatim.
    fn text(&mut self, raw: &str) {
        let mut collapsed = String::with_capacity(raw.len());
        let mut in_space = false;
        for ch in raw.chars() {
            if ch.is_ascii_whitespace() {
                if !in_space {
                    collapsed.push(' ');
                }
                in_space = true;
            } else {
                collapsed.push(ch);
                in_space = false;
            }
        }

        let block_is_empty = self
            .current
            .as_ref()
            .map_or(true, |open| open.block.content.is_empty());
        let collapsed = if block_is_empty || self.soft_tail {
            collapsed.trim_start_matches(' ')
        } else {
            collapsed.as_str()
        };
        if collapsed.is_empty() {
            return;
        }

        let text = decode_entities(collapsed);
        self.soft_tail = collapsed.ends_with(' ');
        let style = self.style.clone();
        let block = self.ensure_block();
        block.content.push(Inline::Text(TextRun::new(text, style)));
    }

    fn tag(&mut self, tag: &Tag) {
        match tag.name.as_str() {
            "p" | "div" | "li" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if tag.closing {
                    self.close_block(&tag.name);
                } else {
                    self.open_block(tag);
                }
            }
            "ul" | "ol" => {
                self.finish_block();
                if tag.closing {
                    self.lists.pop();
                } else {
                    self.lists.push(tag.name == "ol");
                }
            }
            "br" => self.line_break(),
            "img" => {
                if let Some(src) = tag.attr("src").filter(|src| !src.is_empty()) {
                    let src = src.to_string();
                    self.ensure_block().content.push(Inline::Image { src });
                    self.soft_tail = false;
                }
            }
            _ => self.inline_tag(tag),
        }
    }

    fn inline_tag(&mut self, tag: &Tag) {
        if tag.closing {
            if let Some(index) = self
                .inline_stack
                .iter()
                .rposition(|(name, _)| *name == tag.name)
            {
                self.style = self.inline_stack[index].1.clone();
                self.inline_stack.truncate(index);
            }
            return;
        }

        let mut style = self.style.clone();
        match tag.name.as_str() {
            "b" | "strong" => style.bold = true,
            "i" | "em" => style.italic = true,
            "u" | "ins" => style.underline = true,
            "s" | "strike" | "del" => style.strikethrough = true,
            "mark" => style.highlight = true,
            "a" => style.link = tag.attr("href").map(str::to_string),
            "font" => {
                if let Some(color) = tag.attr("color") {
                    style.color = Some(color.to_string());
                }
                if let Some(size) = tag.attr("size").and_then(|size| size.trim().parse::<u8>().ok())
                {
                    style.font_size = Some(size.clamp(1, 7));
                }
            }
            "span" => {
                if tag.has_class("highlight") {
                    style.highlight = true;
                }
                if let Some(color) = tag.style_property("color") {
                    style.color = Some(color);
                }
                if let Some(weight) = tag.style_property("font-weight") {
                    style.bold = weight == "bold" || weight.parse::<u16>().is_ok_and(|w| w >= 600);
                }
            }
            _ => return,
        }
        self.inline_stack
            .push((tag.name.clone(), std::mem::replace(&mut self.style, style)));
    }

    fn open_block(&mut self, tag: &Tag) {
        let inherited = self.frames.last().map(|frame| frame.kind);
        let mut kind = match tag.name.as_str() {
            "li" => BlockKind::ListItem {
                ordered: self.lists.last().copied().unwrap_or(false),
            },
            "div" if tag.has_class("definition") => BlockKind::Definition,
            "div" if tag.has_class("example") => BlockKind::Example,
            name if name.len() == 2 && name.starts_with('h') => BlockKind::Heading {
                level: name[1..].parse().unwrap_or(1),
            },
            _ => BlockKind::Paragraph,
        };
        if kind == BlockKind::Paragraph {
            if let Some(outer) = inherited {
                kind = outer;
            }
        }
        let align = match tag.style_property("text-align").as_deref() {
            Some("center") => Alignment::Center,
            Some("right") => Alignment::Right,
            _ => self
                .frames
                .last()
                .map_or(Alignment::Left, |frame| frame.align),
        };

        match self.current.as_mut() {
            Some(open) if open.block.content.is_empty() => {
                open.block.kind = kind;
                open.block.align = align;
                open.explicit = true;
            }
            _ => {
                self.finish_block();
                self.current = Some(OpenBlock {
                    block: Block {
                        kind,
                        align,
                        content: Vec::new(),
                    },
                    explicit: true,
                });
            }
        }

        self.frames.push(BlockFrame {
            tag: tag.name.clone(),
            kind,
            align,
        });
    }

    fn close_block(&mut self, name: &str) {
        self.finish_block();
        if let Some(index) = self.frames.iter().rposition(|frame| frame.tag == name) {
            self.frames.truncate(index);
        }
    }

    fn line_break(&mut self) {
        let Some(open) = self.current.as_ref() else {
            return;
        };
        if open.block.content.is_empty() {
            return;
        }
        let kind = open.block.kind;
        let align = open.block.align;
        self.finish_block();
        self.current = Some(OpenBlock {
            block: Block {
                kind,
                align,
                content: Vec::new(),
            },
            explicit: false,
        });
    }

    fn ensure_block(&mut self) -> &mut Block {
        let frames = &self.frames;
        let open = self.current.get_or_insert_with(|| {
            let (kind, align) = frames
                .last()
                .map_or((BlockKind::Paragraph, Alignment::Left), |frame| {
                    (frame.kind, frame.align)
                });
            OpenBlock {
                block: Block {
                    kind,
                    align,
                    content: Vec::new(),
                },
                explicit: false,
            }
        });
        &mut open.block
    }

    fn finish_block(&mut self) {
        let Some(mut open) = self.current.take() else {
            return;
        };
        if std::mem::take(&mut self.soft_tail) {
            if let Some(Inline::Text(last)) = open.block.content.last_mut() {
                last.text.pop();
                if last.text.is_empty() {
                    open.block.content.pop();
                }
            }
        }
        if open.explicit || !open.block.content.is_empty() {
            self.blocks.push(open.block);
        }
    }

    fn finish(mut self) -> Document {
        self.finish_block();
        Document::from_blocks(self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::{DocumentPosition, StyleChange, TextRange};

    #[test]
    fn bold_run_serializes_inside_paragraph() {
        let doc = Document::from_plain_text("Hello").apply_style(
            &TextRange::new(DocumentPosition::new(0, 0), DocumentPosition::new(0, 5)),
            &StyleChange::Bold(true),
        );
        assert_eq!(to_html(&doc), "<p><b>Hello</b></p>");
    }

    #[test]
    fn consecutive_list_items_share_one_list() {
        let doc = Document::from_blocks(vec![
            Block::new(BlockKind::ListItem { ordered: false }).with_text("a"),
            Block::new(BlockKind::ListItem { ordered: false }).with_text("b"),
            Block::new(BlockKind::ListItem { ordered: true }).with_text("c"),
            Block::paragraph().with_text("d"),
        ]);
        assert_eq!(
            to_html(&doc),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn serialized_markup_parses_back_to_the_same_document() {
        let mut highlighted = TextStyle::plain();
        highlighted.highlight = true;
        highlighted.color = Some("#ff0000".to_string());
        let mut linked = TextStyle::plain();
        linked.link = Some("https://example.com/?a=1&b=\"2\"".to_string());
        linked.italic = true;

        let mut centered = Block::heading(2).with_text("Title <1>");
        centered.align = Alignment::Center;
        let doc = Document::from_blocks(vec![
            centered,
            Block::paragraph()
                .with_text("plain & ")
                .with_run(TextRun::new("marked", highlighted))
                .with_run(TextRun::new(" link", linked)),
            Block::new(BlockKind::Definition).with_text("A term."),
            Block::new(BlockKind::Example).with_text("An example."),
            Block::new(BlockKind::ListItem { ordered: true }).with_text("first"),
            Block::paragraph(),
        ]);

        assert_eq!(parse_html(&to_html(&doc)), doc);
    }

    #[test]
    fn parser_accepts_content_editable_equivalents() {
        let doc = parse_html(
            "<div>one <strong>two</strong></div><div><br></div>\
             <span style=\"color: blue\">three</span>&nbsp;&#x41;",
        );
        assert_eq!(doc.blocks().len(), 3);
        assert_eq!(doc.blocks()[0].plain_text(), "one two");
        assert!(doc.blocks()[1].is_empty());
        assert_eq!(doc.blocks()[2].plain_text(), "three A");
        match &doc.blocks()[2].content[0] {
            Inline::Text(run) => assert_eq!(run.style.color.as_deref(), Some("blue")),
            other => panic!("unexpected inline: {other:?}"),
        }
    }

    #[test]
    fn paragraphs_inside_callouts_keep_callout_kind() {
        let doc = parse_html("<div class=\"definition\"><p>Inner</p></div><p>after</p>");
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.blocks()[0].kind, BlockKind::Definition);
        assert_eq!(doc.blocks()[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn line_breaks_split_blocks_and_scripts_are_skipped() {
        let doc = parse_html("<p>a<br>b</p><script>alert('x')</script><style>p{}</style>");
        assert_eq!(doc.plain_text(), "a\nb");
    }

    #[test]
    fn edge_and_repeated_spaces_survive_a_round_trip() {
        let doc = Document::from_blocks(vec![
            Block::paragraph().with_text("A "),
            Block::paragraph().with_text(" two  spaces\tand tab "),
            Block::paragraph()
                .with_text("bold ")
                .with_run(TextRun::new(" next", {
                    let mut bold = TextStyle::plain();
                    bold.bold = true;
                    bold
                })),
        ]);
        let markup = to_html(&doc);
        assert!(markup.starts_with("<p>A&nbsp;</p><p>&nbsp;two &nbsp;spaces&#9;and tab&nbsp;</p>"));
        assert_eq!(parse_html(&markup), doc);
    }

    #[test]
    fn source_whitespace_is_still_collapsed() {
        let doc = parse_html("<p>\n  one   <b> two </b>\n</p>");
        assert_eq!(doc.plain_text(), "one two");
    }

    #[test]
    fn less_than_not_starting_a_tag_is_text() {
        let doc = parse_html("if a < b > c");
        assert_eq!(doc.plain_text(), "if a < b > c");
        assert!(doc.blocks()[0].content.iter().all(|item| match item {
            Inline::Text(run) => !run.style.bold,
            Inline::Image { .. } => false,
        }));
        assert_eq!(parse_html("1 <2 and <!doctype html>x").plain_text(), "1 <2 and x");
    }

    #[test]
    fn unterminated_markup_is_kept_as_text() {
        let doc = parse_html("x < y");
        assert_eq!(doc.plain_text(), "x < y");
    }

    #[test]
    fn print_page_embeds_stylesheet_and_escaped_title() {
        let page = render_print_page(&Document::from_plain_text("body"), "Q&A");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Q&amp;A</title>"));
        assert!(page.contains(".definition"));
        assert!(page.contains("<p>body</p>"));
    }
}
