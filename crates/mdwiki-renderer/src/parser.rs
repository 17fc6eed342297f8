//! Markdown parsing into the document tree.
//!
//! Parsing is delegated to `pulldown-cmark` with a fixed extension set. The
//! event stream is folded into a [`Node`] tree: adjacent text fragments are
//! merged, bare URLs are autolinked, headings receive anchor ids and footnote
//! definitions are gathered into a trailing [`NodeKind::Footnotes`] section.
//!
//! A backslash-escaped character always ends up in a text leaf of its own, so
//! `\[Home\]` never forms a bracket token or a script span.

use std::collections::HashMap;
use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::ast::{Node, NodeKind};
use crate::autolink::split_autolinks;
use crate::heading::HeadingIds;
use crate::script::split_scripts;
use crate::util::{heading_level_to_num, slice_literal};

/// Markdown extensions enabled for every page.
///
/// Fenced code, backslash line breaks and paragraph-interrupting blocks are
/// part of CommonMark itself. Bare URL autolinking and automatic heading ids
/// are applied while building the tree, together with intraword `x^2^` and
/// `H~2~O` scripts.
#[must_use]
pub fn extensions() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_MATH
        | Options::ENABLE_SUPERSCRIPT
        | Options::ENABLE_SUBSCRIPT
        | Options::ENABLE_FOOTNOTES
}

/// Parse markdown into a document tree.
///
/// Never fails: malformed markdown produces a best-effort tree.
#[must_use]
pub fn parse(markdown: &str) -> Node<'_> {
    let mut builder = TreeBuilder::new(markdown);
    for (event, range) in Parser::new_ext(markdown, extensions()).into_offset_iter() {
        builder.push_event(event, range);
    }
    builder.finish()
}

/// Where an open container's content goes.
enum Pending<'a> {
    /// A regular node; content becomes its children.
    Node(NodeKind<'a>),
    /// A code block; text accumulates into the literal.
    CodeBlock {
        info: Option<CowStr<'a>>,
        literal: String,
    },
    /// A raw HTML block.
    HtmlBlock(String),
    /// A footnote definition, set aside until the document ends.
    Footnote(CowStr<'a>),
    /// Content that is parsed but never rendered.
    Discard,
}

/// An open container.
struct Frame<'a> {
    pending: Pending<'a>,
    children: Vec<Node<'a>>,
    /// Whether this frame sits inside a link or image.
    in_link: bool,
    /// The last text leaf holds an escaped character and must not grow.
    text_sealed: bool,
}

impl<'a> Frame<'a> {
    fn new(pending: Pending<'a>, in_link: bool) -> Self {
        Self {
            pending,
            children: Vec::new(),
            in_link,
            text_sealed: false,
        }
    }

    /// Append text, merging into a preceding text leaf.
    ///
    /// The parser may split text around brackets and entities; merging keeps
    /// bracket tokens in one leaf.
    fn push_text(&mut self, text: CowStr<'a>) {
        let sealed = std::mem::take(&mut self.text_sealed);
        match self.children.last_mut() {
            Some(Node {
                kind: NodeKind::Text(previous),
                ..
            }) if !sealed => {
                let mut merged = String::with_capacity(previous.len() + text.len());
                merged.push_str(previous);
                merged.push_str(&text);
                *previous = merged.into();
            }
            _ => self.children.push(Node::text(text)),
        }
    }
}

/// Current table layout, used to tag cells with alignment and header flag.
#[derive(Default)]
struct TableLayout {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell_index: usize,
}

struct TreeBuilder<'a> {
    source: &'a str,
    stack: Vec<Frame<'a>>,
    heading_ids: HeadingIds,
    table: TableLayout,
    /// Footnote label to display number, in order of first reference.
    footnote_numbers: HashMap<String, usize>,
    footnotes: Vec<(CowStr<'a>, Vec<Node<'a>>)>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            stack: vec![Frame::new(Pending::Node(NodeKind::Document), false)],
            heading_ids: HeadingIds::default(),
            table: TableLayout::default(),
            footnote_numbers: HashMap::new(),
            footnotes: Vec::new(),
        }
    }

    fn push_event(&mut self, event: Event<'a>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                let escaped = self.starts_escaped(&text, &range);
                self.text(text, escaped);
            }
            Event::Code(code) => self.push_leaf(NodeKind::Code(code)),
            Event::Html(html) => self.html(html),
            Event::InlineHtml(html) => self.push_leaf(NodeKind::InlineHtml(html)),
            Event::InlineMath(math) => self.push_leaf(NodeKind::InlineMath(math)),
            Event::DisplayMath(math) => self.push_leaf(NodeKind::DisplayMath(math)),
            Event::FootnoteReference(label) => {
                let number = self.footnote_number(&label);
                self.push_leaf(NodeKind::FootnoteReference { label, number });
            }
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_leaf(NodeKind::HardBreak),
            Event::Rule => self.push_leaf(NodeKind::Rule),
            Event::TaskListMarker(_) => {
                // Task lists are not enabled
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'a>) {
        let pending = match tag {
            Tag::Paragraph => Pending::Node(NodeKind::Paragraph),
            Tag::Heading { level, id, .. } => {
                // Id is resolved on close, once the heading text is known.
                let explicit = id.map(|id| id.to_string()).unwrap_or_default();
                Pending::Node(NodeKind::Heading {
                    level: heading_level_to_num(level),
                    id: explicit,
                })
            }
            Tag::BlockQuote(_) => Pending::Node(NodeKind::BlockQuote),
            Tag::CodeBlock(kind) => Pending::CodeBlock {
                info: match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => Some(info),
                    _ => None,
                },
                literal: String::new(),
            },
            Tag::HtmlBlock => Pending::HtmlBlock(String::new()),
            Tag::List(start) => Pending::Node(NodeKind::List { start }),
            Tag::Item => Pending::Node(NodeKind::Item),
            Tag::FootnoteDefinition(label) => Pending::Footnote(label),
            Tag::DefinitionList => Pending::Node(NodeKind::DefinitionList),
            Tag::DefinitionListTitle => Pending::Node(NodeKind::DefinitionTitle),
            Tag::DefinitionListDefinition => Pending::Node(NodeKind::DefinitionDetails),
            Tag::Table(alignments) => {
                self.table = TableLayout {
                    alignments,
                    ..TableLayout::default()
                };
                Pending::Node(NodeKind::Table)
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell_index = 0;
                Pending::Node(NodeKind::TableHead)
            }
            Tag::TableRow => {
                self.table.cell_index = 0;
                Pending::Node(NodeKind::TableRow)
            }
            Tag::TableCell => {
                let alignment = self
                    .table
                    .alignments
                    .get(self.table.cell_index)
                    .copied()
                    .unwrap_or(Alignment::None);
                self.table.cell_index += 1;
                Pending::Node(NodeKind::TableCell {
                    alignment,
                    header: self.table.in_head,
                })
            }
            Tag::Emphasis => Pending::Node(NodeKind::Emphasis),
            Tag::Strong => Pending::Node(NodeKind::Strong),
            Tag::Strikethrough => Pending::Node(NodeKind::Strikethrough),
            Tag::Superscript => Pending::Node(NodeKind::Superscript),
            Tag::Subscript => Pending::Node(NodeKind::Subscript),
            Tag::Link {
                dest_url, title, ..
            } => Pending::Node(NodeKind::Link {
                dest: dest_url,
                title,
            }),
            Tag::Image {
                dest_url, title, ..
            } => Pending::Node(NodeKind::Image {
                dest: dest_url,
                title,
            }),
            Tag::MetadataBlock(_) => Pending::Discard,
        };

        let in_link = self.in_link()
            || matches!(
                pending,
                Pending::Node(NodeKind::Link { .. } | NodeKind::Image { .. })
            );
        self.stack.push(Frame::new(pending, in_link));
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if tag == TagEnd::TableHead {
            self.table.in_head = false;
        }

        // The document frame is never popped by an end tag.
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let children = split_text_children(frame.children, !frame.in_link);

        let node = match frame.pending {
            Pending::Node(NodeKind::Heading { level, id }) => {
                let id = if id.is_empty() {
                    let text: String = children.iter().map(Node::plain_text).collect();
                    self.heading_ids.generate(&text)
                } else {
                    self.heading_ids.explicit(&id)
                };
                Node::container(NodeKind::Heading { level, id }, children)
            }
            Pending::Node(kind) => Node::container(kind, children),
            Pending::CodeBlock { info, literal } => Node::leaf(NodeKind::CodeBlock {
                info,
                literal: literal.into(),
            }),
            Pending::HtmlBlock(literal) => Node::leaf(NodeKind::HtmlBlock(literal.into())),
            Pending::Footnote(label) => {
                self.footnotes.push((label, children));
                return;
            }
            Pending::Discard => return,
        };
        self.push_node(node);
    }

    fn text(&mut self, text: CowStr<'a>, escaped: bool) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        match &mut frame.pending {
            Pending::CodeBlock { literal, .. } | Pending::HtmlBlock(literal) => {
                literal.push_str(&text);
                return;
            }
            Pending::Discard => return,
            Pending::Node(_) | Pending::Footnote(_) => {}
        }

        if !escaped {
            frame.push_text(text);
            return;
        }
        let split = text.chars().next().map_or(text.len(), char::len_utf8);
        frame.children.push(Node::text(slice_literal(&text, 0..split)));
        frame.text_sealed = true;
        if split < text.len() {
            frame.push_text(slice_literal(&text, split..text.len()));
        }
    }

    /// Whether a text fragment begins with a backslash-escaped character.
    ///
    /// The fragment's source range starts either at the escaped character or
    /// at its backslash. The character is escaped when an odd number of
    /// backslashes precede it.
    fn starts_escaped(&self, text: &str, range: &Range<usize>) -> bool {
        let Some(first) = text.bytes().next().filter(u8::is_ascii_punctuation) else {
            return false;
        };
        let source = self.source.as_bytes();
        let at = range.start;
        let position = if source.get(at) == Some(&first) {
            at
        } else if source.get(at) == Some(&b'\\') && source.get(at + 1) == Some(&first) {
            at + 1
        } else {
            return false;
        };
        let backslashes = source[..position]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        backslashes % 2 == 1
    }

    fn html(&mut self, html: CowStr<'a>) {
        match self.stack.last_mut() {
            Some(Frame {
                pending: Pending::HtmlBlock(literal),
                ..
            }) => literal.push_str(&html),
            _ => self.push_leaf(NodeKind::InlineHtml(html)),
        }
    }

    fn soft_break(&mut self) {
        match self.stack.last_mut() {
            Some(Frame {
                pending: Pending::CodeBlock { literal, .. },
                ..
            }) => literal.push('\n'),
            _ => self.push_leaf(NodeKind::SoftBreak),
        }
    }

    fn push_leaf(&mut self, kind: NodeKind<'a>) {
        self.push_node(Node::leaf(kind));
    }

    fn push_node(&mut self, node: Node<'a>) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(node);
        }
    }

    fn in_link(&self) -> bool {
        self.stack.last().is_some_and(|frame| frame.in_link)
    }

    fn footnote_number(&mut self, label: &str) -> usize {
        let next = self.footnote_numbers.len() + 1;
        *self
            .footnote_numbers
            .entry(label.to_owned())
            .or_insert(next)
    }

    fn finish(mut self) -> Node<'a> {
        // Close anything the parser left open.
        while self.stack.len() > 1 {
            self.end_tag(TagEnd::Paragraph);
        }
        let Some(root) = self.stack.pop() else {
            return Node::container(NodeKind::Document, Vec::new());
        };
        let mut children = split_text_children(root.children, true);

        if !self.footnotes.is_empty() {
            children.push(self.footnote_section());
        }
        Node::container(NodeKind::Document, children)
    }

    /// Build the trailing footnote section, ordered by reference number.
    ///
    /// Definitions that are never referenced are numbered after the rest.
    fn footnote_section(&mut self) -> Node<'a> {
        let mut definitions: Vec<Node<'a>> = std::mem::take(&mut self.footnotes)
            .into_iter()
            .map(|(label, children)| {
                let number = self.footnote_number(&label);
                Node::container(NodeKind::FootnoteDefinition { label, number }, children)
            })
            .collect();
        definitions.sort_by_key(|node| match node.kind {
            NodeKind::FootnoteDefinition { number, .. } => number,
            _ => usize::MAX,
        });
        Node::container(NodeKind::Footnotes, definitions)
    }
}

/// Split text children into bare URL links and intraword scripts.
///
/// URLs are found first so a `~` inside a URL stays part of it. Children of
/// a link are never autolinked.
fn split_text_children(children: Vec<Node<'_>>, autolink: bool) -> Vec<Node<'_>> {
    let needs_split = children.iter().any(|child| {
        matches!(&child.kind, NodeKind::Text(text) if text.contains([':', '^', '~']))
    });
    if !needs_split {
        return children;
    }

    let mut result = Vec::with_capacity(children.len());
    for child in children {
        let linked = match &child.kind {
            NodeKind::Text(text) if autolink => split_autolinks(text),
            _ => None,
        };
        for node in linked.unwrap_or_else(|| vec![child]) {
            match &node.kind {
                NodeKind::Text(text) => match split_scripts(text) {
                    Some(nodes) => result.extend(nodes),
                    None => result.push(node),
                },
                _ => result.push(node),
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn body(markdown: &str) -> Vec<Node<'_>> {
        parse(markdown).children
    }

    fn first_paragraph(markdown: &str) -> Vec<Node<'_>> {
        let mut blocks = body(markdown);
        assert_eq!(blocks[0].kind, NodeKind::Paragraph);
        blocks.swap_remove(0).children
    }

    #[test]
    fn test_paragraph_text() {
        assert_eq!(first_paragraph("Hello, world!"), vec![Node::text("Hello, world!")]);
    }

    #[test]
    fn test_bracket_text_merged_into_one_leaf() {
        let inline = first_paragraph("Visit [Home] for info.");
        assert_eq!(inline, vec![Node::text("Visit [Home] for info.")]);
    }

    #[test]
    fn test_heading_auto_id() {
        let blocks = body("## Section Title");
        assert_eq!(
            blocks[0].kind,
            NodeKind::Heading {
                level: 2,
                id: "section-title".to_owned()
            }
        );
    }

    #[test]
    fn test_heading_explicit_id() {
        let blocks = body("# Title {#custom}\n\n# Custom");
        assert_eq!(
            blocks[0].kind,
            NodeKind::Heading {
                level: 1,
                id: "custom".to_owned()
            }
        );
        assert_eq!(
            blocks[1].kind,
            NodeKind::Heading {
                level: 1,
                id: "custom-1".to_owned()
            }
        );
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let ids: Vec<_> = body("## FAQ\n\n## FAQ\n\n## FAQ")
            .into_iter()
            .map(|node| match node.kind {
                NodeKind::Heading { id, .. } => id,
                other => panic!("unexpected node {other:?}"),
            })
            .collect();
        assert_eq!(ids, ["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_heading_requires_space() {
        let blocks = body("#NotAHeading");
        assert_eq!(blocks[0].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_fenced_code_block() {
        let blocks = body("```rust\nfn main() {}\n```");
        assert_eq!(
            blocks[0].kind,
            NodeKind::CodeBlock {
                info: Some("rust".into()),
                literal: "fn main() {}\n".into()
            }
        );
        assert!(blocks[0].children.is_empty());
    }

    #[test]
    fn test_code_block_without_language() {
        let blocks = body("```\nplain\n```");
        assert_eq!(
            blocks[0].kind,
            NodeKind::CodeBlock {
                info: None,
                literal: "plain\n".into()
            }
        );
    }

    #[test]
    fn test_list_interrupts_paragraph() {
        let blocks = body("Intro line\n- one\n- two");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind, NodeKind::List { start: None });
        assert_eq!(blocks[1].children.len(), 2);
    }

    #[test]
    fn test_table_cells_carry_alignment() {
        let blocks = body("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(blocks[0].kind, NodeKind::Table);
        let head = &blocks[0].children[0];
        assert_eq!(head.kind, NodeKind::TableHead);
        assert_eq!(
            head.children[0].kind,
            NodeKind::TableCell {
                alignment: Alignment::Left,
                header: true
            }
        );
        let row = &blocks[0].children[1];
        assert_eq!(
            row.children[1].kind,
            NodeKind::TableCell {
                alignment: Alignment::Right,
                header: false
            }
        );
    }

    #[test]
    fn test_bare_url_autolinked() {
        let inline = first_paragraph("Docs at https://example.com/docs.");
        assert_eq!(inline.len(), 3);
        assert_eq!(inline[0], Node::text("Docs at "));
        assert_eq!(
            inline[1].kind,
            NodeKind::Link {
                dest: "https://example.com/docs".into(),
                title: "".into()
            }
        );
        assert_eq!(inline[2], Node::text("."));
    }

    #[test]
    fn test_url_inside_link_not_autolinked() {
        let inline = first_paragraph("[https://example.com](https://example.com)");
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].children, vec![Node::text("https://example.com")]);
    }

    #[test]
    fn test_strikethrough_superscript_subscript() {
        let inline = first_paragraph("~~gone~~ x^2^ H~2~O");
        let kinds: Vec<_> = inline.iter().map(|node| node.kind.clone()).collect();
        assert!(kinds.contains(&NodeKind::Strikethrough));
        assert!(kinds.contains(&NodeKind::Superscript));
        assert!(kinds.contains(&NodeKind::Subscript));
    }

    #[test]
    fn test_intraword_scripts() {
        let inline = first_paragraph("H~2~O");
        assert_eq!(
            inline,
            vec![
                Node::text("H"),
                Node::container(NodeKind::Subscript, vec![Node::text("2")]),
                Node::text("O"),
            ]
        );
    }

    #[test]
    fn test_url_tilde_not_subscript() {
        let inline = first_paragraph("see https://example.com/~a~b now");
        assert!(inline.iter().all(|node| node.kind != NodeKind::Subscript));
    }

    #[test]
    fn test_escaped_brackets_kept_apart() {
        let inline = first_paragraph(r"\[Home\] escaped");
        let plain: String = inline.iter().map(Node::plain_text).collect();
        assert_eq!(plain, "[Home] escaped");
        assert!(inline.iter().all(|node| match &node.kind {
            NodeKind::Text(text) => !text.contains("[Home]"),
            _ => true,
        }));
    }

    #[test]
    fn test_escaped_open_bracket_kept_apart() {
        let inline = first_paragraph(r"\[Home] and [Away\]");
        assert!(inline.iter().all(|node| match &node.kind {
            NodeKind::Text(text) => !text.contains("[Home]") && !text.contains("[Away]"),
            _ => true,
        }));
    }

    #[test]
    fn test_escaped_backslash_keeps_bracket_token() {
        let inline = first_paragraph(r"\\[Home]");
        let plain: String = inline.iter().map(Node::plain_text).collect();
        assert_eq!(plain, r"\[Home]");
        assert!(inline.iter().any(|node| match &node.kind {
            NodeKind::Text(text) => text.contains("[Home]"),
            _ => false,
        }));
    }

    #[test]
    fn test_escaped_caret_not_superscript() {
        let inline = first_paragraph(r"x\^2^");
        assert!(inline.iter().all(|node| node.kind != NodeKind::Superscript));
    }

    #[test]
    fn test_math() {
        let inline = first_paragraph("Euler: $e^{i\\pi} + 1 = 0$");
        assert!(
            inline
                .iter()
                .any(|node| matches!(node.kind, NodeKind::InlineMath(_)))
        );
    }

    #[test]
    fn test_definition_list() {
        let blocks = body("Term\n: Definition");
        assert_eq!(blocks[0].kind, NodeKind::DefinitionList);
        assert_eq!(blocks[0].children[0].kind, NodeKind::DefinitionTitle);
        assert_eq!(blocks[0].children[1].kind, NodeKind::DefinitionDetails);
    }

    #[test]
    fn test_footnotes_collected_at_end() {
        let blocks = body("First[^b] then[^a].\n\n[^a]: Alpha\n\n[^b]: Beta\n\nAfter.");
        let last = blocks.last().unwrap();
        assert_eq!(last.kind, NodeKind::Footnotes);
        let numbers: Vec<_> = last
            .children
            .iter()
            .map(|node| match &node.kind {
                NodeKind::FootnoteDefinition { label, number } => (label.to_string(), *number),
                other => panic!("unexpected node {other:?}"),
            })
            .collect();
        assert_eq!(numbers, [("b".to_owned(), 1), ("a".to_owned(), 2)]);
        // Definitions are removed from the body.
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_malformed_input_does_not_fail() {
        let blocks = body("**unclosed [bracket ``` `code\n| a |\n|--\n> > >");
        assert!(!blocks.is_empty());
    }
}
