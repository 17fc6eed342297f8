//! Document tree built by the [parser](crate::parse).
//!
//! Every node is a tagged [`NodeKind`] plus its children. Leaf kinds never
//! have children; their literal content is immutable once the tree is built.

use pulldown_cmark::{Alignment, CowStr};

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<'a> {
    /// What this node is.
    pub kind: NodeKind<'a>,
    /// Child nodes, in document order. Always empty for leaves.
    pub children: Vec<Node<'a>>,
}

/// Node taxonomy.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind<'a> {
    /// Root of a parsed page.
    Document,
    Paragraph,
    /// Heading with its final (explicit or generated) anchor id.
    Heading {
        level: u8,
        id: String,
    },
    BlockQuote,
    /// Ordered list when `start` is set, bullet list otherwise.
    List {
        start: Option<u64>,
    },
    Item,
    Table,
    TableHead,
    TableRow,
    TableCell {
        alignment: Alignment,
        header: bool,
    },
    /// Fenced or indented code block. `info` is the raw fence info string.
    CodeBlock {
        info: Option<CowStr<'a>>,
        literal: CowStr<'a>,
    },
    HtmlBlock(CowStr<'a>),
    DefinitionList,
    DefinitionTitle,
    DefinitionDetails,
    /// Trailing section holding every footnote definition.
    Footnotes,
    FootnoteDefinition {
        label: CowStr<'a>,
        number: usize,
    },
    Rule,
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    Link {
        dest: CowStr<'a>,
        title: CowStr<'a>,
    },
    /// Image; children hold the alt text.
    Image {
        dest: CowStr<'a>,
        title: CowStr<'a>,
    },
    Text(CowStr<'a>),
    Code(CowStr<'a>),
    InlineHtml(CowStr<'a>),
    InlineMath(CowStr<'a>),
    DisplayMath(CowStr<'a>),
    FootnoteReference {
        label: CowStr<'a>,
        number: usize,
    },
    SoftBreak,
    HardBreak,
}

impl NodeKind<'_> {
    /// Whether nodes of this kind are leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::CodeBlock { .. }
                | Self::HtmlBlock(_)
                | Self::Rule
                | Self::Text(_)
                | Self::Code(_)
                | Self::InlineHtml(_)
                | Self::InlineMath(_)
                | Self::DisplayMath(_)
                | Self::FootnoteReference { .. }
                | Self::SoftBreak
                | Self::HardBreak
        )
    }
}

impl<'a> Node<'a> {
    /// Create a leaf node.
    #[must_use]
    pub fn leaf(kind: NodeKind<'a>) -> Self {
        debug_assert!(kind.is_leaf(), "container kind used as leaf: {kind:?}");
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Create a container node.
    #[must_use]
    pub fn container(kind: NodeKind<'a>, children: Vec<Node<'a>>) -> Self {
        Self { kind, children }
    }

    /// Create a text leaf.
    #[must_use]
    pub fn text(literal: impl Into<CowStr<'a>>) -> Self {
        Self::leaf(NodeKind::Text(literal.into()))
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Concatenated text content of this node and its descendants.
    ///
    /// Used for heading slugs and image alt text. Markup is dropped; breaks
    /// become single spaces.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(literal)
            | NodeKind::Code(literal)
            | NodeKind::InlineMath(literal)
            | NodeKind::DisplayMath(literal) => out.push_str(literal),
            NodeKind::SoftBreak | NodeKind::HardBreak => out.push(' '),
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }
}
