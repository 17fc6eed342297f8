//! HTML serialization of the document tree.
//!
//! [`HtmlRenderer`] walks a parsed [`Node`] tree and writes semantic HTML to an
//! [`io::Write`] sink. Text leaves are offered to a [`TextHook`] first; the
//! hook either writes its own markup and reports the node as handled, or
//! leaves it to the default escaped rendering.

use std::io::{self, Write};

use pulldown_cmark::Alignment;

use crate::ast::{Node, NodeKind};
use crate::util::escape_html;
use crate::walk::{Visitor, WalkStatus, walk};

/// Result of offering a text leaf to a [`TextHook`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HookStatus {
    /// How traversal continues after the text node.
    pub walk: WalkStatus,
    /// Whether the hook wrote the node; if not, the default rendering runs.
    pub handled: bool,
}

impl HookStatus {
    /// Hook wrote the text, traversal continues.
    pub const HANDLED: Self = Self {
        walk: WalkStatus::GoToNext,
        handled: true,
    };

    /// Hook declined, default rendering runs.
    pub const UNHANDLED: Self = Self {
        walk: WalkStatus::GoToNext,
        handled: false,
    };
}

/// Override point for text leaves.
pub trait TextHook {
    /// Render `literal` to `out`, or report it unhandled without writing.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if writing fails.
    fn text(&mut self, literal: &str, out: &mut dyn Write) -> io::Result<HookStatus>;
}

/// Hook that leaves every text node to the default rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHook;

impl TextHook for NoHook {
    fn text(&mut self, _literal: &str, _out: &mut dyn Write) -> io::Result<HookStatus> {
        Ok(HookStatus::UNHANDLED)
    }
}

/// Renders a document tree to HTML.
///
/// Produces semantic HTML5 with:
/// - `id` attributes on every heading
/// - `<pre><code class="language-*">` for fenced code with an info string
/// - `align` attributes on aligned table cells
/// - a trailing `<div class="footnotes">` section when footnotes are used
#[derive(Debug, Default)]
pub struct HtmlRenderer<H> {
    hook: H,
}

impl<H: TextHook> HtmlRenderer<H> {
    /// Create a renderer with the given text hook.
    pub fn new(hook: H) -> Self {
        Self { hook }
    }

    /// Borrow the text hook.
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Consume the renderer, returning the text hook.
    pub fn into_hook(self) -> H {
        self.hook
    }

    /// Render `document` into `out`.
    ///
    /// A hook may stop the traversal early; whatever was written up to that
    /// point is kept.
    ///
    /// # Errors
    ///
    /// Returns the first write error from `out` or the hook. Output written
    /// before the failure is left in the sink.
    pub fn render<W: Write>(&mut self, document: &Node<'_>, out: &mut W) -> io::Result<()> {
        let mut visitor = HtmlVisitor {
            hook: &mut self.hook,
            out,
            table_body_open: false,
        };
        walk(document, &mut visitor)?;
        Ok(())
    }
}

struct HtmlVisitor<'r, H, W> {
    hook: &'r mut H,
    out: &'r mut W,
    /// Whether `<tbody>` was opened for the current table.
    table_body_open: bool,
}

impl<H: TextHook, W: Write> Visitor for HtmlVisitor<'_, H, W> {
    type Error = io::Error;

    fn visit(&mut self, node: &Node<'_>, entering: bool) -> io::Result<WalkStatus> {
        if node.is_leaf() {
            return self.leaf(&node.kind);
        }
        if entering {
            self.enter(node)
        } else {
            self.exit(&node.kind)?;
            Ok(WalkStatus::GoToNext)
        }
    }
}

impl<H: TextHook, W: Write> HtmlVisitor<'_, H, W> {
    fn enter(&mut self, node: &Node<'_>) -> io::Result<WalkStatus> {
        match &node.kind {
            NodeKind::Paragraph => self.raw("<p>")?,
            NodeKind::Heading { level, id } => {
                write!(self.out, r#"<h{level} id="{}">"#, escape_html(id))?;
            }
            NodeKind::BlockQuote => self.raw("<blockquote>\n")?,
            NodeKind::List { start: None } => self.raw("<ul>\n")?,
            NodeKind::List { start: Some(1) } => self.raw("<ol>\n")?,
            NodeKind::List { start: Some(start) } => {
                writeln!(self.out, "<ol start=\"{start}\">")?;
            }
            NodeKind::Item => self.raw("<li>")?,
            NodeKind::Table => {
                self.table_body_open = false;
                self.raw("<table>\n")?;
            }
            NodeKind::TableHead => self.raw("<thead>\n<tr>")?,
            NodeKind::TableRow => {
                if !self.table_body_open {
                    self.table_body_open = true;
                    self.raw("<tbody>\n")?;
                }
                self.raw("<tr>")?;
            }
            NodeKind::TableCell { alignment, header } => {
                let tag = if *header { "th" } else { "td" };
                match alignment_name(*alignment) {
                    Some(align) => write!(self.out, r#"<{tag} align="{align}">"#)?,
                    None => write!(self.out, "<{tag}>")?,
                }
            }
            NodeKind::DefinitionList => self.raw("<dl>\n")?,
            NodeKind::DefinitionTitle => self.raw("<dt>")?,
            NodeKind::DefinitionDetails => self.raw("<dd>")?,
            NodeKind::Footnotes => self.raw("<div class=\"footnotes\">\n<hr>\n<ol>\n")?,
            NodeKind::FootnoteDefinition { label, .. } => {
                write!(self.out, r#"<li id="fn:{}">"#, escape_html(label))?;
            }
            NodeKind::Emphasis => self.raw("<em>")?,
            NodeKind::Strong => self.raw("<strong>")?,
            NodeKind::Strikethrough => self.raw("<s>")?,
            NodeKind::Superscript => self.raw("<sup>")?,
            NodeKind::Subscript => self.raw("<sub>")?,
            NodeKind::Link { dest, title } => {
                write!(self.out, r#"<a href="{}""#, escape_html(dest))?;
                self.title_attr(title)?;
                self.raw(">")?;
            }
            NodeKind::Image { dest, title } => {
                write!(self.out, r#"<img src="{}""#, escape_html(dest))?;
                write!(self.out, r#" alt="{}""#, escape_html(&node.plain_text()))?;
                self.title_attr(title)?;
                self.raw(">")?;
                return Ok(WalkStatus::SkipChildren);
            }
            _ => {}
        }
        Ok(WalkStatus::GoToNext)
    }

    fn exit(&mut self, kind: &NodeKind<'_>) -> io::Result<()> {
        match kind {
            NodeKind::Paragraph => self.raw("</p>\n"),
            NodeKind::Heading { level, .. } => writeln!(self.out, "</h{level}>"),
            NodeKind::BlockQuote => self.raw("</blockquote>\n"),
            NodeKind::List { start: None } => self.raw("</ul>\n"),
            NodeKind::List { start: Some(_) } => self.raw("</ol>\n"),
            NodeKind::Item | NodeKind::FootnoteDefinition { .. } => self.raw("</li>\n"),
            NodeKind::Table => {
                if self.table_body_open {
                    self.table_body_open = false;
                    self.raw("</tbody>\n")?;
                }
                self.raw("</table>\n")
            }
            NodeKind::TableHead => self.raw("</tr>\n</thead>\n"),
            NodeKind::TableRow => self.raw("</tr>\n"),
            NodeKind::TableCell { header: true, .. } => self.raw("</th>"),
            NodeKind::TableCell { header: false, .. } => self.raw("</td>"),
            NodeKind::DefinitionList => self.raw("</dl>\n"),
            NodeKind::DefinitionTitle => self.raw("</dt>\n"),
            NodeKind::DefinitionDetails => self.raw("</dd>\n"),
            NodeKind::Footnotes => self.raw("</ol>\n</div>\n"),
            NodeKind::Emphasis => self.raw("</em>"),
            NodeKind::Strong => self.raw("</strong>"),
            NodeKind::Strikethrough => self.raw("</s>"),
            NodeKind::Superscript => self.raw("</sup>"),
            NodeKind::Subscript => self.raw("</sub>"),
            NodeKind::Link { .. } => self.raw("</a>"),
            _ => Ok(()),
        }
    }

    fn leaf(&mut self, kind: &NodeKind<'_>) -> io::Result<WalkStatus> {
        match kind {
            NodeKind::Text(literal) => return self.text(literal),
            NodeKind::CodeBlock { info, literal } => {
                let lang = info.as_deref().and_then(|info| info.split_whitespace().next());
                match lang {
                    Some(lang) => write!(
                        self.out,
                        r#"<pre><code class="language-{}">"#,
                        escape_html(lang)
                    )?,
                    None => self.raw("<pre><code>")?,
                }
                self.escaped(literal)?;
                self.raw("</code></pre>\n")?;
            }
            NodeKind::HtmlBlock(html) | NodeKind::InlineHtml(html) => self.raw(html)?,
            NodeKind::Rule => self.raw("<hr>\n")?,
            NodeKind::Code(code) => {
                self.raw("<code>")?;
                self.escaped(code)?;
                self.raw("</code>")?;
            }
            NodeKind::InlineMath(math) => {
                self.raw(r#"<span class="math inline">\("#)?;
                self.escaped(math)?;
                self.raw(r"\)</span>")?;
            }
            NodeKind::DisplayMath(math) => {
                self.raw(r#"<span class="math display">\["#)?;
                self.escaped(math)?;
                self.raw(r"\]</span>")?;
            }
            NodeKind::FootnoteReference { label, number } => {
                let label = escape_html(label);
                write!(
                    self.out,
                    r##"<sup class="footnote-ref" id="fnref:{label}"><a href="#fn:{label}">{number}</a></sup>"##
                )?;
            }
            NodeKind::SoftBreak => self.raw("\n")?,
            NodeKind::HardBreak => self.raw("<br>\n")?,
            _ => {}
        }
        Ok(WalkStatus::GoToNext)
    }

    fn text(&mut self, literal: &str) -> io::Result<WalkStatus> {
        let status = self.hook.text(literal, &mut *self.out)?;
        if !status.handled {
            self.escaped(literal)?;
        }
        Ok(status.walk)
    }

    fn title_attr(&mut self, title: &str) -> io::Result<()> {
        if title.is_empty() {
            return Ok(());
        }
        write!(self.out, r#" title="{}""#, escape_html(title))
    }

    fn raw(&mut self, html: &str) -> io::Result<()> {
        self.out.write_all(html.as_bytes())
    }

    fn escaped(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(escape_html(text).as_bytes())
    }
}

fn alignment_name(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}
