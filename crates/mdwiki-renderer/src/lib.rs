//! Markdown rendering for wiki pages.
//!
//! This crate turns one page's markdown source into HTML:
//!
//! 1. [`normalize`] strips carriage returns.
//! 2. [`parse`] builds a [`Node`] tree with a fixed extension set.
//! 3. [`HtmlRenderer`] walks the tree and writes HTML, handing every text leaf
//!    to a [`TextHook`].
//! 4. [`LinkResolver`] is the hook used for wiki pages: it rewrites
//!    `[Title]` tokens into anchors, asking a [`PageOracle`] which pages exist.
//!
//! [`MarkdownRenderer`] runs all four steps. Its output is trusted markup mixed
//! with raw HTML from the page and must be sanitized before it is served.
//!
//! # Example
//!
//! ```
//! use mdwiki_renderer::MarkdownRenderer;
//!
//! let mut html = Vec::new();
//! MarkdownRenderer::new()
//!     .render(b"See [FrontPage]", &|_: &str| true, &mut html)
//!     .unwrap();
//! assert_eq!(
//!     String::from_utf8(html).unwrap(),
//!     "<p>See <a href=\"/view/FrontPage\">FrontPage</a></p>\n"
//! );
//! ```

mod ast;
mod autolink;
mod heading;
mod html;
mod links;
mod normalize;
mod parser;
mod renderer;
mod script;
mod util;
mod walk;

pub use ast::{Node, NodeKind};
pub use html::{HookStatus, HtmlRenderer, NoHook, TextHook};
pub use links::{
    BracketLink, BracketLinks, LinkResolver, LookupError, PageOracle, bracket_links,
    is_valid_title,
};
pub use normalize::normalize;
pub use parser::{extensions, parse};
pub use renderer::{DEFAULT_LINK_PREFIX, MarkdownRenderer, RenderStats};
pub use util::escape_html;
pub use walk::{Visitor, WalkStatus, walk};
