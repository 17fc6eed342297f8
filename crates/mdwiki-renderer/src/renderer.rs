//! Full markdown-to-HTML rendering for one wiki page.

use std::io::{self, Write};

use crate::html::HtmlRenderer;
use crate::links::{LinkResolver, PageOracle};
use crate::normalize::normalize;
use crate::parser::parse;

/// Link prefix used when none is configured.
pub const DEFAULT_LINK_PREFIX: &str = "/view/";

/// Counters collected while rendering a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Number of `[Title]` links rewritten.
    pub links: usize,
    /// Number of those links pointing at missing pages.
    pub missing: usize,
}

/// Markdown renderer with wiki-link resolution.
///
/// Runs normalization, parsing and HTML rendering with a [`LinkResolver`] as
/// the text hook. The output is not sanitized.
///
/// # Example
///
/// ```
/// use mdwiki_renderer::MarkdownRenderer;
///
/// let exists = |title: &str| title == "Home";
/// let mut html = Vec::new();
/// let stats = MarkdownRenderer::new()
///     .render(b"Visit [Home] or [Nope].", &exists, &mut html)
///     .unwrap();
/// assert_eq!(stats.links, 2);
/// assert_eq!(stats.missing, 1);
/// ```
#[derive(Clone, Debug)]
pub struct MarkdownRenderer {
    link_prefix: String,
}

impl MarkdownRenderer {
    /// Create a renderer linking pages under [`DEFAULT_LINK_PREFIX`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            link_prefix: DEFAULT_LINK_PREFIX.to_owned(),
        }
    }

    /// Set the path prefix prepended to page titles in link targets.
    #[must_use]
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    /// Path prefix prepended to page titles in link targets.
    #[must_use]
    pub fn link_prefix(&self) -> &str {
        &self.link_prefix
    }

    /// Render raw page source into `out`.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns the first write error from `out`.
    pub fn render<W: Write>(
        &self,
        source: &[u8],
        oracle: &dyn PageOracle,
        out: &mut W,
    ) -> io::Result<RenderStats> {
        let normalized = normalize(source);
        let markdown = String::from_utf8_lossy(&normalized);
        let document = parse(&markdown);

        let mut renderer = HtmlRenderer::new(LinkResolver::new(&self.link_prefix, oracle));
        renderer.render(&document, out)?;

        let resolver = renderer.into_hook();
        Ok(RenderStats {
            links: resolver.links(),
            missing: resolver.missing(),
        })
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(source: &[u8], exists: &dyn Fn(&str) -> bool) -> (String, RenderStats) {
        let mut out = Vec::new();
        let stats = MarkdownRenderer::new()
            .render(source, &exists, &mut out)
            .unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_render_existing_link() {
        let (html, stats) = render(b"Visit [Home] for info.", &|t| t == "Home");
        assert_eq!(
            html,
            "<p>Visit <a href=\"/view/Home\">Home</a> for info.</p>\n"
        );
        assert_eq!(stats, RenderStats { links: 1, missing: 0 });
    }

    #[test]
    fn test_render_escaped_brackets_stay_literal() {
        let (html, stats) = render(br"\[Home\] escaped", &|_| true);
        assert_eq!(html, "<p>[Home] escaped</p>\n");
        assert_eq!(stats, RenderStats { links: 0, missing: 0 });
    }

    #[test]
    fn test_render_intraword_scripts() {
        let (html, _) = render(b"H~2~O and x^2^", &|_| false);
        assert_eq!(html, "<p>H<sub>2</sub>O and x<sup>2</sup></p>\n");
    }

    #[test]
    fn test_render_strips_carriage_returns() {
        let (html, _) = render(b"line one\r\nline two\r\n", &|_| false);
        assert_eq!(html, "<p>line one\nline two</p>\n");
    }

    #[test]
    fn test_render_invalid_utf8_is_replaced() {
        let (html, _) = render(b"bad \xff byte", &|_| false);
        assert_eq!(html, "<p>bad \u{fffd} byte</p>\n");
    }

    #[test]
    fn test_render_links_in_headings_and_lists() {
        let (html, stats) = render(b"# See [Home]\n\n- [Gone]\n", &|t| t == "Home");
        assert!(html.starts_with("<h1 id=\"see-home\">See <a href=\"/view/Home\">Home</a></h1>\n"));
        assert!(html.contains("<li><a href=\"/view/Gone\"><span class=\"has-text-danger\">"));
        assert_eq!(stats, RenderStats { links: 2, missing: 1 });
    }

    #[test]
    fn test_render_code_is_not_resolved() {
        let (html, stats) = render(b"`[Home]`\n\n```\n[Home]\n```", &|_| true);
        assert!(html.contains("<code>[Home]</code>"));
        assert!(html.contains("<pre><code>[Home]\n</code></pre>"));
        assert_eq!(stats.links, 0);
    }

    #[test]
    fn test_render_custom_prefix() {
        let mut out = Vec::new();
        MarkdownRenderer::new()
            .with_link_prefix("/wiki/")
            .render(b"[Home]", &|_: &str| true, &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<p><a href=\"/wiki/Home\">Home</a></p>\n"
        );
    }
}
