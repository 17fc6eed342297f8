//! Wiki-link resolution for text nodes.
//!
//! Text like `See [FrontPage] first` links to other wiki pages by title. The
//! [`LinkResolver`] rewrites every `[Title]` token into an anchor while the
//! document is rendered, asking a [`PageOracle`] whether the target page
//! exists. Missing pages are still linked (so they can be created) but are
//! marked with a danger-colored span.

use std::error::Error as StdError;
use std::io::{self, Write};
use std::ops::Range;

use crate::html::{HookStatus, TextHook};
use crate::util::push_escaped;

/// Markup appended to the title of a link to a missing page.
const MISSING_PAGE_SUFFIX: &str = " <sup>(No such page)</sup>";

/// Class marking links to missing pages.
const MISSING_PAGE_CLASS: &str = "has-text-danger";

/// Error returned by a [`PageOracle`] that could not determine existence.
#[derive(Debug, thiserror::Error)]
#[error("Failed to look up page {title}: {source}")]
pub struct LookupError {
    /// Title that was looked up.
    pub title: String,
    source: Box<dyn StdError + Send + Sync>,
}

impl LookupError {
    /// Create a lookup error for `title`.
    pub fn new(title: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
        }
    }
}

/// Answers whether a wiki page exists.
///
/// Any `Fn(&str) -> bool` closure is an oracle. Implementations backed by I/O
/// return [`LookupError`] when they cannot tell; the resolver then treats the
/// page as missing. An oracle shared between concurrent renders must be
/// safe to query from several threads at once.
pub trait PageOracle {
    /// Whether a page titled `title` exists.
    fn page_exists(&self, title: &str) -> Result<bool, LookupError>;
}

impl<F> PageOracle for F
where
    F: Fn(&str) -> bool,
{
    fn page_exists(&self, title: &str) -> Result<bool, LookupError> {
        Ok(self(title))
    }
}

/// Whether `title` is a valid page title (`[A-Za-z0-9]+`).
#[must_use]
pub fn is_valid_title(title: &str) -> bool {
    !title.is_empty() && title.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

/// A `[Title]` token inside a text literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BracketLink<'a> {
    /// Byte range of the whole token, brackets included.
    pub range: Range<usize>,
    /// Title between the brackets.
    pub title: &'a str,
}

/// Iterator over the `[Title]` tokens of a text literal.
///
/// Tokens are found left to right without overlap. A token closes at the
/// first `]` after its `[`, and only when every byte between them is an
/// ASCII letter or digit.
#[derive(Clone, Debug)]
pub struct BracketLinks<'a> {
    text: &'a str,
    pos: usize,
}

/// Find the `[Title]` tokens in `text`.
#[must_use]
pub fn bracket_links(text: &str) -> BracketLinks<'_> {
    BracketLinks { text, pos: 0 }
}

impl<'a> Iterator for BracketLinks<'a> {
    type Item = BracketLink<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let open = self.pos + bytes[self.pos..].iter().position(|&b| b == b'[')?;
            let title_start = open + 1;
            let mut close = title_start;
            while close < bytes.len() && bytes[close].is_ascii_alphanumeric() {
                close += 1;
            }

            if close > title_start && bytes.get(close) == Some(&b']') {
                self.pos = close + 1;
                return Some(BracketLink {
                    range: open..close + 1,
                    title: &self.text[title_start..close],
                });
            }
            self.pos = title_start;
        }
        None
    }
}

/// Rewrites `[Title]` tokens in text nodes into anchors.
///
/// Plugged into [`HtmlRenderer`](crate::HtmlRenderer) as its [`TextHook`].
/// Text around the tokens is HTML-escaped; every text node is reported as
/// handled.
pub struct LinkResolver<'o> {
    /// Link path prefix, already escaped for use in an attribute.
    prefix: String,
    oracle: &'o dyn PageOracle,
    links: usize,
    missing: usize,
}

impl<'o> LinkResolver<'o> {
    /// Create a resolver linking titles under `prefix`.
    pub fn new(prefix: &str, oracle: &'o dyn PageOracle) -> Self {
        let mut escaped = String::with_capacity(prefix.len());
        push_escaped(&mut escaped, prefix);
        Self {
            prefix: escaped,
            oracle,
            links: 0,
            missing: 0,
        }
    }

    /// Number of bracket links rewritten so far.
    pub fn links(&self) -> usize {
        self.links
    }

    /// Number of rewritten links whose page does not exist.
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Rewrite one text literal into HTML.
    ///
    /// The literal itself is not modified; a new buffer is returned.
    pub fn rewrite(&mut self, literal: &str) -> String {
        let mut out = String::with_capacity(literal.len());
        let mut copied = 0;
        for link in bracket_links(literal) {
            push_escaped(&mut out, &literal[copied..link.range.start]);
            self.push_anchor(&mut out, link.title);
            copied = link.range.end;
        }
        push_escaped(&mut out, &literal[copied..]);
        out
    }

    fn push_anchor(&mut self, out: &mut String, title: &str) {
        let exists = self.exists(title);
        self.links += 1;
        tracing::trace!(title, exists, "Resolved wiki link");

        out.push_str(r#"<a href=""#);
        out.push_str(&self.prefix);
        out.push_str(title);
        out.push_str(r#"">"#);
        if exists {
            out.push_str(title);
        } else {
            self.missing += 1;
            out.push_str(r#"<span class=""#);
            out.push_str(MISSING_PAGE_CLASS);
            out.push_str(r#"">"#);
            out.push_str(title);
            out.push_str(MISSING_PAGE_SUFFIX);
            out.push_str("</span>");
        }
        out.push_str("</a>");
    }

    /// Ask the oracle, treating lookup failures as a missing page.
    fn exists(&self, title: &str) -> bool {
        match self.oracle.page_exists(title) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(title, error = %e, "Page lookup failed, treating page as missing");
                false
            }
        }
    }
}

impl TextHook for LinkResolver<'_> {
    fn text(&mut self, literal: &str, out: &mut dyn Write) -> io::Result<HookStatus> {
        let html = self.rewrite(literal);
        out.write_all(html.as_bytes())?;
        Ok(HookStatus::HANDLED)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn titles(text: &str) -> Vec<&str> {
        bracket_links(text).map(|link| link.title).collect()
    }

    fn existing(titles: &[&str]) -> impl Fn(&str) -> bool + use<> {
        let set: HashSet<String> = titles.iter().map(|&t| t.to_owned()).collect();
        move |title: &str| set.contains(title)
    }

    struct FailingOracle;

    impl PageOracle for FailingOracle {
        fn page_exists(&self, title: &str) -> Result<bool, LookupError> {
            Err(LookupError::new(
                title,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ))
        }
    }

    #[test]
    fn test_bracket_links_single() {
        let links: Vec<_> = bracket_links("Visit [Home] now").collect();
        assert_eq!(
            links,
            [BracketLink {
                range: 6..12,
                title: "Home"
            }]
        );
    }

    #[test]
    fn test_bracket_links_adjacent() {
        assert_eq!(titles("[A][B]x[C]"), ["A", "B", "C"]);
    }

    #[test]
    fn test_bracket_links_rejects_other_characters() {
        assert!(titles("[Front Page] [a-b] [] [ä]").is_empty());
    }

    #[test]
    fn test_bracket_links_first_close_wins() {
        assert_eq!(titles("[[Inner]]"), ["Inner"]);
        assert_eq!(titles("[Open [Closed]"), ["Closed"]);
    }

    #[test]
    fn test_bracket_links_unterminated() {
        assert!(titles("[Home").is_empty());
        assert!(titles("trailing [").is_empty());
    }

    #[test]
    fn test_is_valid_title() {
        assert!(is_valid_title("FrontPage2"));
        assert!(!is_valid_title(""));
        assert!(!is_valid_title("../etc"));
        assert!(!is_valid_title("Front Page"));
    }

    #[test]
    fn test_rewrite_existing_page() {
        let oracle = existing(&["Home"]);
        let mut resolver = LinkResolver::new("/view/", &oracle);
        assert_eq!(
            resolver.rewrite("Visit [Home] for info."),
            r#"Visit <a href="/view/Home">Home</a> for info."#
        );
        assert_eq!(resolver.links(), 1);
        assert_eq!(resolver.missing(), 0);
    }

    #[test]
    fn test_rewrite_missing_page() {
        let oracle = existing(&[]);
        let mut resolver = LinkResolver::new("/view/", &oracle);
        assert_eq!(
            resolver.rewrite("See [Nope] page"),
            r#"See <a href="/view/Nope"><span class="has-text-danger">Nope <sup>(No such page)</sup></span></a> page"#
        );
        assert_eq!(resolver.missing(), 1);
    }

    #[test]
    fn test_rewrite_mixed_in_order() {
        let oracle = existing(&["Home"]);
        let mut resolver = LinkResolver::new("", &oracle);
        let html = resolver.rewrite("[Home] and [Gone]");
        let home = html.find(r#"<a href="Home">Home</a>"#).unwrap();
        let gone = html.find(r#"<a href="Gone"><span class="has-text-danger">"#).unwrap();
        assert!(home < gone);
        assert_eq!(resolver.links(), 2);
    }

    #[test]
    fn test_rewrite_without_links_escapes_text() {
        let oracle = existing(&[]);
        let mut resolver = LinkResolver::new("/view/", &oracle);
        assert_eq!(resolver.rewrite("a < b & [not a link]"), "a &lt; b &amp; [not a link]");
        assert_eq!(resolver.links(), 0);
    }

    #[test]
    fn test_rewrite_titles_are_case_sensitive() {
        let oracle = existing(&["Home"]);
        let mut resolver = LinkResolver::new("/view/", &oracle);
        assert!(resolver.rewrite("[home]").contains("has-text-danger"));
    }

    #[test]
    fn test_oracle_failure_means_missing() {
        let mut resolver = LinkResolver::new("/view/", &FailingOracle);
        let html = resolver.rewrite("[Secret]");
        assert!(html.contains(r#"<span class="has-text-danger">Secret"#));
    }

    #[test]
    fn test_oracle_queried_per_occurrence() {
        let calls = std::cell::Cell::new(0);
        let oracle = |_: &str| {
            calls.set(calls.get() + 1);
            true
        };
        let mut resolver = LinkResolver::new("/view/", &oracle);
        resolver.rewrite("[A] [A] [B]");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_prefix_is_escaped() {
        let oracle = existing(&["Home"]);
        let mut resolver = LinkResolver::new(r#"/a"b/"#, &oracle);
        assert!(
            resolver
                .rewrite("[Home]")
                .starts_with(r#"<a href="/a&quot;b/Home">"#)
        );
    }

    #[test]
    fn test_text_hook_writes_and_reports_handled() {
        let oracle = existing(&["Home"]);
        let mut resolver = LinkResolver::new("/view/", &oracle);
        let mut out = Vec::new();
        let status = resolver.text("[Home]", &mut out).unwrap();
        assert_eq!(status, HookStatus::HANDLED);
        assert_eq!(String::from_utf8(out).unwrap(), r#"<a href="/view/Home">Home</a>"#);
    }
}
