//! Bare URL autolinking.
//!
//! The markdown parser only links `<https://...>` autolinks. This pass turns
//! bare `http://`, `https://`, `ftp://` and `mailto:` URLs found in text
//! leaves into link nodes. Candidates come from [`linkify`], which handles
//! trailing punctuation and balanced parentheses; only the schemes above are
//! kept, and bare email addresses stay plain text.

use std::ops::Range;

use linkify::{Link, LinkFinder, LinkKind};
use pulldown_cmark::CowStr;

use crate::ast::{Node, NodeKind};
use crate::util::slice_literal;

/// Linked schemes with an authority part (matched ASCII case-insensitively).
const SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

const MAILTO: &str = "mailto:";

/// Split a text literal into text and link nodes.
///
/// Returns `None` when the literal contains no bare URL, so callers can keep
/// the original node untouched.
pub(crate) fn split_autolinks<'a>(literal: &CowStr<'a>) -> Option<Vec<Node<'a>>> {
    let urls = find_urls(literal);
    if urls.is_empty() {
        return None;
    }

    let mut nodes = Vec::with_capacity(urls.len() * 2 + 1);
    let mut copied = 0;
    for url in urls {
        if url.start > copied {
            nodes.push(Node::text(slice_literal(literal, copied..url.start)));
        }
        let dest = slice_literal(literal, url.clone());
        nodes.push(Node::container(
            NodeKind::Link {
                dest: dest.clone(),
                title: CowStr::Borrowed(""),
            },
            vec![Node::text(dest)],
        ));
        copied = url.end;
    }
    if copied < literal.len() {
        nodes.push(Node::text(slice_literal(literal, copied..literal.len())));
    }
    Some(nodes)
}

/// Byte ranges of every bare URL in `text`, in order.
fn find_urls(text: &str) -> Vec<Range<usize>> {
    if !text.contains(':') {
        return Vec::new();
    }

    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url, LinkKind::Email]);
    finder.url_must_have_scheme(true);
    finder
        .links(text)
        .filter_map(|link| accept(text, &link))
        .collect()
}

/// Range to link for a candidate, or `None` to leave it as text.
fn accept(text: &str, link: &Link<'_>) -> Option<Range<usize>> {
    if matches!(link.kind(), LinkKind::Email) {
        // Addresses are linked only when written with their `mailto:` prefix.
        if has_prefix(link.as_str(), MAILTO) {
            return Some(link.start()..link.end());
        }
        let start = link.start().checked_sub(MAILTO.len())?;
        let prefix = text.get(start..link.start())?;
        let boundary = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        return (prefix.eq_ignore_ascii_case(MAILTO) && boundary).then_some(start..link.end());
    }

    // `[` and `]` delimit wiki links, never part of a bare URL.
    let url = link.as_str();
    let end = link.start() + url.find(['[', ']']).unwrap_or(url.len());
    let url = &text[link.start()..end];

    if has_prefix(url, MAILTO) {
        return is_address(&url[MAILTO.len()..]).then_some(link.start()..end);
    }
    let scheme = SCHEMES.iter().find(|scheme| has_prefix(url, scheme))?;
    has_host(&url[scheme.len()..]).then_some(link.start()..end)
}

fn has_prefix(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len() && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Whether the part after `scheme://` names a host.
fn has_host(rest: &str) -> bool {
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    host.bytes().any(|b| b.is_ascii_alphanumeric())
}

fn is_address(address: &str) -> bool {
    address
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.bytes().any(|b| b.is_ascii_alphanumeric()))
}
