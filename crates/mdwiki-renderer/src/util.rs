//! Shared utility functions for markdown rendering.

use std::ops::Range;

use pulldown_cmark::{CowStr, HeadingLevel};

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(&mut result, s);
    result
}

/// Append `s` to `out` with HTML special characters escaped.
pub(crate) fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// Sub-slice of a literal, staying borrowed from the source when possible.
pub(crate) fn slice_literal<'a>(literal: &CowStr<'a>, range: Range<usize>) -> CowStr<'a> {
    match literal {
        CowStr::Borrowed(source) => {
            let source: &'a str = *source;
            CowStr::Borrowed(&source[range])
        }
        other => {
            let text: &str = other;
            CowStr::from(text[range].to_owned())
        }
    }
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
