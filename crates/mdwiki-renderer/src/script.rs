//! Intraword superscript and subscript.
//!
//! The markdown parser recognizes `^sup^` and `~sub~` only at word
//! boundaries. This pass picks up the spans left in text leaves, as in `x^2^`
//! or `H~2~O`. The content between the delimiters must be non-empty and free
//! of whitespace; doubled delimiters are never a script.

use std::ops::Range;

use pulldown_cmark::CowStr;

use crate::ast::{Node, NodeKind};
use crate::util::slice_literal;

/// Split a text literal into text and script nodes.
///
/// Returns `None` when the literal contains no script span.
pub(crate) fn split_scripts<'a>(literal: &CowStr<'a>) -> Option<Vec<Node<'a>>> {
    let spans = find_scripts(literal);
    if spans.is_empty() {
        return None;
    }

    let mut nodes = Vec::with_capacity(spans.len() * 2 + 1);
    let mut copied = 0;
    for (delimiter, span) in spans {
        if span.start > copied {
            nodes.push(Node::text(slice_literal(literal, copied..span.start)));
        }
        let kind = if delimiter == b'^' {
            NodeKind::Superscript
        } else {
            NodeKind::Subscript
        };
        let content = slice_literal(literal, span.start + 1..span.end - 1);
        nodes.push(Node::container(kind, vec![Node::text(content)]));
        copied = span.end;
    }
    if copied < literal.len() {
        nodes.push(Node::text(slice_literal(literal, copied..literal.len())));
    }
    Some(nodes)
}

/// Delimiter and byte range (delimiters included) of every script span.
fn find_scripts(text: &str) -> Vec<(u8, Range<usize>)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let delimiter = bytes[pos];
        if delimiter != b'^' && delimiter != b'~' {
            pos += 1;
            continue;
        }
        let run = bytes[pos..].iter().take_while(|&&b| b == delimiter).count();
        if run > 1 {
            pos += run;
            continue;
        }

        let body = pos + 1;
        let close = bytes[body..]
            .iter()
            .position(|&b| b == delimiter || b.is_ascii_whitespace())
            .map(|offset| body + offset);
        match close {
            Some(close)
                if close > body
                    && bytes[close] == delimiter
                    && bytes.get(close + 1) != Some(&delimiter) =>
            {
                spans.push((delimiter, pos..close + 1));
                pos = close + 1;
            }
            _ => pos = body,
        }
    }

    spans
}
