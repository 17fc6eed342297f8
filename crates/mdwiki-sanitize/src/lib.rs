//! HTML sanitization for rendered wiki pages.
//!
//! Rendered pages mix generated markup with raw HTML typed by page authors.
//! [`sanitize`] reduces that to a fixed allowlist of elements and attributes
//! for user-generated content, with two additions for wiki markup:
//!
//! - `class` on `<code>` when it names a highlighting language (`language-rust`)
//! - `class` on `<span>` when it is a text color helper (`has-text-danger`)
//!
//! `<script>` and `<style>` elements are removed with their content, comments
//! are stripped, and only `http`, `https`, `mailto` and relative URLs survive.
//! Sanitizing already sanitized HTML returns it unchanged.

mod patterns;
mod policy;

use std::sync::LazyLock;

use ammonia::Builder;

static POLICY: LazyLock<Builder<'static>> = LazyLock::new(policy::builder);

/// Sanitize HTML bytes.
///
/// Invalid UTF-8 is replaced with U+FFFD.
#[must_use]
pub fn sanitize(html: &[u8]) -> Vec<u8> {
    sanitize_str(&String::from_utf8_lossy(html)).into_bytes()
}

/// Sanitize an HTML fragment.
#[must_use]
pub fn sanitize_str(html: &str) -> String {
    let clean = POLICY.clean(html).to_string();
    tracing::trace!(input_len = html.len(), output_len = clean.len(), "Sanitized HTML");
    clean
}
