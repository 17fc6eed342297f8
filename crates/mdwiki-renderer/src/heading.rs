//! Heading anchor ids.

use std::collections::HashMap;

/// Id used when a heading's text yields an empty slug.
const FALLBACK_ID: &str = "heading";

/// Assigns unique anchor ids to the headings of one document.
#[derive(Debug, Default)]
pub(crate) struct HeadingIds {
    /// How many times each base id has been handed out.
    counts: HashMap<String, usize>,
}

impl HeadingIds {
    /// Register an explicit `{#id}` so generated ids never collide with it.
    pub fn explicit(&mut self, id: &str) -> String {
        *self.counts.entry(id.to_owned()).or_default() += 1;
        id.to_owned()
    }

    /// Generate a unique id from heading text.
    ///
    /// Repeated headings get `-1`, `-2`, ... suffixes.
    pub fn generate(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            FALLBACK_ID.clone_into(&mut base_id);
        }
        let count = self.counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }
}

/// Convert heading text to a URL-safe slug.
///
/// ASCII letters and digits are lowercased and kept; runs of whitespace,
/// dashes and underscores collapse to a single dash; everything else is
/// dropped.
pub(crate) fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
