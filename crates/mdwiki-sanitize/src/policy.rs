//! The user-generated-content allowlist.
//!
//! Elements and attributes follow the common UGC baseline: structural and
//! inline text markup, lists, tables, images and links. Every allowed
//! attribute value is matched against a pattern; values that do not match
//! are dropped while the element itself is kept.

use std::borrow::Cow;
use std::sync::LazyLock;

use ammonia::{Builder, UrlRelative};
use regex::Regex;

use crate::patterns::{
    CELL_ALIGN, CELL_VERTICAL_ALIGN, COORDS, DIRECTION, IMAGE_ALIGN, INTEGER, ISO8601,
    LANGUAGE_CLASS, LANGUAGE_CODE, LIST_TYPE, NAME, NUMBER, NUMBER_OR_PERCENT, OPEN, PARAGRAPH,
    SCOPE, SHAPE, SPACE_SEPARATED_TOKENS, TEXT_COLOR_CLASS, USEMAP, VALID_ID,
};

/// URL schemes allowed in `href`, `src` and `cite`. Relative URLs are always allowed.
pub(crate) const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Elements removed together with their content.
const REMOVED_WITH_CONTENT: &[&str] = &["script", "style"];

/// Elements allowed with the global attributes only.
const PLAIN_ELEMENTS: &[&str] = &[
    // Sections
    "article", "aside", "figure", "section", "summary", "hgroup",
    "h1", "h2", "h3", "h4", "h5", "h6",
    // Blocks
    "br", "div", "hr", "p", "span", "wbr", "pre",
    // Inline text
    "abbr", "acronym", "cite", "code", "dfn", "em", "figcaption", "mark", "s", "samp",
    "strong", "sub", "sup", "var", "b", "i", "small", "strike", "tt", "u",
    // Ruby annotations
    "rp", "rt", "ruby",
    // Definition lists
    "dl", "dt", "dd",
    // Tables
    "caption",
];

/// Constraint on an attribute value.
enum ValueRule {
    /// Checked by the sanitizer's own URL handling (`href`, `src`).
    Any,
    /// Whole value must match.
    Matches(&'static LazyLock<Regex>),
    /// Relative URL, or absolute with an allowed scheme.
    Url,
}

impl ValueRule {
    fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Matches(pattern) => pattern.is_match(value),
            Self::Url => is_allowed_url(value),
        }
    }
}

struct AttributeRule {
    /// Elements the attributes are allowed on; empty means every element.
    elements: &'static [&'static str],
    names: &'static [&'static str],
    value: ValueRule,
}

const fn global(names: &'static [&'static str], value: ValueRule) -> AttributeRule {
    AttributeRule {
        elements: &[],
        names,
        value,
    }
}

const fn on(
    elements: &'static [&'static str],
    names: &'static [&'static str],
    value: ValueRule,
) -> AttributeRule {
    AttributeRule {
        elements,
        names,
        value,
    }
}

const TABLE_SECTIONS: &[&str] = &["thead", "tbody", "tfoot", "tr", "td", "th", "col", "colgroup"];
const TABLE_CELLS: &[&str] = &["td", "th"];
const TABLE_COLUMNS: &[&str] = &["col", "colgroup"];

static ATTRIBUTE_RULES: &[AttributeRule] = &[
    global(&["dir"], ValueRule::Matches(&DIRECTION)),
    global(&["id"], ValueRule::Matches(&VALID_ID)),
    global(&["lang"], ValueRule::Matches(&LANGUAGE_CODE)),
    global(&["title"], ValueRule::Matches(&PARAGRAPH)),
    // Wiki markup
    on(&["code"], &["class"], ValueRule::Matches(&LANGUAGE_CLASS)),
    on(&["span"], &["class"], ValueRule::Matches(&TEXT_COLOR_CLASS)),
    // Links and quotes
    on(&["a"], &["href"], ValueRule::Any),
    on(&["blockquote", "q", "del", "ins"], &["cite"], ValueRule::Url),
    on(&["del", "ins", "time"], &["datetime"], ValueRule::Matches(&ISO8601)),
    on(&["details"], &["open"], ValueRule::Matches(&OPEN)),
    on(&["bdi", "bdo"], &["dir"], ValueRule::Matches(&DIRECTION)),
    // Lists
    on(&["ol", "ul"], &["type"], ValueRule::Matches(&LIST_TYPE)),
    on(&["li"], &["value"], ValueRule::Matches(&INTEGER)),
    // Tables
    on(&["table"], &["summary"], ValueRule::Matches(&PARAGRAPH)),
    on(TABLE_SECTIONS, &["align"], ValueRule::Matches(&CELL_ALIGN)),
    on(TABLE_SECTIONS, &["valign"], ValueRule::Matches(&CELL_VERTICAL_ALIGN)),
    on(TABLE_COLUMNS, &["width"], ValueRule::Matches(&NUMBER_OR_PERCENT)),
    on(TABLE_COLUMNS, &["span"], ValueRule::Matches(&INTEGER)),
    on(TABLE_CELLS, &["abbr"], ValueRule::Matches(&PARAGRAPH)),
    on(TABLE_CELLS, &["colspan", "rowspan"], ValueRule::Matches(&INTEGER)),
    on(TABLE_CELLS, &["headers"], ValueRule::Matches(&SPACE_SEPARATED_TOKENS)),
    on(TABLE_CELLS, &["scope"], ValueRule::Matches(&SCOPE)),
    // Images and image maps
    on(&["img"], &["src"], ValueRule::Any),
    on(&["img"], &["align"], ValueRule::Matches(&IMAGE_ALIGN)),
    on(&["img", "area"], &["alt"], ValueRule::Matches(&PARAGRAPH)),
    on(&["img"], &["height", "width"], ValueRule::Matches(&NUMBER_OR_PERCENT)),
    on(&["img"], &["usemap"], ValueRule::Matches(&USEMAP)),
    on(&["map"], &["name"], ValueRule::Matches(&NAME)),
    on(&["area"], &["href"], ValueRule::Any),
    on(&["area"], &["coords"], ValueRule::Matches(&COORDS)),
    on(&["area"], &["rel"], ValueRule::Matches(&SPACE_SEPARATED_TOKENS)),
    on(&["area"], &["shape"], ValueRule::Matches(&SHAPE)),
    // Gauges
    on(
        &["meter"],
        &["value", "min", "max", "low", "high", "optimum"],
        ValueRule::Matches(&NUMBER),
    ),
    on(&["progress"], &["value", "max"], ValueRule::Matches(&NUMBER)),
];

/// Build the sanitizer configuration.
pub(crate) fn builder() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .add_tags(PLAIN_ELEMENTS)
        .add_clean_content_tags(REMOVED_WITH_CONTENT)
        .add_url_schemes(URL_SCHEMES)
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None)
        .strip_comments(true)
        .attribute_filter(filter_attribute);

    for rule in ATTRIBUTE_RULES {
        if rule.elements.is_empty() {
            builder.add_generic_attributes(rule.names);
            continue;
        }
        for &element in rule.elements {
            builder
                .add_tags([element])
                .add_tag_attributes(element, rule.names);
        }
    }
    builder
}

/// Drop attribute values that do not match their rule.
fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    let Some(rule) = find_rule(element, attribute) else {
        return Some(Cow::Borrowed(value));
    };
    if rule.value.accepts(value) {
        Some(Cow::Borrowed(value))
    } else {
        tracing::trace!(element, attribute, value, "Dropped attribute value");
        None
    }
}

/// Element-specific rules win over global ones.
fn find_rule(element: &str, attribute: &str) -> Option<&'static AttributeRule> {
    let names_attribute = |rule: &&AttributeRule| rule.names.contains(&attribute);
    ATTRIBUTE_RULES
        .iter()
        .filter(names_attribute)
        .find(|rule| rule.elements.contains(&element))
        .or_else(|| {
            ATTRIBUTE_RULES
                .iter()
                .filter(names_attribute)
                .find(|rule| rule.elements.is_empty())
        })
}

fn is_allowed_url(value: &str) -> bool {
    let value = value.trim();
    match value.find([':', '/', '?', '#']) {
        Some(end) if value[end..].starts_with(':') => URL_SCHEMES
            .iter()
            .any(|scheme| value[..end].eq_ignore_ascii_case(scheme)),
        _ => true,
    }
}
