//! Attribute value patterns.

use std::sync::LazyLock;

use regex::Regex;

/// `class` on `<code>`: syntax highlighting language.
pub(crate) static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^language-[A-Za-z0-9]+$").unwrap());

/// `class` on `<span>`: text color helpers such as `has-text-danger`.
pub(crate) static TEXT_COLOR_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^has-text-[A-Za-z0-9-]+$").unwrap());

pub(crate) static DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(rtl|ltr|auto)$").unwrap());

pub(crate) static VALID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9:\-_.]+$").unwrap());

pub(crate) static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2,20}$").unwrap());

/// Free text: letters, digits, whitespace and light punctuation.
pub(crate) static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}\s\-_',\[\]!./\\()]*$").unwrap());

pub(crate) static CELL_ALIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(center|justify|left|right|char)$").unwrap());

pub(crate) static CELL_VERTICAL_ALIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(baseline|bottom|middle|top)$").unwrap());

pub(crate) static IMAGE_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(left|right|top|texttop|middle|absmiddle|baseline|bottom|absbottom)$")
        .unwrap()
});

pub(crate) static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

pub(crate) static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").unwrap());

pub(crate) static NUMBER_OR_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+%?$").unwrap());

pub(crate) static ISO8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9]{4}(-[0-9]{2}(-[0-9]{2}([ T][0-9]{2}(:[0-9]{2}){1,2}(\.[0-9]{1,6})?Z?([+-][0-9]{2}:[0-9]{2})?)?)?)?$",
    )
    .unwrap()
});

pub(crate) static LIST_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(circle|disc|square|a|A|i|I|1)$").unwrap());

pub(crate) static SPACE_SEPARATED_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\p{L}\p{N}_-]+$").unwrap());

pub(crate) static OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(|open)$").unwrap());

pub(crate) static COORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+,)+[0-9]+$").unwrap());

pub(crate) static SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(default|circle|rect|poly)$").unwrap());

pub(crate) static USEMAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#[\p{L}\p{N}_-]+$").unwrap());

pub(crate) static SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(row|col)(group)?$").unwrap());

pub(crate) static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}_-]+$").unwrap());
