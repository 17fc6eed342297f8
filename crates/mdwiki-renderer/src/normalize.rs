//! Input normalization applied before parsing.

use std::borrow::Cow;

const CARRIAGE_RETURN: u8 = b'\r';

/// Remove every carriage-return byte from raw page source.
///
/// All other bytes are kept in their original order. Input without carriage
/// returns is returned borrowed.
#[must_use]
pub fn normalize(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.contains(&CARRIAGE_RETURN) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(
        input
            .iter()
            .copied()
            .filter(|&byte| byte != CARRIAGE_RETURN)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(&*normalize(b"line one\r\nline two\r\n"), b"line one\nline two\n");
    }

    #[test]
    fn test_normalize_lone_carriage_return() {
        assert_eq!(&*normalize(b"a\rb\r\rc"), b"abc");
    }

    #[test]
    fn test_normalize_without_carriage_return_borrows() {
        let input = b"no changes here\n";
        assert!(matches!(normalize(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_keeps_other_bytes() {
        let input = [0u8, 10, 12, 13, 14, 255];
        assert_eq!(&*normalize(&input), &[0u8, 10, 12, 14, 255]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(b"").is_empty());
    }
}
