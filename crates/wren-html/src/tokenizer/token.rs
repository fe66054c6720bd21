use core::fmt;
use core::ops::Range;

use serde::Serialize;
use strum_macros::Display;

/// The lexical category of a [`Token`].
///
/// The discriminants are part of the contract with downstream consumers and
/// must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[repr(u8)]
pub enum TokenKind {
    /// A run of plain text, comment body or raw-text content.
    Literal = 0,
    /// A tag name with the leading `<` trimmed, lowercased.
    OpenTag = 1,
    /// The end of an open tag with the trailing `>` trimmed: `""` or `"/"`.
    OpenTagEnd = 2,
    /// A closing tag name with `</` and `>` trimmed, lowercased.
    CloseTag = 3,
    /// The gap between attributes inside an open tag.
    Whitespace = 4,
    /// The `=` separating an attribute name from its value.
    AttrValueEq = 5,
    /// An unquoted attribute value (or attribute name).
    AttrValueNq = 6,
    /// A single-quoted attribute value, quotes included.
    AttrValueSq = 7,
    /// A double-quoted attribute value, quotes included.
    AttrValueDq = 8,
}

impl TokenKind {
    /// The numeric code of this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for kinds whose value is a lowercased tag name.
    #[must_use]
    pub const fn is_tag_name(self) -> bool {
        matches!(self, Self::OpenTag | Self::CloseTag)
    }

    /// Returns true for the three attribute value kinds.
    #[must_use]
    pub const fn is_attribute_value(self) -> bool {
        matches!(self, Self::AttrValueNq | Self::AttrValueSq | Self::AttrValueDq)
    }

    /// Kinds that are dropped instead of emitted when their span is empty.
    pub(super) const fn skipped_when_empty(self) -> bool {
        matches!(self, Self::Literal | Self::Whitespace)
    }

    /// Kinds that consume their trailing delimiter and return the scanner to
    /// literal text.
    pub(super) const fn closes_markup(self) -> bool {
        matches!(self, Self::OpenTagEnd | Self::CloseTag)
    }
}

/// A unit of lexical output.
///
/// `start` and `end` are byte offsets into the scanned input (`end` exclusive).
/// `value` is `input[start..end]`, lowercased for [`TokenKind::OpenTag`] and
/// [`TokenKind::CloseTag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Byte offset of the first byte of the token's source span.
    pub start: usize,
    /// Byte offset one past the last byte of the token's source span.
    pub end: usize,
    /// The token's text.
    pub value: String,
    /// The token's category.
    pub kind: TokenKind,
}

impl Token {
    /// Create a token from its kind, span and value.
    #[must_use]
    pub const fn new(kind: TokenKind, start: usize, end: usize, value: String) -> Self {
        Self {
            start,
            end,
            value,
            kind,
        }
    }

    /// The source span of this token.
    #[must_use]
    pub const fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length of the source span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the source span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Extend this token with the adjacent section `[self.end, end)`.
    pub(super) fn extend_to(&mut self, end: usize, text: &str) {
        debug_assert!(end >= self.end);
        self.end = end;
        self.value.push_str(text);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}..{}) {:?}", self.kind, self.start, self.end, self.value)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(TokenKind::Literal.code(), 0);
        assert_eq!(TokenKind::CloseTag.code(), 3);
        assert_eq!(TokenKind::AttrValueDq.code(), 8);
    }

    #[test]
    fn kind_codes_are_dense_and_in_declaration_order() {
        let codes: Vec<u8> = TokenKind::iter().map(TokenKind::code).collect();
        assert_eq!(codes, (0..=8).collect::<Vec<u8>>());
    }

    #[test]
    fn tag_name_and_attribute_value_kinds_are_disjoint() {
        for kind in TokenKind::iter() {
            assert!(!(kind.is_tag_name() && kind.is_attribute_value()), "{kind}");
        }
        assert_eq!(TokenKind::iter().filter(|k| k.is_attribute_value()).count(), 3);
    }

    #[test]
    fn only_literal_and_whitespace_are_skipped_when_empty() {
        assert!(TokenKind::Literal.skipped_when_empty());
        assert!(TokenKind::Whitespace.skipped_when_empty());
        assert!(!TokenKind::OpenTagEnd.skipped_when_empty());
        assert!(!TokenKind::AttrValueNq.skipped_when_empty());
    }

    #[test]
    fn display_shows_kind_span_and_value() {
        let token = Token::new(TokenKind::OpenTag, 1, 4, "div".to_string());
        assert_eq!(token.to_string(), "OpenTag(1..4) \"div\"");
        assert_eq!(token.span(), 1..4);
        assert_eq!(token.len(), 3);
    }

    #[test]
    fn extend_appends_adjacent_text() {
        let mut token = Token::new(TokenKind::Literal, 0, 2, "ab".to_string());
        token.extend_to(4, "cd");
        assert_eq!(token.value, "abcd");
        assert_eq!(token.span(), 0..4);
    }
}
