use core::fmt;

use serde::Serialize;
use strum_macros::Display;

use super::error::TokenizeError;
use super::token::{Token, TokenKind};

/// The keyword matched after `<`, including the bang.
pub(super) const DOCTYPE: &[u8] = b"!doctype";

/// Length of the `!-` section that precedes the second dash of `<!--`.
const COMMENT_OPENER_LEN: usize = 2;

/// The scanner state machine. Each state owns one `handle_*_state` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ScannerState {
    /// Scanning plain text.
    Literal,
    /// Just consumed `<`.
    BeforeOpenTag,
    /// Accumulating an open tag name.
    OpeningTag,
    /// Between attributes of an open tag.
    AfterOpenTag,
    /// Inside an unquoted attribute value (or attribute name).
    InValueNq,
    /// Inside a single-quoted attribute value.
    InValueSq,
    /// Inside a double-quoted attribute value.
    InValueDq,
    /// After a `/` inside an open tag.
    ClosingOpenTag,
    /// After `<!`.
    OpeningSpecial,
    /// Matching the `!doctype` keyword.
    OpeningDoctype,
    /// After `<!-`.
    OpeningNormalComment,
    /// Inside `<!-- ...`.
    InNormalComment,
    /// Inside a bogus comment (`<!...>` or `<?...>`).
    InShortComment,
    /// Matching the `-->` that ends a normal comment.
    ClosingNormalComment,
    /// After `</`.
    ClosingTag,
}

/// Elements whose content is scanned as opaque text up to their own end tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RawTextElement {
    Script,
    Style,
}

impl RawTextElement {
    /// Map a lowercased open tag name to the raw-text element it starts.
    pub(super) fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "script" => Some(Self::Script),
            "style" => Some(Self::Style),
            _ => None,
        }
    }

    /// The closing tag name that ends this element, lowercase.
    pub(super) const fn tag_name(self) -> &'static [u8] {
        match self {
            Self::Script => b"script",
            Self::Style => b"style",
        }
    }
}

/// Scanner behaviour switches. The default is what consumers of the token
/// stream expect; each flag opts into a different treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Report each literal emission as its own token instead of merging
    /// adjacent literal runs.
    pub split_literals: bool,
    /// At end of input, flush a pending attribute value or `/` section as a
    /// literal token instead of dropping it.
    pub flush_unterminated: bool,
    /// Forward every recorded issue to the `wren-common` warning sink.
    pub report_warnings: bool,
}

/// A construct the scanner degraded instead of recognizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum IssueKind {
    /// `<` followed by a character that starts no tag.
    AbandonedTagOpen,
    /// `<!` or `<?` scanned as a short comment up to the next `>`.
    BogusComment,
    /// `<!doctype` cut short by `>`.
    BogusDoctype,
    /// `</` inside `script`/`style` that does not close the element.
    RawTextCloseMismatch,
    /// End of input inside a tag.
    UnterminatedTag,
    /// End of input inside a comment.
    UnterminatedComment,
}

/// A recoverable issue encountered while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    /// What was degraded.
    pub kind: IssueKind,
    /// Byte offset where the scanner noticed it.
    pub offset: usize,
}

impl fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

/// Single-pass markup scanner.
///
/// One instance scans one input. All working state lives here and is
/// reinitialized by [`Tokenizer::run`].
pub struct Tokenizer<'a> {
    pub(super) input: &'a str,
    pub(super) options: ScanOptions,
    pub(super) state: ScannerState,
    /// Scan cursor (byte offset).
    pub(super) index: usize,
    /// Start of the section accumulated since the last emission.
    pub(super) section_start: usize,
    /// Offset of the `<` that began the markup currently being scanned.
    pub(super) markup_start: usize,
    pub(super) current_byte: u8,
    /// When true, the driver hands the current byte to the new state instead
    /// of advancing.
    pub(super) reconsume: bool,
    /// Set while inside `script` or `style`.
    pub(super) raw_text: Option<RawTextElement>,
    pub(super) tokens: Vec<Token>,
    pub(super) issues: Vec<ScanIssue>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input with default options.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            options: ScanOptions::default(),
            state: ScannerState::Literal,
            index: 0,
            section_start: 0,
            markup_start: 0,
            current_byte: 0,
            reconsume: false,
            raw_text: None,
            tokens: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub const fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Report every literal emission separately.
    #[must_use]
    pub const fn with_split_literals(mut self) -> Self {
        self.options.split_literals = true;
        self
    }

    /// Flush unterminated attribute values as literal text at end of input.
    #[must_use]
    pub const fn with_unterminated_flush(mut self) -> Self {
        self.options.flush_unterminated = true;
        self
    }

    /// Print recorded issues through the warning sink.
    #[must_use]
    pub const fn with_warnings(mut self) -> Self {
        self.options.report_warnings = true;
        self
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> ScanOptions {
        self.options
    }

    /// Tokens produced so far.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Issues recorded so far, in the order they were noticed.
    #[must_use]
    pub fn issues(&self) -> &[ScanIssue] {
        &self.issues
    }

    /// Consume the tokenizer and return the token stream.
    /// Call this after [`Tokenizer::run`].
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Consume the tokenizer and return both the tokens and the issues.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Token>, Vec<ScanIssue>) {
        (self.tokens, self.issues)
    }

    /// Scan the whole input, then flush whatever section is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::UnexpectedState`] if the state machine breaks
    /// one of its own invariants. No tokens are kept in that case.
    pub fn run(&mut self) -> Result<(), TokenizeError> {
        self.reset();
        let result = self.scan().and_then(|()| self.finish());
        if result.is_err() {
            self.tokens.clear();
        }
        result
    }

    fn reset(&mut self) {
        self.state = ScannerState::Literal;
        self.index = 0;
        self.section_start = 0;
        self.markup_start = 0;
        self.current_byte = 0;
        self.reconsume = false;
        self.raw_text = None;
        self.tokens.clear();
        self.issues.clear();
    }

    // Byte-wise scan: every structural character is ASCII, and UTF-8
    // continuation bytes never compare equal to one, so section boundaries
    // always land on char boundaries.
    fn scan(&mut self) -> Result<(), TokenizeError> {
        let input = self.input;
        let bytes = input.as_bytes();
        while self.index < bytes.len() {
            self.current_byte = bytes[self.index];
            match self.state {
                ScannerState::Literal => self.handle_literal_state(),
                ScannerState::BeforeOpenTag => self.handle_before_open_tag_state(),
                ScannerState::OpeningTag => self.handle_opening_tag_state(),
                ScannerState::AfterOpenTag => self.handle_after_open_tag_state(),
                ScannerState::InValueNq => self.handle_in_value_nq_state(),
                ScannerState::InValueSq => {
                    self.handle_in_quoted_value_state(b'\'', TokenKind::AttrValueSq);
                }
                ScannerState::InValueDq => {
                    self.handle_in_quoted_value_state(b'"', TokenKind::AttrValueDq);
                }
                ScannerState::ClosingOpenTag => self.handle_closing_open_tag_state(),
                ScannerState::OpeningSpecial => self.handle_opening_special_state(),
                ScannerState::OpeningDoctype => self.handle_opening_doctype_state()?,
                ScannerState::OpeningNormalComment => self.handle_opening_normal_comment_state(),
                ScannerState::InNormalComment => self.handle_in_normal_comment_state(),
                ScannerState::InShortComment => self.handle_in_short_comment_state(),
                ScannerState::ClosingNormalComment => self.handle_closing_normal_comment_state(),
                ScannerState::ClosingTag => self.handle_closing_tag_state(),
            }
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.index += 1;
            }
        }
        Ok(())
    }

    /// End-of-input pass: flush the pending section as the state dictates.
    fn finish(&mut self) -> Result<(), TokenizeError> {
        match self.state {
            ScannerState::Literal | ScannerState::BeforeOpenTag => {
                self.emit(TokenKind::Literal);
            }
            ScannerState::InNormalComment
            | ScannerState::ClosingNormalComment
            | ScannerState::InShortComment => {
                self.record_issue(IssueKind::UnterminatedComment, self.index);
                self.emit(TokenKind::Literal);
            }
            ScannerState::InValueNq
            | ScannerState::InValueSq
            | ScannerState::InValueDq
            | ScannerState::ClosingOpenTag => {
                self.record_issue(IssueKind::UnterminatedTag, self.index);
                if self.options.flush_unterminated {
                    self.emit(TokenKind::Literal);
                }
            }
            ScannerState::AfterOpenTag => {
                self.record_issue(IssueKind::UnterminatedTag, self.index);
            }
            ScannerState::OpeningTag => {
                self.record_issue(IssueKind::UnterminatedTag, self.index);
                self.emit(TokenKind::OpenTag);
            }
            ScannerState::OpeningSpecial => {
                self.record_issue(IssueKind::BogusComment, self.index);
                self.emit_then(TokenKind::OpenTag, ScannerState::InShortComment);
            }
            ScannerState::OpeningDoctype => {
                let matched = self.section_len();
                if matched > DOCTYPE.len() {
                    return Err(self.unexpected(None));
                }
                if matched == DOCTYPE.len() {
                    self.record_issue(IssueKind::UnterminatedTag, self.index);
                    self.emit(TokenKind::OpenTag);
                } else {
                    self.record_issue(IssueKind::BogusDoctype, self.index);
                    self.emit_span(TokenKind::OpenTag, self.state, self.section_start + 1);
                    self.emit(TokenKind::Literal);
                }
            }
            ScannerState::OpeningNormalComment => {
                if self.section_len() != COMMENT_OPENER_LEN {
                    return Err(self.unexpected(None));
                }
                self.record_issue(IssueKind::UnterminatedComment, self.index);
                self.emit(TokenKind::OpenTag);
            }
            ScannerState::ClosingTag => {
                self.record_issue(IssueKind::UnterminatedTag, self.index);
                self.emit(TokenKind::CloseTag);
            }
        }
        Ok(())
    }

    fn handle_literal_state(&mut self) {
        if self.current_byte == b'<' {
            self.markup_start = self.index;
            self.emit_then(TokenKind::Literal, ScannerState::BeforeOpenTag);
        }
    }

    /// The byte after `<` decides what kind of markup this is.
    fn handle_before_open_tag_state(&mut self) {
        if self.raw_text.is_some() {
            // Inside script/style only `</` is markup; a second `<` is text.
            if self.current_byte == b'/' {
                self.begin_section(ScannerState::ClosingTag, self.index + 1);
            } else {
                self.switch_to(ScannerState::Literal);
            }
            return;
        }
        match self.current_byte {
            // <d
            c if c.is_ascii_alphabetic() => {
                self.begin_section(ScannerState::OpeningTag, self.index);
            }
            // </
            b'/' => self.begin_section(ScannerState::ClosingTag, self.index + 1),
            // <<, the second `<` may still open a tag
            b'<' => {
                self.record_issue(IssueKind::AbandonedTagOpen, self.markup_start);
                self.reconsume_in(ScannerState::Literal);
            }
            // <!
            b'!' => self.begin_section(ScannerState::OpeningSpecial, self.index),
            // <?
            b'?' => {
                self.record_issue(IssueKind::BogusComment, self.markup_start);
                self.section_start = self.index;
                self.emit_then(TokenKind::OpenTag, ScannerState::InShortComment);
            }
            // <>, "< " and friends stay text
            _ => {
                self.record_issue(IssueKind::AbandonedTagOpen, self.markup_start);
                self.switch_to(ScannerState::Literal);
            }
        }
    }

    fn handle_opening_tag_state(&mut self) {
        match self.current_byte {
            c if Self::is_whitespace_byte(c) => {
                self.emit_then(TokenKind::OpenTag, ScannerState::AfterOpenTag);
            }
            b'>' => {
                self.emit(TokenKind::OpenTag);
                self.emit(TokenKind::OpenTagEnd);
            }
            b'/' => self.emit_then(TokenKind::OpenTag, ScannerState::ClosingOpenTag),
            _ => {}
        }
    }

    /// Between attributes. Every non-whitespace byte closes the pending gap.
    fn handle_after_open_tag_state(&mut self) {
        match self.current_byte {
            b'>' => {
                self.emit(TokenKind::Whitespace);
                self.emit(TokenKind::OpenTagEnd);
            }
            b'/' => self.emit_then(TokenKind::Whitespace, ScannerState::ClosingOpenTag),
            b'=' => {
                self.emit(TokenKind::Whitespace);
                self.emit_span(TokenKind::AttrValueEq, self.state, self.index + 1);
            }
            b'\'' => self.emit_then(TokenKind::Whitespace, ScannerState::InValueSq),
            b'"' => self.emit_then(TokenKind::Whitespace, ScannerState::InValueDq),
            c if !Self::is_whitespace_byte(c) => {
                self.emit_then(TokenKind::Whitespace, ScannerState::InValueNq);
            }
            _ => {}
        }
    }

    fn handle_in_value_nq_state(&mut self) {
        match self.current_byte {
            // <div xxx>
            b'>' => {
                self.emit(TokenKind::AttrValueNq);
                self.emit(TokenKind::OpenTagEnd);
            }
            // <div xxx/
            b'/' => self.emit_then(TokenKind::AttrValueNq, ScannerState::ClosingOpenTag),
            // <div xxx=
            b'=' => {
                self.emit(TokenKind::AttrValueNq);
                self.emit_span(
                    TokenKind::AttrValueEq,
                    ScannerState::AfterOpenTag,
                    self.index + 1,
                );
            }
            c if Self::is_whitespace_byte(c) => {
                self.emit_then(TokenKind::AttrValueNq, ScannerState::AfterOpenTag);
            }
            _ => {}
        }
    }

    /// Quoted values end at the matching quote only; there is no escaping.
    fn handle_in_quoted_value_state(&mut self, quote: u8, kind: TokenKind) {
        if self.current_byte == quote {
            self.emit_span(kind, ScannerState::AfterOpenTag, self.index + 1);
        }
    }

    fn handle_closing_open_tag_state(&mut self) {
        if self.current_byte == b'>' {
            // <div />
            self.emit(TokenKind::OpenTagEnd);
        } else {
            // A stray `/` is reported as an unquoted value.
            self.emit(TokenKind::AttrValueNq);
            self.reconsume_in(ScannerState::AfterOpenTag);
        }
    }

    fn handle_opening_special_state(&mut self) {
        match self.current_byte {
            b'-' => self.switch_to(ScannerState::OpeningNormalComment),
            b'd' | b'D' => self.switch_to(ScannerState::OpeningDoctype),
            _ => {
                self.record_issue(IssueKind::BogusComment, self.markup_start);
                self.emit_then(TokenKind::OpenTag, ScannerState::InShortComment);
            }
        }
    }

    /// The section starts at `!`, so the section length is the number of
    /// keyword bytes matched so far.
    fn handle_opening_doctype_state(&mut self) -> Result<(), TokenizeError> {
        let matched = self.section_len();
        if matched > DOCTYPE.len() {
            return Err(self.unexpected(Some(self.current_byte)));
        }
        let bang_end = self.section_start + 1;
        if matched == DOCTYPE.len() && Self::is_whitespace_byte(self.current_byte) {
            self.emit_then(TokenKind::OpenTag, ScannerState::AfterOpenTag);
        } else if self.current_byte == b'>' {
            // <!DOCT>
            self.record_issue(IssueKind::BogusDoctype, self.markup_start);
            self.emit_span(TokenKind::OpenTag, self.state, bang_end);
            self.emit(TokenKind::Literal);
            self.emit(TokenKind::OpenTagEnd);
        } else if matched == DOCTYPE.len()
            || !self.current_byte.eq_ignore_ascii_case(&DOCTYPE[matched])
        {
            // <!DOCX..., <!doctypex...
            self.record_issue(IssueKind::BogusComment, self.markup_start);
            self.emit_span(TokenKind::OpenTag, ScannerState::InShortComment, bang_end);
        }
        Ok(())
    }

    fn handle_opening_normal_comment_state(&mut self) {
        if self.current_byte == b'-' {
            // <!--
            self.emit_span(
                TokenKind::OpenTag,
                ScannerState::InNormalComment,
                self.index + 1,
            );
        } else {
            self.record_issue(IssueKind::BogusComment, self.markup_start);
            let bang_end = self.section_start + 1;
            self.emit_span(TokenKind::OpenTag, ScannerState::InShortComment, bang_end);
        }
    }

    fn handle_in_normal_comment_state(&mut self) {
        if self.current_byte == b'-' {
            self.emit_then(TokenKind::Literal, ScannerState::ClosingNormalComment);
        }
    }

    fn handle_in_short_comment_state(&mut self) {
        if self.current_byte == b'>' {
            self.emit(TokenKind::Literal);
            self.emit(TokenKind::OpenTagEnd);
        }
    }

    /// The section starts at the first candidate dash of `-->`.
    fn handle_closing_normal_comment_state(&mut self) {
        if self.section_len() == 2 {
            match self.current_byte {
                // <!-- xxx -->
                b'>' => self.emit(TokenKind::OpenTagEnd),
                // <!-- xxx ---, the first dash is comment text
                b'-' => self.emit_span(TokenKind::Literal, self.state, self.section_start + 1),
                // <!-- xxx --x
                _ => self.switch_to(ScannerState::InNormalComment),
            }
        } else if self.current_byte != b'-' {
            // <!-- xxx -x
            self.switch_to(ScannerState::InNormalComment);
        }
    }

    fn handle_closing_tag_state(&mut self) {
        if let Some(element) = self.raw_text {
            self.match_raw_text_close(element);
        } else if self.current_byte == b'>' {
            // </ xxx >
            self.emit(TokenKind::CloseTag);
        }
    }
}

/// Tokenize `input` with default options.
///
/// # Errors
///
/// Returns [`TokenizeError::UnexpectedState`] only if the state machine breaks
/// one of its own invariants; malformed markup is never an error.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    tokenize_with(input, ScanOptions::default())
}

/// Tokenize `input` with the given options.
///
/// # Errors
///
/// See [`tokenize`].
pub fn tokenize_with(input: &str, options: ScanOptions) -> Result<Vec<Token>, TokenizeError> {
    let mut tokenizer = Tokenizer::new(input).with_options(options);
    tokenizer.run()?;
    Ok(tokenizer.into_tokens())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Tokenizer<'_> {
        let mut tokenizer = Tokenizer::new(input);
        tokenizer.run().expect("scan should not fail");
        tokenizer
    }

    #[test]
    fn raw_text_mode_follows_script_open_and_any_close() {
        let tokenizer = run("<script>");
        assert_eq!(tokenizer.raw_text, Some(RawTextElement::Script));
        let tokenizer = run("<STYLE media=x>a");
        assert_eq!(tokenizer.raw_text, Some(RawTextElement::Style));
        let tokenizer = run("<style></style>");
        assert_eq!(tokenizer.raw_text, None);
    }

    #[test]
    fn double_less_than_keeps_raw_text_mode() {
        let tokenizer = run("<script>a<</script>b");
        assert_eq!(tokenizer.raw_text, Some(RawTextElement::Script));
        assert_eq!(tokenizer.state, ScannerState::Literal);
    }

    #[test]
    fn rerun_reinitializes_state() {
        let mut tokenizer = Tokenizer::new("<script>x");
        tokenizer.run().unwrap();
        let first = tokenizer.tokens().to_vec();
        tokenizer.run().unwrap();
        assert_eq!(tokenizer.tokens(), first.as_slice());
    }

    #[test]
    fn doctype_keyword_overrun_is_an_invariant_failure() {
        let mut tokenizer = Tokenizer::new("<!doctype html>");
        tokenizer.reset();
        tokenizer.state = ScannerState::OpeningDoctype;
        tokenizer.section_start = 0;
        tokenizer.index = DOCTYPE.len() + 1;
        tokenizer.current_byte = b'x';
        let err = tokenizer.handle_opening_doctype_state().unwrap_err();
        assert_eq!(
            err,
            TokenizeError::UnexpectedState {
                state: ScannerState::OpeningDoctype,
                offset: DOCTYPE.len() + 1,
                byte: Some(b'x'),
            }
        );
    }

    #[test]
    fn finish_rejects_stale_comment_opener() {
        let mut tokenizer = Tokenizer::new("<!-");
        tokenizer.reset();
        tokenizer.state = ScannerState::OpeningNormalComment;
        tokenizer.section_start = 0;
        tokenizer.index = 3;
        assert!(tokenizer.finish().is_err());
    }

    #[test]
    fn issue_display() {
        let issue = ScanIssue {
            kind: IssueKind::BogusComment,
            offset: 4,
        };
        assert_eq!(issue.to_string(), "BogusComment at offset 4");
    }
}
