//! Helper functions for the markup tokenizer.
//!
//! This module contains the pieces every state handler shares:
//! - State transitions ("switch to", "reconsume in")
//! - Section bookkeeping and character classes
//! - Token emission, the single place where tokens are created
//! - Raw-text close tag matching for `script` and `style`
//! - Issue recording

use wren_common::warning::warn_once;

use super::error::TokenizeError;
use super::scanner::{IssueKind, RawTextElement, ScanIssue, ScannerState, Tokenizer};
use super::token::{Token, TokenKind};

// =============================================================================
// State Transition Helpers
// =============================================================================

impl Tokenizer<'_> {
    /// Transitions to a new state. The next byte is handled by that state on
    /// the next iteration of the driver loop.
    pub(super) const fn switch_to(&mut self, new_state: ScannerState) {
        self.state = new_state;
    }

    /// Transitions to a new state without consuming the current byte.
    /// The same byte will be processed again in the new state.
    pub(super) const fn reconsume_in(&mut self, new_state: ScannerState) {
        self.reconsume = true;
        self.state = new_state;
    }

    /// Start a fresh section at `start` and switch to `new_state`.
    pub(super) const fn begin_section(&mut self, new_state: ScannerState, start: usize) {
        self.section_start = start;
        self.state = new_state;
    }

    /// Number of bytes between the section start and the cursor.
    pub(super) const fn section_len(&self) -> usize {
        self.index - self.section_start
    }

    /// Space, tab, LF, CR and FF.
    pub(super) const fn is_whitespace_byte(byte: u8) -> bool {
        matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
    }
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl Tokenizer<'_> {
    /// Emit the section up to the cursor, staying in the current state.
    pub(super) fn emit(&mut self, kind: TokenKind) {
        self.emit_span(kind, self.state, self.index);
    }

    /// Emit the section up to the cursor and switch to `next_state`.
    pub(super) fn emit_then(&mut self, kind: TokenKind, next_state: ScannerState) {
        self.emit_span(kind, next_state, self.index);
    }

    /// Emit `[section_start, end)` as a token of `kind`.
    ///
    /// Tag names are lowercased and drive raw-text tracking. Empty literal and
    /// whitespace sections are dropped; every other kind is emitted even when
    /// empty. `OpenTagEnd` and `CloseTag` swallow their trailing delimiter and
    /// return the scanner to literal text regardless of `next_state`.
    pub(super) fn emit_span(&mut self, kind: TokenKind, next_state: ScannerState, end: usize) {
        let input = self.input;
        let start = self.section_start;
        debug_assert!(start <= end);
        debug_assert!(input.is_char_boundary(start) && input.is_char_boundary(end));
        let text = &input[start..end];

        if kind.is_tag_name() {
            let name = text.to_lowercase();
            self.track_raw_text(kind, &name);
            self.push_token(Token::new(kind, start, end, name));
        } else if !(kind.skipped_when_empty() && start == end) {
            self.push_token(Token::new(kind, start, end, text.to_string()));
        }

        if kind.closes_markup() {
            self.section_start = end + 1;
            self.state = ScannerState::Literal;
        } else {
            self.section_start = end;
            self.state = next_state;
        }
    }

    /// Append a token, folding a literal into an adjacent preceding literal.
    fn push_token(&mut self, token: Token) {
        if token.kind == TokenKind::Literal
            && !self.options.split_literals
            && let Some(last) = self.tokens.last_mut()
            && last.kind == TokenKind::Literal
            && last.end == token.start
        {
            last.extend_to(token.end, &token.value);
            return;
        }
        self.tokens.push(token);
    }
}

// =============================================================================
// Raw-Text Helpers
// =============================================================================

impl Tokenizer<'_> {
    /// An open tag named `script` or `style` enters raw-text mode; any close
    /// tag leaves it.
    fn track_raw_text(&mut self, kind: TokenKind, name: &str) {
        match kind {
            TokenKind::OpenTag => {
                if let Some(element) = RawTextElement::from_tag_name(name) {
                    self.raw_text = Some(element);
                }
            }
            TokenKind::CloseTag => self.raw_text = None,
            _ => {}
        }
    }

    /// Inside raw text, match the bytes after `</` against the element's name
    /// (ASCII case-insensitive), then optional whitespace and `>`.
    pub(super) fn match_raw_text_close(&mut self, element: RawTextElement) {
        let name = element.tag_name();
        let matched = self.section_len();
        let byte = self.current_byte;

        if byte == b'<' {
            self.abandon_raw_text_close();
        } else if matched < name.len() {
            if !byte.eq_ignore_ascii_case(&name[matched]) {
                self.abandon_raw_text_close();
            }
        } else if byte == b'>' {
            self.emit(TokenKind::CloseTag);
        } else if !Self::is_whitespace_byte(byte) {
            self.abandon_raw_text_close();
        }
    }

    /// The `</` and the partial name become literal text again. The current
    /// byte is handed back to the literal state, so a `<` starts a new tag
    /// attempt right away.
    fn abandon_raw_text_close(&mut self) {
        self.record_issue(IssueKind::RawTextCloseMismatch, self.markup_start);
        self.section_start = self.markup_start;
        self.reconsume_in(ScannerState::Literal);
    }
}

// =============================================================================
// Error Handling
// =============================================================================

impl Tokenizer<'_> {
    /// Record a recoverable issue, and print it when warnings are enabled.
    pub(super) fn record_issue(&mut self, kind: IssueKind, offset: usize) {
        let issue = ScanIssue { kind, offset };
        if self.options.report_warnings {
            warn_once("HTML Tokenizer", &issue.to_string());
        }
        self.issues.push(issue);
    }

    /// The invariant-failure error for the current state and cursor.
    pub(super) const fn unexpected(&self, byte: Option<u8>) -> TokenizeError {
        TokenizeError::UnexpectedState {
            state: self.state,
            offset: self.index,
            byte,
        }
    }
}
