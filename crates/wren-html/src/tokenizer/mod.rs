//! Markup tokenizer module.
//!
//! A fifteen-state machine that walks the input once, one byte at a time, and
//! cuts it into sections. Each emitted section becomes a [`Token`].

/// Error type for state machine invariant failures.
pub mod error;
/// Scanner state machine implementation.
pub mod scanner;
/// Token types produced by the tokenizer.
pub mod token;

// State transitions, emission and raw-text tracking shared by the handlers.
mod helpers;

pub use error::TokenizeError;
pub use scanner::{
    IssueKind, ScanIssue, ScanOptions, ScannerState, Tokenizer, tokenize, tokenize_with,
};
pub use token::{Token, TokenKind};
