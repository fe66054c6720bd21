//! Markup scanner for the Wren toolkit.
//!
//! # Scope
//!
//! This crate implements a single-pass lexical scanner that walks a markup
//! buffer once and reports typed tokens with their byte spans:
//! - Literal text runs, tag open/close markers and self-closing markers
//! - Attribute gaps, `=` separators and unquoted/quoted attribute values
//! - Raw text inside `script` and `style`, comments, bogus comments and doctypes
//!
//! # Not Part of This Crate
//!
//! - Tree construction
//! - Character reference decoding
//! - Charset detection
//! - Attribute name extraction and validation
//!
//! Malformed markup never fails a scan: unrecognized constructs degrade to
//! literal text and are recorded as [`ScanIssue`]s.

/// Tokenizer for converting markup into tokens.
pub mod tokenizer;

pub use tokenizer::{
    IssueKind, ScanIssue, ScanOptions, ScannerState, Token, TokenKind, TokenizeError, Tokenizer,
    tokenize, tokenize_with,
};
