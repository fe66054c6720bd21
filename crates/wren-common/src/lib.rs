//! Common utilities for the Wren scanner.
//!
//! This crate provides shared infrastructure used by all Wren components:
//! - **Warning System** - colored, deduplicated terminal output for recoverable issues

pub mod warning;
