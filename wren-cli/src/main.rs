//! Wren CLI
//!
//! Tokenizes markup and prints the token stream.
//!
//! Usage:
//!   wren <file>...             One token per line
//!   wren <file> --json         Tokens as a JSON array
//!   wren --html '<p>Hi</p>'    Tokenize an inline string

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use owo_colors::OwoColorize;
use wren_common::warning::clear_warnings;
use wren_html::{ScanIssue, ScanOptions, Token, TokenKind, Tokenizer};

/// Wren: single-pass markup scanner
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "wren")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["files", "html"])))]
#[command(after_help = r#"EXAMPLES:
    # Print the tokens of a file
    wren ./index.html

    # Tokenize inline markup as JSON
    wren --json --html '<a href=x>link</a>'

    # Show what the scanner degraded
    wren --issues --html '<!doctyp>'
"#)]
struct Cli {
    /// Files to tokenize
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Tokenize this string instead of reading a file
    #[arg(long, value_name = "HTML")]
    html: Option<String>,

    /// Print tokens as a pretty JSON array
    #[arg(short, long)]
    json: bool,

    /// Report every literal emission as its own token
    #[arg(long)]
    split_literals: bool,

    /// Flush unterminated attribute values as literal text
    #[arg(long)]
    flush_unterminated: bool,

    /// Print scanner issues to stderr as they are found
    #[arg(short, long)]
    warnings: bool,

    /// List the recorded issues after the tokens
    #[arg(short, long)]
    issues: bool,
}

impl Cli {
    const fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            split_literals: self.split_literals,
            flush_unterminated: self.flush_unterminated,
            report_warnings: self.warnings,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    if let Some(ref html) = cli.html {
        return dump(&mut out, &cli, html);
    }

    let many = cli.files.len() > 1;
    for (i, path) in cli.files.iter().enumerate() {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        if many {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "=== {} ===", path.display().bold())?;
        }
        dump(&mut out, &cli, &source)
            .with_context(|| format!("failed to tokenize '{}'", path.display()))?;
        clear_warnings();
    }
    Ok(())
}

/// Tokenize `source` and write the result in the selected format.
fn dump(out: &mut impl Write, cli: &Cli, source: &str) -> Result<()> {
    let mut tokenizer = Tokenizer::new(source).with_options(cli.scan_options());
    tokenizer.run()?;
    let (tokens, issues) = tokenizer.into_parts();

    if cli.json {
        serde_json::to_writer_pretty(&mut *out, &tokens)?;
        writeln!(out)?;
    } else {
        for (i, token) in tokens.iter().enumerate() {
            writeln!(out, "{i:4}: {}", render(token))?;
        }
    }

    if cli.issues {
        write_issues(out, &issues)?;
    }
    Ok(())
}

/// `Kind(start..end) "value"` with the kind colored by category.
fn render(token: &Token) -> String {
    let kind = token.kind.to_string();
    let kind = match token.kind {
        TokenKind::Literal | TokenKind::Whitespace => kind.dimmed().to_string(),
        TokenKind::OpenTag | TokenKind::CloseTag => kind.green().bold().to_string(),
        TokenKind::OpenTagEnd => kind.green().to_string(),
        TokenKind::AttrValueEq
        | TokenKind::AttrValueNq
        | TokenKind::AttrValueSq
        | TokenKind::AttrValueDq => kind.cyan().to_string(),
    };
    format!("{kind}({}..{}) {:?}", token.start, token.end, token.value)
}

fn write_issues(out: &mut impl Write, issues: &[ScanIssue]) -> Result<()> {
    writeln!(out, "\n=== Issues ({}) ===", issues.len())?;
    for issue in issues {
        writeln!(out, "  {}", issue.yellow())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_files_or_html() {
        assert!(Cli::try_parse_from(["wren"]).is_err());
        assert!(Cli::try_parse_from(["wren", "a.html", "--html", "<p>"]).is_err());
        let cli = Cli::try_parse_from(["wren", "a.html", "b.html"]).unwrap();
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn flags_map_onto_scan_options() {
        let cli = Cli::try_parse_from(["wren", "--html", "x", "--split-literals", "-w"]).unwrap();
        let options = cli.scan_options();
        assert!(options.split_literals);
        assert!(options.report_warnings);
        assert!(!options.flush_unterminated);
    }

    #[test]
    fn json_output_is_an_array() {
        let cli = Cli::try_parse_from(["wren", "--json", "--html", "<p>hi</p>"]).unwrap();
        let mut out = Vec::new();
        dump(&mut out, &cli, "<p>hi</p>").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let tokens = value.as_array().unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0]["kind"], "OpenTag");
        assert_eq!(tokens[2]["value"], "hi");
    }

    #[test]
    fn issues_are_listed_after_tokens() {
        let cli = Cli::try_parse_from(["wren", "-i", "--html", "a < b"]).unwrap();
        let mut out = Vec::new();
        dump(&mut out, &cli, "a < b").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== Issues (1) ==="));
        assert!(text.contains("AbandonedTagOpen at offset 2"));
    }
}
