//! Bramble CLI
//!
//! Loads a JSON tree snapshot, runs a selector query over it and prints
//! each match's markup or text.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use bramble::{DecodePolicy, Document, DocumentOptions, MatchScope, Node, TextOptions};
use clap::Parser;
use owo_colors::OwoColorize;

/// Bramble: query HTML tree snapshots with CSS selectors
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "bramble")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the markup of every link
    bramble page.json 'a[href]'

    # Text of the first heading, each fragment trimmed
    bramble page.json h1 --first --text --strip

    # Fail unless exactly zero or one element matches
    bramble page.json '#main' --first --strict
"#)]
struct Cli {
    /// JSON snapshot of the document tree
    #[arg(value_name = "SNAPSHOT.json")]
    snapshot: PathBuf,

    /// Selector to run from the document root
    #[arg(value_name = "QUERY")]
    query: String,

    /// Print extracted text instead of markup
    #[arg(long)]
    text: bool,

    /// Only read direct text children (with --text)
    #[arg(long)]
    shallow: bool,

    /// Appended after every text fragment (with --text)
    #[arg(long, value_name = "S", default_value = "")]
    separator: String,

    /// Trim whitespace from every text fragment (with --text)
    #[arg(long)]
    strip: bool,

    /// Only print the first match
    #[arg(long)]
    first: bool,

    /// With --first, fail if more than one element matches
    #[arg(long, requires = "first")]
    strict: bool,

    /// How invalid UTF-8 is handled: strict, replace or ignore
    #[arg(long, value_name = "POLICY", default_value = "ignore")]
    decode: DecodePolicy,

    /// Let the root itself match
    #[arg(long)]
    inclusive: bool,
}

impl Cli {
    fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            decode_policy: self.decode,
            match_scope: if self.inclusive {
                MatchScope::Inclusive
            } else {
                MatchScope::Descendants
            },
            ..DocumentOptions::default()
        }
    }

    fn text_options(&self) -> Option<TextOptions> {
        self.text.then(|| TextOptions {
            deep: !self.shallow,
            separator: self.separator.clone(),
            strip: self.strip,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let json = fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("failed to read {}", cli.snapshot.display()))?;
    let doc = Document::from_json(&json, &cli.document_options())
        .with_context(|| format!("failed to load {}", cli.snapshot.display()))?;

    let matches: Vec<Node> = if cli.first {
        doc.css_first(&cli.query, None, cli.strict)?
            .into_iter()
            .collect()
    } else {
        doc.css(&cli.query)?
    };

    let text = cli.text_options();
    for node in &matches {
        let output = match &text {
            Some(options) => node.text_with(options)?,
            None => node.html()?.unwrap_or_default(),
        };
        println!("{output}");
    }

    let summary = format!(
        "{} match{}",
        matches.len(),
        if matches.len() == 1 { "" } else { "es" }
    );
    if matches.is_empty() {
        eprintln!("{}", summary.yellow());
    } else {
        eprintln!("{}", summary.green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bramble").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["page.json", "p"]);
        let options = cli.document_options();
        assert_eq!(options.decode_policy, DecodePolicy::Ignore);
        assert_eq!(options.match_scope, MatchScope::Descendants);
        assert!(cli.text_options().is_none());
        assert!(!cli.first);
    }

    #[test]
    fn test_text_flags_map_to_text_options() {
        let cli = parse(&[
            "page.json",
            "p",
            "--text",
            "--shallow",
            "--separator",
            "|",
            "--strip",
        ]);
        let options = cli.text_options().unwrap();
        assert!(!options.deep);
        assert_eq!(options.separator, "|");
        assert!(options.strip);
    }

    #[test]
    fn test_decode_and_scope_flags() {
        let cli = parse(&["page.json", "p", "--decode", "strict", "--inclusive"]);
        let options = cli.document_options();
        assert_eq!(options.decode_policy, DecodePolicy::Strict);
        assert_eq!(options.match_scope, MatchScope::Inclusive);
    }

    #[test]
    fn test_rejects_unknown_policy_and_bare_strict() {
        let bad_policy = ["bramble", "page.json", "p", "--decode", "latin1"];
        assert!(Cli::try_parse_from(bad_policy).is_err());
        let bare_strict = ["bramble", "page.json", "p", "--strict"];
        assert!(Cli::try_parse_from(bare_strict).is_err());
    }
}
