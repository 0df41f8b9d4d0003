//! CSS selector compilation and matching.
//!
//! Selectors are parsed per [Selectors Level 4](https://www.w3.org/TR/selectors-4/)
//! and matched right-to-left against a [`bramble_dom::DomTree`]. Matching
//! compares stored bytes directly; nothing is decoded.
//!
//! The [`SelectorEngine`] trait is the seam the node layer queries through.
//! [`CssEngine`] is the bundled implementation.

mod engine;
mod parser;
mod selector;

use thiserror::Error;

pub use engine::{CssEngine, DEFAULT_CACHE_CAPACITY, MatchScope, SelectorEngine};
pub use parser::{parse_selector, parse_selector_list};
pub use selector::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, ParsedSelector, PseudoClass,
    SelectorList, SimpleSelector, Specificity,
};

/// A selector string could not be compiled.
///
/// Offsets are byte offsets into the query string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The query, or one entry of a selector list, is empty.
    #[error("empty selector")]
    Empty,
    /// A character that cannot appear at this point.
    #[error("unexpected character {ch:?} at offset {offset}")]
    Unexpected {
        /// The offending character.
        ch: char,
        /// Where it was found.
        offset: usize,
    },
    /// A combinator with no compound selector on one side.
    #[error("combinator '{0}' is missing a selector on one side")]
    DanglingCombinator(char),
    /// `.`, `#`, `:` or `[` not followed by a name.
    #[error("expected a name at offset {offset}")]
    MissingName {
        /// Where the name should start.
        offset: usize,
    },
    /// A quoted attribute value without its closing quote.
    #[error("unterminated string in attribute selector")]
    UnterminatedString,
    /// An attribute selector without its closing `]`.
    #[error("attribute selector is missing its closing ']'")]
    UnclosedBracket,
    /// A functional pseudo-class whose parentheses do not balance.
    #[error("unbalanced parentheses in pseudo-class argument")]
    UnbalancedParens,
}
