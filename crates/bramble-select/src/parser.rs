//! [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
//!
//! A hand-written, single pass parser. It reads one character at a time
//! and builds compound selectors left to right, then reverses the chain so
//! the subject comes first.

use std::iter::Peekable;
use std::str::CharIndices;

use bramble_common::warning::warn_once;

use crate::SelectorError;
use crate::selector::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, ParsedSelector, PseudoClass,
    SelectorList, SimpleSelector,
};

/// Parse a comma-separated selector list such as `h1, .title > a`.
///
/// # Errors
///
/// Returns a [`SelectorError`] describing the first problem found. An empty
/// entry (`"a,"`, `", a"`) is [`SelectorError::Empty`].
pub fn parse_selector_list(raw: &str) -> Result<SelectorList, SelectorError> {
    let mut parser = Parser::new(raw);
    let mut selectors = vec![ParsedSelector::new(parser.complex()?)];

    while let Some((offset, ch)) = parser.bump() {
        if ch != ',' {
            return Err(SelectorError::Unexpected { ch, offset });
        }
        selectors.push(ParsedSelector::new(parser.complex()?));
    }

    Ok(SelectorList { selectors })
}

/// Parse a single complex selector. A top-level comma is an error here.
///
/// # Errors
///
/// Returns a [`SelectorError`] describing the first problem found.
pub fn parse_selector(raw: &str) -> Result<ParsedSelector, SelectorError> {
    let mut parser = Parser::new(raw);
    let complex = parser.complex()?;
    match parser.bump() {
        None => Ok(ParsedSelector::new(complex)),
        Some((offset, ch)) => Err(SelectorError::Unexpected { ch, offset }),
    }
}

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    /// Offset of the next character, or the input length at the end.
    fn offset(&mut self) -> usize {
        self.peek().map_or(self.input.len(), |(offset, _)| offset)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, ch)| ch.is_ascii_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, ch)| ch == expected).is_some()
    }

    /// Consume identifier characters; may return an empty string.
    fn ident(&mut self) -> String {
        let mut name = String::new();
        while let Some((_, ch)) = self.chars.next_if(|&(_, ch)| is_ident_char(ch)) {
            name.push(ch);
        }
        name
    }

    /// An identifier that must not be empty.
    fn name(&mut self) -> Result<String, SelectorError> {
        let offset = self.offset();
        let name = self.ident();
        if name.is_empty() {
            return Err(SelectorError::MissingName { offset });
        }
        Ok(name)
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    ///
    /// Reads up to a top-level `,` or the end of input, leaving the comma
    /// unconsumed.
    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut combinators_between: Vec<Combinator> = Vec::new();
        let mut current: Vec<SimpleSelector> = Vec::new();

        self.skip_whitespace();

        while let Some((offset, c)) = self.peek() {
            match c {
                ',' => break,

                // [§ 6.6](https://www.w3.org/TR/selectors-4/#class-html)
                '.' => {
                    let _ = self.bump();
                    current.push(SimpleSelector::Class(self.name()?));
                }

                // [§ 6.7](https://www.w3.org/TR/selectors-4/#id-selectors)
                '#' => {
                    let _ = self.bump();
                    current.push(SimpleSelector::Id(self.name()?));
                }

                // [§ 5.2](https://www.w3.org/TR/selectors-4/#universal-selector)
                '*' => {
                    let _ = self.bump();
                    current.push(SimpleSelector::Universal);
                }

                // Whitespace is a descendant combinator unless an explicit
                // combinator, a comma or the end follows it.
                c if c.is_ascii_whitespace() => {
                    self.skip_whitespace();
                    match self.peek() {
                        None | Some((_, ',' | '>' | '+' | '~')) => {}
                        Some(_) if current.is_empty() => {}
                        Some(_) => {
                            compounds.push(CompoundSelector {
                                simple_selectors: std::mem::take(&mut current),
                            });
                            combinators_between.push(Combinator::Descendant);
                        }
                    }
                }

                '>' | '+' | '~' => {
                    let _ = self.bump();
                    if current.is_empty() {
                        return Err(SelectorError::DanglingCombinator(c));
                    }
                    compounds.push(CompoundSelector {
                        simple_selectors: std::mem::take(&mut current),
                    });
                    if let Some(combinator) = Combinator::from_symbol(c) {
                        combinators_between.push(combinator);
                    }
                    self.skip_whitespace();
                }

                ':' => {
                    let _ = self.bump();
                    current.push(self.pseudo()?);
                }

                // [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
                '[' => {
                    let _ = self.bump();
                    current.push(SimpleSelector::Attribute(self.attribute()?));
                }

                // [§ 5.1](https://www.w3.org/TR/selectors-4/#type-selectors)
                c if is_ident_start_char(c) || c == '-' => {
                    current.push(SimpleSelector::Type(self.ident()));
                }

                _ => return Err(SelectorError::Unexpected { ch: c, offset }),
            }
        }

        if !current.is_empty() {
            compounds.push(CompoundSelector {
                simple_selectors: current,
            });
        }

        if compounds.len() != combinators_between.len() + 1 {
            return Err(match combinators_between.last() {
                Some(&combinator) if !compounds.is_empty() => {
                    SelectorError::DanglingCombinator(combinator.symbol())
                }
                _ => SelectorError::Empty,
            });
        }

        let Some(subject) = compounds.pop() else {
            return Err(SelectorError::Empty);
        };
        let combinators = compounds
            .into_iter()
            .zip(combinators_between)
            .rev()
            .map(|(compound, combinator)| (combinator, compound))
            .collect();

        Ok(ComplexSelector {
            subject,
            combinators,
        })
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Called after the first `:`. Functional arguments are consumed and
    /// discarded; anything not listed in [`PseudoClass`] never matches.
    fn pseudo(&mut self) -> Result<SimpleSelector, SelectorError> {
        let is_pseudo_element = self.eat(':');
        let name = self.name()?;

        let functional = self.eat('(');
        if functional {
            let mut depth = 1u32;
            while depth > 0 {
                match self.bump() {
                    Some((_, '(')) => depth += 1,
                    Some((_, ')')) => depth -= 1,
                    Some(_) => {}
                    None => return Err(SelectorError::UnbalancedParens),
                }
            }
        }

        let known = if is_pseudo_element || functional {
            None
        } else {
            PseudoClass::from_name(&name.to_ascii_lowercase())
        };

        Ok(known.map_or_else(
            || {
                let prefix = if is_pseudo_element { "::" } else { ":" };
                let _ = warn_once(
                    "Selector",
                    &format!("{prefix}{name} is not supported and will never match"),
                );
                SimpleSelector::NeverMatch
            },
            SimpleSelector::PseudoClass,
        ))
    }

    /// Called after `[`; consumes through the closing `]`.
    fn attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.name()?;
        self.skip_whitespace();

        let build: fn(String, String) -> AttributeSelector = match self.bump() {
            Some((_, ']')) => return Ok(AttributeSelector::Exists(name)),
            Some((_, '=')) => AttributeSelector::Equals,
            Some((offset, op @ ('~' | '|' | '^' | '$' | '*'))) => {
                match self.bump() {
                    Some((_, '=')) => {}
                    Some((offset, ch)) => return Err(SelectorError::Unexpected { ch, offset }),
                    None => return Err(SelectorError::UnclosedBracket),
                }
                match op {
                    '~' => AttributeSelector::Includes,
                    '|' => AttributeSelector::DashMatch,
                    '^' => AttributeSelector::PrefixMatch,
                    '$' => AttributeSelector::SuffixMatch,
                    '*' => AttributeSelector::SubstringMatch,
                    ch => return Err(SelectorError::Unexpected { ch, offset }),
                }
            }
            Some((offset, ch)) => return Err(SelectorError::Unexpected { ch, offset }),
            None => return Err(SelectorError::UnclosedBracket),
        };

        let value = self.attribute_value()?;
        self.skip_whitespace();
        match self.bump() {
            Some((_, ']')) => Ok(build(name, value)),
            Some((offset, ch)) => Err(SelectorError::Unexpected { ch, offset }),
            None => Err(SelectorError::UnclosedBracket),
        }
    }

    /// A quoted string or a bare identifier (dots allowed, for `[src$=.png]`).
    fn attribute_value(&mut self) -> Result<String, SelectorError> {
        self.skip_whitespace();
        match self.peek() {
            Some((_, quote @ ('"' | '\''))) => {
                let _ = self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some((_, ch)) if ch == quote => return Ok(value),
                        Some((_, ch)) => value.push(ch),
                        None => return Err(SelectorError::UnterminatedString),
                    }
                }
            }
            _ => {
                let offset = self.offset();
                let mut value = String::new();
                while let Some((_, ch)) = self
                    .chars
                    .next_if(|&(_, ch)| is_ident_char(ch) || ch == '.')
                {
                    value.push(ch);
                }
                if value.is_empty() {
                    return Err(SelectorError::MissingName { offset });
                }
                Ok(value)
            }
        }
    }
}
