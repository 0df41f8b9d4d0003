//! Compiled selector types and matching.

use bramble_dom::{DomTree, ElementData, NodeId, NodeType};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Examples: `div`, `p`, `h1`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.highlight`, `.nav-item`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#main`, `#nav-bar`
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// A pseudo-class or pseudo-element that parses but can never match a
    /// static tree: `:hover`, `:visited`, `::before`, `:nth-child(2)`, `:not(.x)`.
    NeverMatch,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// that need tree context to match.
    PseudoClass(PseudoClass),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Examples: `[href]`, `[type=text]`, `[lang|=en]`, `[src$=".png"]`
    Attribute(AttributeSelector),
}

/// Structural pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 4.4 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    /// "The :root pseudo-class represents an element that is the root of the document."
    Root,
    /// [§ 4.12 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [§ 4.12 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [§ 4.11 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 4.11 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 4.12 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    /// "The :only-child pseudo-class represents an element that has no siblings."
    OnlyChild,
    /// [§ 4.5 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    ///
    /// Whitespace-only text and comments do not count as content.
    Empty,
    /// [§ 4.6 :link](https://www.w3.org/TR/selectors-4/#the-link-pseudo)
    ///
    /// Any `<a>` or `<area>` with an `href`; nothing is ever visited.
    Link,
    /// `:disabled`, an element carrying the `disabled` attribute.
    Disabled,
    /// `:enabled`, an element without the `disabled` attribute.
    Enabled,
}

impl PseudoClass {
    /// Look up a pseudo-class by its (already lowercased) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "root" => Self::Root,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "only-child" => Self::OnlyChild,
            "empty" => Self::Empty,
            "link" => Self::Link,
            "disabled" => Self::Disabled,
            "enabled" => Self::Enabled,
            _ => return None,
        })
    }
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors).
///
/// Every variant holds the attribute name first. A value-less attribute
/// (`<input disabled>`) compares as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`: "Represents an element with the att attribute"
    Exists(String),
    /// `[attr=value]`: the value is exactly `value`.
    Equals(String, String),
    /// `[attr~=value]`: one of the whitespace-separated words is `value`.
    Includes(String, String),
    /// `[attr|=value]`: exactly `value`, or `value` followed by `-`.
    DashMatch(String, String),
    /// `[attr^=value]`: the value starts with `value`.
    PrefixMatch(String, String),
    /// `[attr$=value]`: the value ends with `value`.
    SuffixMatch(String, String),
    /// `[attr*=value]`: the value contains `value`.
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The simple selectors, all of which must match.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1](https://www.w3.org/TR/selectors-4/#descendant-combinators) `A B`
    Descendant,
    /// [§ 16.2](https://www.w3.org/TR/selectors-4/#child-combinators) `A > B`
    Child,
    /// [§ 16.3](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators) `A + B`
    NextSibling,
    /// [§ 16.4](https://www.w3.org/TR/selectors-4/#general-sibling-combinators) `A ~ B`
    SubsequentSibling,
}

impl Combinator {
    /// The character this combinator is written with. Descendant is a space.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Descendant => ' ',
            Self::Child => '>',
            Self::NextSibling => '+',
            Self::SubsequentSibling => '~',
        }
    }

    pub(crate) const fn from_symbol(ch: char) -> Option<Self> {
        match ch {
            '>' => Some(Self::Child),
            '+' => Some(Self::NextSibling),
            '~' => Some(Self::SubsequentSibling),
            _ => None,
        }
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// `div.container > ul.nav li` is stored as subject `li` with the chain
/// `[(Descendant, ul.nav), (Child, div.container)]`, nearest first, because
/// matching starts at the subject and walks outward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound; the elements it matches are the result.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
///
/// `(ids, classes + attributes + pseudo-classes, types)`, compared in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Create a new specificity with (A, B, C) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }
}

impl std::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// One complex selector ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The compound selectors and the combinators between them.
    pub complex: ComplexSelector,
    /// Specificity of the whole chain.
    pub specificity: Specificity,
}

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A selector list is a comma-separated list of selectors." An element
/// matches the list if it matches any entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Entries in source order. Never empty.
    pub selectors: Vec<ParsedSelector>,
}

impl SelectorList {
    /// Whether `node_id` matches any selector in the list.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches_in_tree(tree, node_id))
    }

    /// The highest specificity among the entries that match `node_id`, or
    /// `None` if none do.
    #[must_use]
    pub fn specificity(&self, tree: &DomTree, node_id: NodeId) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|s| s.matches_in_tree(tree, node_id))
            .map(|s| s.specificity)
            .max()
    }
}

impl ParsedSelector {
    pub(crate) fn new(complex: ComplexSelector) -> Self {
        let specificity = complex.calculate_specificity();
        Self {
            complex,
            specificity,
        }
    }

    /// Whether this selector has no combinators.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.complex.combinators.is_empty()
    }

    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match against the element at `node_id`. Non-element nodes never match.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId) -> bool {
        compound_matches_in_tree(&self.complex.subject, tree, node_id)
            && self.matches_chain(tree, node_id, 0) == ChainMatch::Matched
    }

    /// Match combinator `step` (and everything left of it) starting from
    /// `current`, which already matched the compound to its right.
    ///
    /// Candidates are tried in turn, so `a > b c` still matches when the
    /// nearest `b` ancestor is not a child of an `a` but a farther one is.
    /// A failure reports how far back the caller may resume, which keeps
    /// chains of descendant combinators linear in the tree depth.
    fn matches_chain(&self, tree: &DomTree, current: NodeId, step: usize) -> ChainMatch {
        let Some((combinator, compound)) = self.complex.combinators.get(step) else {
            return ChainMatch::Matched;
        };
        let combinator = *combinator;

        let mut candidate = next_candidate(tree, current, combinator);
        while let Some(id) = candidate {
            let result = if compound_matches_in_tree(compound, tree, id) {
                self.matches_chain(tree, id, step + 1)
            } else {
                ChainMatch::RetrySibling
            };
            match (result, combinator) {
                (ChainMatch::Matched | ChainMatch::Never, _)
                | (_, Combinator::NextSibling)
                | (ChainMatch::RetryAncestor, Combinator::SubsequentSibling) => return result,
                (_, Combinator::Child) => return ChainMatch::RetryAncestor,
                _ => {}
            }
            candidate = next_candidate(tree, id, combinator);
        }

        match combinator {
            Combinator::NextSibling | Combinator::SubsequentSibling => ChainMatch::RetryAncestor,
            Combinator::Descendant | Combinator::Child => ChainMatch::Never,
        }
    }
}

/// Outcome of matching the left part of a selector chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainMatch {
    Matched,
    /// Failed here; an earlier sibling may still work.
    RetrySibling,
    /// Failed for every sibling; only a farther ancestor may still work.
    RetryAncestor,
    /// No candidate anywhere further out can work.
    Never,
}

/// The next element a combinator reaches from `id`, walking outward.
fn next_candidate(tree: &DomTree, id: NodeId, combinator: Combinator) -> Option<NodeId> {
    match combinator {
        Combinator::Descendant | Combinator::Child => tree.parent(id),
        Combinator::NextSibling | Combinator::SubsequentSibling => {
            previous_element_sibling(tree, id)
        }
    }
}

impl ComplexSelector {
    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    ///
    /// Sum of the specificities of every compound in the chain.
    #[must_use]
    pub fn calculate_specificity(&self) -> Specificity {
        self.combinators
            .iter()
            .map(|(_, compound)| compound.specificity())
            .fold(self.subject.specificity(), |acc, s| acc + s)
    }
}

impl CompoundSelector {
    /// Specificity of this compound alone.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::default();
        for simple in &self.simple_selectors {
            match simple {
                SimpleSelector::Id(_) => spec.0 += 1,
                SimpleSelector::Class(_)
                | SimpleSelector::PseudoClass(_)
                | SimpleSelector::Attribute(_) => spec.1 += 1,
                SimpleSelector::Type(_) => spec.2 += 1,
                // "ignore the universal selector"
                SimpleSelector::Universal | SimpleSelector::NeverMatch => {}
            }
        }
        spec
    }
}

fn compound_matches_in_tree(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node_id, element),
        _ => simple.matches(element),
    })
}

fn pseudo_class_matches(
    pc: PseudoClass,
    tree: &DomTree,
    node_id: NodeId,
    element: &ElementData,
) -> bool {
    let element_siblings = || {
        tree.parent(node_id)
            .map(|parent| tree.children(parent))
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&c| tree.as_element(c).is_some())
    };
    let same_type = |c: &NodeId| {
        tree.as_element(*c)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };

    match pc {
        PseudoClass::Root => tree.document_element() == Some(node_id),
        PseudoClass::FirstChild => element_siblings().next() == Some(node_id),
        PseudoClass::LastChild => element_siblings().last() == Some(node_id),
        PseudoClass::FirstOfType => element_siblings().find(same_type) == Some(node_id),
        PseudoClass::LastOfType => element_siblings().filter(same_type).last() == Some(node_id),
        PseudoClass::OnlyChild => {
            tree.parent(node_id).is_some() && element_siblings().count() == 1
        }
        PseudoClass::Empty => tree.children(node_id).iter().all(|&c| {
            match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.iter().all(u8::is_ascii_whitespace),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }
        }),
        PseudoClass::Link => {
            (element.tag_name.eq_ignore_ascii_case(b"a")
                || element.tag_name.eq_ignore_ascii_case(b"area"))
                && element.has_attr(b"href")
        }
        PseudoClass::Disabled => element.has_attr(b"disabled"),
        PseudoClass::Enabled => !element.has_attr(b"disabled"),
    }
}

/// The nearest preceding sibling that is an element, skipping text and comments.
fn previous_element_sibling(tree: &DomTree, node_id: NodeId) -> Option<NodeId> {
    tree.preceding_siblings(node_id)
        .find(|&sibling| tree.as_element(sibling).is_some())
}

impl SimpleSelector {
    /// Check this simple selector against one element, without tree context.
    ///
    /// Structural pseudo-classes need the tree and always return `false` here.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name.as_bytes()),
            Self::Class(class_name) => element.has_class(class_name.as_bytes()),
            Self::Id(id) => element.id() == Some(id.as_bytes()),
            Self::Universal => true,
            Self::NeverMatch | Self::PseudoClass(_) => false,
            Self::Attribute(attr_sel) => attr_sel.matches(element),
        }
    }
}

impl AttributeSelector {
    /// The attribute name this selector tests.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Exists(name)
            | Self::Equals(name, _)
            | Self::Includes(name, _)
            | Self::DashMatch(name, _)
            | Self::PrefixMatch(name, _)
            | Self::SuffixMatch(name, _)
            | Self::SubstringMatch(name, _) => name,
        }
    }

    /// Check the element's attribute against this selector. Comparison is
    /// byte-wise and case-sensitive.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        let Some(value) = element.attr(self.name().as_bytes()) else {
            return false;
        };
        let value = value.unwrap_or_default();

        match self {
            Self::Exists(_) => true,
            Self::Equals(_, val) => value == val.as_bytes(),
            // "If val contains whitespace, it will never represent anything."
            Self::Includes(_, val) => {
                let val = val.as_bytes();
                !val.is_empty()
                    && !val.iter().any(u8::is_ascii_whitespace)
                    && value.split(u8::is_ascii_whitespace).any(|w| w == val)
            }
            Self::DashMatch(_, val) => {
                let val = val.as_bytes();
                value == val || (value.starts_with(val) && value.get(val.len()) == Some(&b'-'))
            }
            // "If val is the empty string then the selector does not represent anything."
            Self::PrefixMatch(_, val) => !val.is_empty() && value.starts_with(val.as_bytes()),
            Self::SuffixMatch(_, val) => !val.is_empty() && value.ends_with(val.as_bytes()),
            Self::SubstringMatch(_, val) => {
                !val.is_empty() && memchr::memmem::find(value, val.as_bytes()).is_some()
            }
        }
    }
}
