//! Integration tests for selector parsing and matching.

use bramble_dom::{DomTree, NodeId};
use bramble_select::{
    AttributeSelector, Combinator, CssEngine, MatchScope, PseudoClass, SelectorEngine,
    SimpleSelector, Specificity, parse_selector, parse_selector_list,
};

const PAGE: &str = r#"{"type": "document", "children": [
  {"type": "element", "tag": "html", "children": [
    {"type": "element", "tag": "head", "children": [
      {"type": "element", "tag": "title", "children": [{"type": "text", "text": "T"}]}
    ]},
    {"type": "element", "tag": "body", "children": [
      {"type": "element", "tag": "div",
       "attributes": [["id", "main"], ["class", "container wide"]], "children": [
        {"type": "element", "tag": "h1", "attributes": [["id", "heading"]],
         "children": [{"type": "text", "text": "Title"}]},
        {"type": "text", "text": "\n"},
        {"type": "element", "tag": "p", "attributes": [["id", "intro"], ["class", "intro"]],
         "children": [{"type": "text", "text": "a"}]},
        {"type": "comment", "text": "between"},
        {"type": "element", "tag": "p", "attributes": [["id", "second"]], "children": [
          {"type": "element", "tag": "a", "attributes": [
            ["id", "link"], ["href", "https://example.com/x.png"], ["lang", "en-GB"]]}
        ]},
        {"type": "element", "tag": "ul", "attributes": [["id", "list"]], "children": [
          {"type": "element", "tag": "li", "attributes": [["id", "li1"]]},
          {"type": "element", "tag": "li", "attributes": [["id", "li2"], ["class", "active"]]},
          {"type": "element", "tag": "li", "attributes": [["id", "li3"]]}
        ]}
      ]},
      {"type": "element", "tag": "div", "attributes": [["id", "blank"]],
       "children": [{"type": "text", "text": "  "}]},
      {"type": "element", "tag": "input", "attributes": [["id", "field"], ["disabled", null]]}
    ]}
  ]}
]}"#;

fn page() -> DomTree {
    DomTree::from_json(PAGE).unwrap()
}

/// The id attribute of each match, or its tag name when it has none.
fn labels(tree: &DomTree, ids: &[NodeId]) -> Vec<String> {
    ids.iter()
        .map(|&id| {
            let element = tree.as_element(id).unwrap();
            let label = element.id().unwrap_or(&element.tag_name);
            String::from_utf8_lossy(label).into_owned()
        })
        .collect()
}

fn select(tree: &DomTree, query: &str) -> Vec<String> {
    let engine = CssEngine::new();
    labels(tree, &engine.select(tree, NodeId::ROOT, query).unwrap())
}

fn find(tree: &DomTree, id: &str) -> NodeId {
    tree.descendants(NodeId::ROOT)
        .find(|&n| tree.as_element(n).and_then(|e| e.id()) == Some(id.as_bytes()))
        .unwrap()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_compound_selector() {
    let selector = parse_selector("div.highlight#main").unwrap();
    assert_eq!(selector.specificity, Specificity(1, 1, 1));
    assert_eq!(selector.complex.subject.simple_selectors.len(), 3);
    assert!(selector.is_simple());
}

#[test]
fn test_parse_multiple_combinators() {
    // [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    let selector = parse_selector("div.container > ul.nav li a.active").unwrap();

    assert_eq!(selector.complex.subject.simple_selectors.len(), 2);
    assert!(matches!(
        &selector.complex.subject.simple_selectors[0],
        SimpleSelector::Type(name) if name == "a"
    ));

    // Nearest to the subject first.
    let chain: Vec<_> = selector.complex.combinators.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        chain,
        [Combinator::Descendant, Combinator::Descendant, Combinator::Child]
    );
    assert_eq!(selector.specificity, Specificity(0, 3, 4));
}

#[test]
fn test_parse_combinators_without_whitespace() {
    let selector = parse_selector("h1+p~ul>li").unwrap();
    let chain: Vec<_> = selector.complex.combinators.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        chain,
        [
            Combinator::Child,
            Combinator::SubsequentSibling,
            Combinator::NextSibling
        ]
    );
}

#[test]
fn test_parse_pseudo_classes() {
    for (text, expected) in [
        (":root", PseudoClass::Root),
        ("li:first-child", PseudoClass::FirstChild),
        ("li:LAST-CHILD", PseudoClass::LastChild),
        (":only-child", PseudoClass::OnlyChild),
        (":empty", PseudoClass::Empty),
        ("a:link", PseudoClass::Link),
    ] {
        let selector = parse_selector(text).unwrap();
        assert!(
            selector
                .complex
                .subject
                .simple_selectors
                .contains(&SimpleSelector::PseudoClass(expected)),
            "{text}"
        );
    }
}

#[test]
fn test_unsupported_pseudo_classes_never_match() {
    for text in [":hover", "::before", ":nth-child(2n+1)", ":not(.a, .b)", "::-webkit-scrollbar"] {
        let selector = parse_selector(text).unwrap();
        assert_eq!(
            selector.complex.subject.simple_selectors,
            [SimpleSelector::NeverMatch],
            "{text}"
        );
    }
}

#[test]
fn test_parse_attribute_operators() {
    let selector = parse_selector("[ src $= '.png' ]").unwrap();
    assert!(matches!(
        &selector.complex.subject.simple_selectors[0],
        SimpleSelector::Attribute(AttributeSelector::SuffixMatch(name, val))
            if name == "src" && val == ".png"
    ));

    let selector = parse_selector("[lang|=en]").unwrap();
    assert!(matches!(
        &selector.complex.subject.simple_selectors[0],
        SimpleSelector::Attribute(AttributeSelector::DashMatch(name, val))
            if name == "lang" && val == "en"
    ));
}

#[test]
fn test_parse_selector_list() {
    let list = parse_selector_list("h1, .title > a").unwrap();
    assert_eq!(list.selectors.len(), 2);
    assert!(list.selectors[0].is_simple());
    assert!(!list.selectors[1].is_simple());
}

// =============================================================================
// Matching: combinators
// =============================================================================

#[test]
fn test_match_descendant_and_child() {
    let tree = page();
    assert_eq!(select(&tree, "div p"), ["intro", "second"]);
    assert_eq!(select(&tree, "#main > p"), ["intro", "second"]);
    assert!(select(&tree, "body > p").is_empty());
}

#[test]
fn test_match_sibling_combinators_skip_text_and_comments() {
    let tree = page();
    assert_eq!(select(&tree, "h1 + p"), ["intro"]);
    assert_eq!(select(&tree, "p + p"), ["second"]);
    assert_eq!(select(&tree, "h1 ~ p"), ["intro", "second"]);
    assert_eq!(select(&tree, "ul ~ p"), Vec::<String>::new());
}

#[test]
fn test_match_backtracks_through_ancestors() {
    let tree = page();
    // The nearest `*` ancestor of the link is p#second, whose parent is not
    // html; a farther one (body) is.
    assert_eq!(select(&tree, "html > * a"), ["link"]);
    assert_eq!(select(&tree, "html div > ul li.active"), ["li2"]);
}

#[test]
fn test_match_sibling_failure_moves_to_farther_ancestor() {
    let tree = page();
    // p#second follows h1 but is not directly after it.
    assert!(select(&tree, "h1 + p a").is_empty());
    assert_eq!(select(&tree, "h1 ~ p a"), ["link"]);
    assert_eq!(select(&tree, "#intro + p > a"), ["link"]);
    assert_eq!(select(&tree, "head + body #second a"), ["link"]);
}

#[test]
fn test_descendant_chains_on_deep_tree_stay_fast() {
    const DEPTH: usize = 3_000;
    let mut tree = DomTree::new();
    let mut parent = NodeId::ROOT;
    for _ in 0..DEPTH {
        let div = tree.create_element("div");
        tree.append_child(parent, div).unwrap();
        parent = div;
    }
    let span = tree.create_element("span");
    tree.append_child(parent, span).unwrap();

    let started = std::time::Instant::now();
    assert!(select(&tree, "p div div div div span").is_empty());
    assert!(select(&tree, "div div div div span p").is_empty());
    assert_eq!(select(&tree, "div div div div div span"), ["span"]);
    assert_eq!(select(&tree, "body ~ div div span, div > div > span"), ["span"]);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn test_selector_list_results_are_in_document_order_and_unique() {
    let tree = page();
    assert_eq!(
        select(&tree, "#field, li.active, h1"),
        ["heading", "li2", "field"]
    );
    assert_eq!(select(&tree, "p, #intro, .intro"), ["intro", "second"]);
}

// =============================================================================
// Matching: attributes and pseudo-classes
// =============================================================================

#[test]
fn test_match_attribute_selectors() {
    let tree = page();
    assert_eq!(select(&tree, "[href^=https]"), ["link"]);
    assert_eq!(select(&tree, "[href$=\".png\"]"), ["link"]);
    assert_eq!(select(&tree, "[href*=example]"), ["link"]);
    assert_eq!(select(&tree, "[lang|=en]"), ["link"]);
    assert_eq!(select(&tree, "[class~=wide]"), ["main"]);
    assert_eq!(select(&tree, "[disabled]"), ["field"]);
    assert_eq!(select(&tree, "[disabled=\"\"]"), ["field"]);
    assert!(select(&tree, "[href=https]").is_empty());
}

#[test]
fn test_match_structural_pseudo_classes() {
    let tree = page();
    assert_eq!(select(&tree, "li:first-child"), ["li1"]);
    assert_eq!(select(&tree, "li:last-child"), ["li3"]);
    assert_eq!(select(&tree, "p:first-of-type"), ["intro"]);
    assert_eq!(select(&tree, "p:last-of-type"), ["second"]);
    assert_eq!(select(&tree, ":only-child"), ["html", "title", "link"]);
    assert_eq!(select(&tree, "div:empty"), ["blank"]);
    assert_eq!(select(&tree, ":root"), ["html"]);
    assert_eq!(select(&tree, ":link"), ["link"]);
    assert_eq!(select(&tree, "input:disabled"), ["field"]);
    assert!(select(&tree, "input:enabled").is_empty());
    assert!(select(&tree, "li:hover").is_empty());
}

// =============================================================================
// Engine scope
// =============================================================================

#[test]
fn test_scope_controls_whether_root_can_match() {
    let tree = page();
    let main = find(&tree, "main");

    let descendants = CssEngine::with_options(MatchScope::Descendants, 8);
    assert!(descendants.select(&tree, main, "div").unwrap().is_empty());

    let inclusive = CssEngine::with_options(MatchScope::Inclusive, 8);
    assert_eq!(
        labels(&tree, &inclusive.select(&tree, main, "div").unwrap()),
        ["main"]
    );
}

#[test]
fn test_combinators_may_look_outside_the_subtree() {
    let tree = page();
    let list = find(&tree, "list");
    let engine = CssEngine::new();
    let matches = engine.select(&tree, list, "body div li").unwrap();
    assert_eq!(labels(&tree, &matches), ["li1", "li2", "li3"]);
}

#[test]
fn test_removed_nodes_are_not_matched() {
    let mut tree = page();
    let list = find(&tree, "list");
    let _ = tree.remove_subtree(list).unwrap();
    assert!(select(&tree, "li").is_empty());
}

#[test]
fn test_compile_errors_surface_from_select() {
    let tree = page();
    let engine = CssEngine::new();
    assert!(engine.select(&tree, NodeId::ROOT, "div >").is_err());
    assert!(engine.select(&tree, NodeId::ROOT, "").is_err());
}
