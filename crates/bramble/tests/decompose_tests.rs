//! Tests for decompose and the handles it invalidates.

use bramble::{Document, DocumentOptions, DomTree, Error, Node, NodeId};

const FEED: &str = r#"{"type": "document", "children": [
  {"type": "element", "tag": "main", "children": [
    {"type": "element", "tag": "script", "children": [{"type": "text", "text": "track()"}]},
    {"type": "element", "tag": "article", "attributes": [["id", "post"]], "children": [
      {"type": "element", "tag": "h1", "children": [{"type": "text", "text": "Title"}]},
      {"type": "element", "tag": "div", "attributes": [["class", "wrap"]], "children": [
        {"type": "element", "tag": "p", "children": [{"type": "text", "text": "a"}]},
        {"type": "text", "text": "b"},
        {"type": "element", "tag": "script", "children": [{"type": "text", "text": "ad()"}]}
      ]}
    ]},
    {"type": "element", "tag": "footer", "children": [{"type": "text", "text": "end"}]}
  ]}
]}"#;

fn feed() -> Document {
    Document::from_json(FEED, &DocumentOptions::default()).unwrap()
}

fn find(doc: &Document, query: &str) -> Node {
    doc.css_first(query, None, true).unwrap().unwrap()
}

fn tags(nodes: impl IntoIterator<Item = Node>) -> Vec<String> {
    nodes
        .into_iter()
        .map(|n| n.tag().unwrap().unwrap_or_default())
        .collect()
}

fn assert_stale(node: &Node) {
    assert!(!node.is_live());
    assert!(matches!(node.parent(), Err(Error::StaleHandle(id)) if id == node.id()));
    assert!(matches!(node.next(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.prev(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.child(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.last_child(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.tag(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.attributes(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.text(true, "", false), Err(Error::StaleHandle(_))));
    assert!(matches!(node.iter(), Err(Error::StaleHandle(_))));
    assert!(matches!(node.decompose(true), Err(Error::StaleHandle(_))));
}

// ========== recursive ==========

#[test]
fn test_recursive_decompose_invalidates_the_subtree() {
    let doc = feed();
    let article = find(&doc, "#post");
    let h1 = find(&doc, "h1");
    let p = find(&doc, "p");
    let footer = find(&doc, "footer");

    article.decompose(true).unwrap();

    for node in [&article, &h1, &p] {
        assert_stale(node);
    }
    assert!(footer.is_live());
    assert_eq!(tags(find(&doc, "main").iter().unwrap()), ["script", "footer"]);
    assert_eq!(doc.text(true, "", false).unwrap(), "track()end");
}

#[test]
fn test_siblings_relink_around_removed_node() {
    let doc = feed();
    let script = find(&doc, "main > script");
    let footer = find(&doc, "footer");

    find(&doc, "#post").decompose(true).unwrap();

    assert_eq!(script.next().unwrap(), Some(footer.clone()));
    assert_eq!(footer.prev().unwrap(), Some(script));
}

#[test]
fn test_html_of_removed_node_is_none() {
    let doc = feed();
    let p = find(&doc, "p");
    assert_eq!(p.html().unwrap().as_deref(), Some("<p>a</p>"));
    p.decompose(true).unwrap();
    assert_eq!(p.html().unwrap(), None);
}

#[test]
fn test_decomposing_twice_fails() {
    let doc = feed();
    let footer = find(&doc, "footer");
    footer.decompose(true).unwrap();
    assert!(matches!(
        footer.decompose(false),
        Err(Error::StaleHandle(id)) if id == footer.id()
    ));
}

#[test]
fn test_clones_share_staleness() {
    let doc = feed();
    let footer = find(&doc, "footer");
    let copy = footer.clone();
    footer.decompose(true).unwrap();
    assert_stale(&copy);
}

// ========== non-recursive ==========

#[test]
fn test_shallow_decompose_keeps_children_in_place() {
    let doc = feed();
    let wrap = find(&doc, ".wrap");
    let article = find(&doc, "#post");
    let p = find(&doc, "p");

    wrap.decompose(false).unwrap();

    assert!(!wrap.is_live());
    assert!(p.is_live());
    assert_eq!(p.parent().unwrap(), Some(article.clone()));
    assert_eq!(tags(article.iter().unwrap()), ["h1", "p", "script"]);
    assert_eq!(article.text(true, "", false).unwrap(), "Titleabad()");
    assert_eq!(
        article.html().unwrap().as_deref(),
        Some("<article id=\"post\"><h1>Title</h1><p>a</p>b<script>ad()</script></article>")
    );
}

#[test]
fn test_shallow_decompose_of_leaf() {
    let doc = feed();
    let p = find(&doc, "p");
    let text = p.child().unwrap().unwrap();
    text.decompose(false).unwrap();
    assert!(p.child().unwrap().is_none());
    assert_eq!(p.html().unwrap().as_deref(), Some("<p></p>"));
}

// ========== whole document ==========

#[test]
fn test_decomposing_the_root_invalidates_everything() {
    let doc = feed();
    let root = doc.root();
    let main = find(&doc, "main");

    root.decompose(true).unwrap();

    assert_stale(&root);
    assert_stale(&main);
    assert!(doc.document_element().is_none());
    assert_eq!(doc.html().unwrap(), None);
    assert!(matches!(doc.css("main"), Err(Error::StaleHandle(_))));
}

#[test]
fn test_empty_document_has_no_markup() {
    let doc = Document::new(DomTree::new());
    assert_eq!(doc.html().unwrap(), None);
    assert_eq!(doc.text(true, ",", true).unwrap(), "");
    assert!(doc.root().iter().unwrap().next().is_none());
}

#[test]
fn test_emptied_node_has_no_markup_but_stays_live() {
    let doc = feed();
    let main = find(&doc, "main");
    let children: Vec<Node> = main.iter().unwrap().collect();
    for child in children {
        child.decompose(true).unwrap();
    }
    assert!(main.is_live());
    assert_eq!(main.html().unwrap().as_deref(), Some("<main></main>"));
    assert_eq!(doc.root().child().unwrap(), Some(main));
}

// ========== iterators across mutation ==========

#[test]
fn test_children_iterator_stops_after_mutation() {
    let doc = feed();
    let main = find(&doc, "main");
    let mut children = main.iter().unwrap();

    let script = children.next().unwrap();
    script.decompose(true).unwrap();

    assert!(children.next().is_none());
    assert!(children.next().is_none());
    assert_eq!(tags(main.iter().unwrap()), ["article", "footer"]);
}

#[test]
fn test_descendants_iterator_stops_after_mutation() {
    let doc = feed();
    let mut walk = doc.root().descendants(false).unwrap();
    let _ = walk.next();
    find(&doc, "footer").decompose(true).unwrap();
    assert!(walk.next().is_none());
}

#[test]
fn test_decompose_while_collecting_matches() {
    let doc = feed();
    let scripts = doc.css("script").unwrap();
    assert_eq!(scripts.len(), 2);
    for script in &scripts {
        script.decompose(true).unwrap();
    }
    assert!(doc.css("script").unwrap().is_empty());
    assert_eq!(doc.text(true, "", false).unwrap(), "Titleabend");
}

// ========== strip_tags ==========

#[test]
fn test_strip_tags_counts_removed_elements() {
    let doc = feed();
    assert_eq!(doc.strip_tags(&["SCRIPT", "h1"], true).unwrap(), 3);
    assert!(doc.css("script, h1").unwrap().is_empty());
    assert_eq!(doc.strip_tags(&["script"], true).unwrap(), 0);
}

#[test]
fn test_strip_tags_skips_matches_removed_with_an_ancestor() {
    let doc = feed();
    assert_eq!(doc.strip_tags(&["article", "p"], true).unwrap(), 1);
    assert!(doc.css("p").unwrap().is_empty());

    let doc = feed();
    assert_eq!(doc.strip_tags(&["article", "p"], false).unwrap(), 2);
    assert_eq!(doc.text(true, "", false).unwrap(), "track()Titleabad()end");
}

// ========== deep trees ==========

#[test]
fn test_decompose_very_deep_tree() {
    const DEPTH: usize = 100_000;
    let mut tree = DomTree::new();
    let mut parent = NodeId::ROOT;
    let mut first = None;
    for _ in 0..DEPTH {
        let div = tree.create_element("div");
        tree.append_child(parent, div).unwrap();
        let _ = first.get_or_insert(div);
        parent = div;
    }

    let doc = Document::new(tree);
    let top = doc.root().child().unwrap().unwrap();
    assert_eq!(Some(top.id()), first);
    top.decompose(true).unwrap();
    assert!(doc.root().child().unwrap().is_none());
    assert_eq!(doc.html().unwrap(), None);
}
