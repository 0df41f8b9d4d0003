//! The owning side: a tree plus the policy and engine its handles use.

use std::fmt;
use std::rc::Rc;

use bramble_dom::{DecodePolicy, DomTree, NodeId};
use bramble_select::{CssEngine, SelectorEngine};

use crate::store::Store;
use crate::{DocumentOptions, Node, Result};

/// A parsed document and the entry point for handing out [`Node`]s.
///
/// Cloning shares the same tree. The tree lives as long as the document or
/// any handle into it.
#[derive(Clone)]
pub struct Document {
    store: Rc<Store>,
}

impl Document {
    /// Wrap `tree` with default options.
    #[must_use]
    pub fn new(tree: DomTree) -> Self {
        Self::with_options(tree, &DocumentOptions::default())
    }

    /// Wrap `tree`, querying through a [`CssEngine`] configured from `options`.
    #[must_use]
    pub fn with_options(tree: DomTree, options: &DocumentOptions) -> Self {
        let engine = CssEngine::with_options(options.match_scope, options.query_cache_capacity);
        Self::with_engine(tree, options.decode_policy, engine)
    }

    /// Wrap `tree` with a caller-supplied selector engine.
    #[must_use]
    pub fn with_engine(
        tree: DomTree,
        decode_policy: DecodePolicy,
        engine: impl SelectorEngine + 'static,
    ) -> Self {
        Self {
            store: Rc::new(Store::new(tree, decode_policy, Box::new(engine))),
        }
    }

    /// Build a document from a JSON tree snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::Snapshot`](crate::Error::Snapshot) if `json` is not a valid
    /// snapshot.
    pub fn from_json(json: &str, options: &DocumentOptions) -> Result<Self> {
        let tree = DomTree::from_json(json)?;
        Ok(Self::with_options(tree, options))
    }

    /// Handle to the document root.
    #[must_use]
    pub fn root(&self) -> Node {
        self.node(NodeId::ROOT)
    }

    /// [§ 3.1.1](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    /// The first element child of the root.
    #[must_use]
    pub fn document_element(&self) -> Option<Node> {
        let id = self.store.tree().document_element()?;
        Some(self.node(id))
    }

    /// [§ 3.1.4](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    /// The first `<head>` child of the document element.
    #[must_use]
    pub fn head(&self) -> Option<Node> {
        let id = self.store.tree().head()?;
        Some(self.node(id))
    }

    /// [§ 3.1.3](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    /// The first `<body>` or `<frameset>` child of the document element.
    #[must_use]
    pub fn body(&self) -> Option<Node> {
        let id = self.store.tree().body()?;
        Some(self.node(id))
    }

    /// The decode policy every handle reads with.
    #[must_use]
    pub fn decode_policy(&self) -> DecodePolicy {
        self.store.policy
    }

    /// [`Node::css`] on the root.
    ///
    /// # Errors
    ///
    /// As for [`Node::css`].
    pub fn css(&self, query: &str) -> Result<Vec<Node>> {
        self.root().css(query)
    }

    /// [`Node::css_first`] on the root.
    ///
    /// # Errors
    ///
    /// As for [`Node::css_first`].
    pub fn css_first(&self, query: &str, default: Option<Node>, strict: bool) -> Result<Option<Node>> {
        self.root().css_first(query, default, strict)
    }

    /// [`Node::text`] on the root.
    ///
    /// # Errors
    ///
    /// As for [`Node::text`].
    pub fn text(&self, deep: bool, separator: &str, strip: bool) -> Result<String> {
        self.root().text(deep, separator, strip)
    }

    /// Markup of the whole document; `None` if it is empty.
    ///
    /// # Errors
    ///
    /// As for [`Node::html`].
    pub fn html(&self) -> Result<Option<String>> {
        self.root().html()
    }

    /// Decompose every element whose tag name (ASCII case-insensitive) is
    /// in `tags`. Returns how many elements were removed; with `recursive`,
    /// matches nested inside an earlier match go with it and are not
    /// counted.
    ///
    /// # Errors
    ///
    /// Propagates a failed decompose, which leaves earlier removals in place.
    pub fn strip_tags(&self, tags: &[&str], recursive: bool) -> Result<usize> {
        let doomed: Vec<NodeId> = {
            let tree = self.store.tree();
            tree.descendants(NodeId::ROOT)
                .filter(|&id| {
                    tree.as_element(id).is_some_and(|element| {
                        tags.iter()
                            .any(|tag| element.tag_name.eq_ignore_ascii_case(tag.as_bytes()))
                    })
                })
                .collect()
        };

        let mut removed = 0;
        for node in doomed.into_iter().map(|id| self.node(id)) {
            if node.is_live() {
                node.decompose(recursive)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn node(&self, id: NodeId) -> Node {
        Node::new(Rc::clone(&self.store), id)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.store.tree().len())
            .field("decode_policy", &self.store.policy)
            .finish_non_exhaustive()
    }
}
