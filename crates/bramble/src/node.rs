//! The node handle: identity, navigation, attributes, markup and removal.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use bramble_dom::NodeId;

use crate::store::Store;
use crate::Result;

/// Decoded attributes of one element. `None` marks an attribute written
/// without a value, which is different from `Some("")`.
pub type Attributes = HashMap<String, Option<String>>;

/// A handle to one position in a [`Document`](crate::Document).
///
/// Cloning is cheap and every clone names the same position. Two handles
/// are equal when they come from the same document and name the same
/// position.
///
/// Once the position is decomposed, every operation on the handle other
/// than [`Node::id`] and [`Node::is_live`] returns
/// [`Error::StaleHandle`](crate::Error::StaleHandle). Removal can also happen through another handle,
/// or through a handle to an ancestor.
#[derive(Clone)]
pub struct Node {
    pub(crate) store: Rc<Store>,
    id: NodeId,
}

impl Node {
    pub(crate) const fn new(store: Rc<Store>, id: NodeId) -> Self {
        Self { store, id }
    }

    /// Another handle into the same document.
    pub(crate) fn wrap(&self, id: NodeId) -> Self {
        Self::new(Rc::clone(&self.store), id)
    }

    /// The generation-checked id of this position.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the position still exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.store.tree().is_live(self.id)
    }

    fn link(&self, pick: impl FnOnce(&bramble_dom::Node) -> Option<NodeId>) -> Result<Option<Self>> {
        let tree = self.store.live_tree(self.id)?;
        Ok(tree.get(self.id).and_then(pick).map(|id| self.wrap(id)))
    }

    /// [§ 4.4 parent](https://dom.spec.whatwg.org/#concept-tree-parent)
    ///
    /// Top-level nodes have the document root as parent; the root and
    /// nodes orphaned by a non-recursive decompose have none.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn parent(&self) -> Result<Option<Self>> {
        self.link(|n| n.parent)
    }

    /// The next sibling of any kind, text included.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn next(&self) -> Result<Option<Self>> {
        self.link(|n| n.next_sibling)
    }

    /// The previous sibling of any kind, text included.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn prev(&self) -> Result<Option<Self>> {
        self.link(|n| n.prev_sibling)
    }

    /// The first child of any kind, text included.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn child(&self) -> Result<Option<Self>> {
        self.link(|n| n.children.first().copied())
    }

    /// The last child of any kind, text included.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn last_child(&self) -> Result<Option<Self>> {
        self.link(|n| n.children.last().copied())
    }

    /// The tag name as stored for elements, `-text` for text nodes,
    /// `!comment` for comments, and `None` for the document root.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed;
    /// [`Error::Decode`](crate::Error::Decode) if the name is not UTF-8 under a strict policy.
    pub fn tag(&self) -> Result<Option<String>> {
        let tree = self.store.live_tree(self.id)?;
        Ok(tree
            .get(self.id)
            .and_then(|n| n.node_type.tag_name())
            .map(|name| self.store.decode(name))
            .transpose()?)
    }

    /// Whether this is an element.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn is_element(&self) -> Result<bool> {
        let tree = self.store.live_tree(self.id)?;
        Ok(tree.get(self.id).is_some_and(|n| n.node_type.is_element()))
    }

    /// Whether this is a text node.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed.
    pub fn is_text(&self) -> Result<bool> {
        let tree = self.store.live_tree(self.id)?;
        Ok(tree.get(self.id).is_some_and(|n| n.node_type.is_text()))
    }

    /// Decode every attribute into a fresh map. With duplicate names the
    /// later one wins. Non-elements have no attributes.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed;
    /// [`Error::Decode`](crate::Error::Decode) under a strict policy.
    pub fn attributes(&self) -> Result<Attributes> {
        let tree = self.store.live_tree(self.id)?;
        let mut map = HashMap::new();
        if let Some(element) = tree.as_element(self.id) {
            for attr in &element.attrs {
                let value = attr
                    .value
                    .as_deref()
                    .map(|v| self.store.decode(v))
                    .transpose()?;
                let _ = map.insert(self.store.decode(&attr.name)?, value);
            }
        }
        Ok(map)
    }

    /// Look up one attribute by its exact stored name.
    ///
    /// `None` if absent, `Some(None)` if present without a value.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was removed;
    /// [`Error::Decode`](crate::Error::Decode) under a strict policy.
    #[allow(clippy::option_option)]
    pub fn get_attribute(&self, name: &str) -> Result<Option<Option<String>>> {
        let tree = self.store.live_tree(self.id)?;
        let Some(value) = tree
            .as_element(self.id)
            .and_then(|element| element.attr(name.as_bytes()))
        else {
            return Ok(None);
        };
        Ok(Some(value.map(|v| self.store.decode(v)).transpose()?))
    }

    /// Serialize this position and its descendants to markup.
    ///
    /// `None` when there is nothing to show: the position was removed, or
    /// it serializes to nothing (an empty document).
    ///
    /// # Errors
    ///
    /// [`Error::Decode`](crate::Error::Decode) if the markup is not UTF-8 under a strict policy.
    pub fn html(&self) -> Result<Option<String>> {
        let tree = self.store.tree();
        let Ok(markup) = tree.serialize(self.id) else {
            return Ok(None);
        };
        if markup.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.store.decode(&markup)?))
    }

    /// Remove this position from the tree.
    ///
    /// With `recursive` the whole subtree goes. Without it only this node
    /// goes and its children take its place under its parent, in order.
    /// Handles to every removed position become stale; all other handles
    /// keep working.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position was already removed.
    pub fn decompose(&self, recursive: bool) -> Result<()> {
        let _ = self.store.mutate(|tree| {
            if recursive {
                tree.remove_subtree(self.id)
            } else {
                tree.remove_node(self.id)
            }
        })?;
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.store, &other.store)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.store.tree();
        let kind = tree
            .get(self.id)
            .and_then(|n| n.node_type.tag_name())
            .map(String::from_utf8_lossy);
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("tag", &kind)
            .finish()
    }
}
