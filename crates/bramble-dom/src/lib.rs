//! Tree store for parsed HTML documents.
//!
//! This crate owns the node arena that the `bramble` node layer navigates.
//! It follows the tree model of the
//! [DOM Living Standard](https://dom.spec.whatwg.org/) closely enough for
//! navigation, extraction and querying, and no further.
//!
//! # Design
//!
//! All nodes live in one vector of slots and refer to each other through
//! [`NodeId`] values. A `NodeId` carries the slot index *and* the slot's
//! generation. Removing a node drops its payload and bumps the generation,
//! so every id issued for it before the removal stops resolving: lookups
//! return `None` instead of reaching freed or recycled storage. Slots are
//! never reused.
//!
//! Names, attribute values and character data are stored as the raw bytes
//! the parser produced. Decoding is left to the reader, under a
//! [`DecodePolicy`].

/// Byte decoding under a configurable error policy.
pub mod decode;
/// Subtree serialization back to markup.
pub mod serialize;
/// JSON snapshots of whole trees.
pub mod snapshot;

pub use decode::{DecodeError, DecodePolicy};
pub use snapshot::SnapshotNode;

use std::fmt;

use thiserror::Error;

/// Result alias for tree store operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors reported by the tree store.
#[derive(Debug, Error)]
pub enum DomError {
    /// The id names a position that has been removed from the tree.
    #[error("node {0} has been removed from the tree")]
    StaleNode(NodeId),

    /// A JSON snapshot could not be read or written.
    #[error("invalid tree snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// [§ 4.2.3 Pre-insert validity](https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity)
    ///
    /// `child` is `parent` itself or one of its ancestors, so inserting it
    /// would close a cycle.
    #[error("cannot insert node {child} under its own descendant {parent}")]
    Hierarchy {
        /// The would-be parent.
        parent: NodeId,
        /// The node being inserted.
        child: NodeId,
    },
}

/// A generation-checked index into the tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// Two ids are equal only if they name the same slot in the same
/// generation, so an id held across a removal never aliases anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self {
        index: 0,
        generation: 0,
    };

    /// Slot index of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Slot generation this id was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// Stores ids for parent/child/sibling relationships, enabling O(1)
/// traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,
}

impl Node {
    const fn detached(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// The synthetic document root. It has no tag name.
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    /// Raw character data as produced by the parser.
    Text(Vec<u8>),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(Vec<u8>),
}

impl NodeType {
    /// Canonical name for this kind of node, as raw bytes.
    ///
    /// Elements report their stored tag name, text nodes `-text` and
    /// comments `!comment`. The document root has no name.
    #[must_use]
    pub fn tag_name(&self) -> Option<&[u8]> {
        match self {
            Self::Element(data) => Some(data.tag_name.as_slice()),
            Self::Text(_) => Some(&b"-text"[..]),
            Self::Comment(_) => Some(&b"!comment"[..]),
            Self::Document => None,
        }
    }

    /// Whether this is the text kind.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Whether this is the element kind.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }
}

/// One entry of an element's attribute list.
///
/// `value` is `None` for an attribute written without `=` (`<input disabled>`),
/// which is distinct from `Some(vec![])` (`<input value="">`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, case as stored.
    pub name: Vec<u8>,
    /// Attribute value, if one was given.
    pub value: Option<Vec<u8>>,
}

impl Attribute {
    /// Create an attribute from a name and an optional value.
    pub fn new(name: impl Into<Vec<u8>>, value: Option<impl Into<Vec<u8>>>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }
}

/// Element-specific data.
///
/// The attribute list keeps source order and duplicates; readers that build
/// a map let the later entry win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: Vec<u8>,
    /// "An element has an associated attribute list"
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    /// Look up an attribute by exact name.
    ///
    /// The outer `Option` is presence, the inner one the value. With
    /// duplicate names the last entry wins.
    #[must_use]
    #[allow(clippy::option_option)]
    pub fn attr(&self, name: &[u8]) -> Option<Option<&[u8]>> {
        self.attrs
            .iter()
            .rev()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref())
    }

    /// Whether an attribute with this name is present, with or without a value.
    #[must_use]
    pub fn has_attr(&self, name: &[u8]) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&[u8]> {
        self.attr(b"id").flatten()
    }

    /// Whether the class attribute contains `class_name` as a whitespace-separated token.
    #[must_use]
    pub fn has_class(&self, class_name: &[u8]) -> bool {
        self.attr(b"class")
            .flatten()
            .is_some_and(|list| list.split(u8::is_ascii_whitespace).any(|c| c == class_name))
    }
}

/// One arena slot. `node` is `None` once the position has been removed.
#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based document tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All slots, indexed by `NodeId::index`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    slots: Vec<Slot>,
    /// Number of slots still holding a node.
    live: usize,
    /// Bumped by every detachment.
    mutation_epoch: u64,
}

impl DomTree {
    /// Create a new tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::detached(NodeType::Document)),
            }],
            live: 1,
            mutation_epoch: 0,
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID, or `None` if the id is stale.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Whether `id` still names a node in this tree.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Like [`get`](Self::get), but reports a stale id as an error.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `id` has been removed.
    pub fn try_get(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(DomError::StaleNode(id))
    }

    /// Number of live nodes in the tree, including the document.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree has no live nodes (only after removing the document).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Counter bumped by every detachment.
    ///
    /// Cursors that follow sibling links compare it against the value they
    /// started with to notice structural changes.
    #[must_use]
    pub const fn mutation_epoch(&self) -> u64 {
        self.mutation_epoch
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId {
            index: self.slots.len(),
            generation: 0,
        };
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node::detached(node_type)),
        });
        self.live += 1;
        id
    }

    /// Allocate an element with no attributes.
    pub fn create_element(&mut self, tag_name: impl Into<Vec<u8>>) -> NodeId {
        self.alloc(NodeType::Element(ElementData {
            tag_name: tag_name.into(),
            attrs: Vec::new(),
        }))
    }

    /// Allocate a text node holding raw character data.
    pub fn create_text(&mut self, data: impl Into<Vec<u8>>) -> NodeId {
        self.alloc(NodeType::Text(data.into()))
    }

    /// Allocate a comment node.
    pub fn create_comment(&mut self, data: impl Into<Vec<u8>>) -> NodeId {
        self.alloc(NodeType::Comment(data.into()))
    }

    /// Append an attribute to an element's list, after any existing entries.
    ///
    /// Non-element nodes are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `id` has been removed.
    pub fn push_attribute(&mut self, id: NodeId, attribute: Attribute) -> Result<()> {
        let node = self.get_mut(id).ok_or(DomError::StaleNode(id))?;
        if let NodeType::Element(data) = &mut node.node_type {
            data.attrs.push(attribute);
        }
        Ok(())
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, updating all
    /// relationships. A child that already has a parent is moved.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if either id has been removed, and
    /// [`DomError::Hierarchy`] if `child` is `parent` or an ancestor of it.
    /// The tree is unchanged on error.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let _ = self.try_get(parent)?;
        let _ = self.try_get(child)?;
        if child == parent || self.is_descendant_of(parent, child) {
            return Err(DomError::Hierarchy { parent, child });
        }
        self.unlink(child);

        let prev_last_child = self.last_child(parent);
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev_last_child;
        }
        if let Some(prev_id) = prev_last_child
            && let Some(prev) = self.get_mut(prev_id)
        {
            prev.next_sibling = Some(child);
        }
        Ok(())
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node (empty for stale ids).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Iterate over every descendant of `id` in document order, excluding
    /// `id` itself. Walks links only; no recursion, no auxiliary stack.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// The node after `id` in a pre-order walk confined to the subtree of
    /// `root`: first child, else next sibling, else the next sibling of the
    /// nearest ancestor below `root` that has one.
    #[must_use]
    pub fn next_in_preorder(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get raw character data if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&[u8]> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(data) => Some(data.as_slice()),
            _ => None,
        })
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.first_child_named(&[&b"body"[..], &b"frameset"[..]])
    }

    /// [§ 3.1.4 The head element](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    ///
    /// "The head element of a document is the first head element that is a
    /// child of the html element, if there is one, or null otherwise."
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.first_child_named(&[&b"head"[..]])
    }

    fn first_child_named(&self, names: &[&[u8]]) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id).is_some_and(|e| {
                    names.iter().any(|name| e.tag_name.eq_ignore_ascii_case(name))
                })
            })
            .copied()
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Detach `id` and destroy it together with all of its descendants.
    /// Every id naming a destroyed position stops resolving.
    ///
    /// Returns the number of positions destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `id` has already been removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize> {
        let _ = self.try_get(id)?;
        self.unlink(id);

        let mut doomed = vec![id];
        let mut destroyed = 0;
        while let Some(current) = doomed.pop() {
            if let Some(node) = self.tombstone(current) {
                doomed.extend(node.children);
                destroyed += 1;
            }
        }
        self.mutation_epoch += 1;
        self.trace_removal(id, destroyed);
        Ok(destroyed)
    }

    /// Destroy `id` alone.
    ///
    /// Its children take its place under its parent, in their original
    /// order. If `id` had no parent its children become parentless roots.
    /// Only ids naming `id` itself stop resolving.
    ///
    /// Returns the number of positions destroyed (always 1).
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `id` has already been removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<usize> {
        let node = self.try_get(id)?;
        let parent = node.parent;
        let orphans = node.children.clone();

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.get_mut(parent_id)
                && let Some(position) = parent_node.children.iter().position(|&c| c == id)
            {
                let _ = parent_node
                    .children
                    .splice(position..=position, orphans.iter().copied());
            }
            for &child in &orphans {
                if let Some(node) = self.get_mut(child) {
                    node.parent = Some(parent_id);
                }
            }
            self.relink_children(parent_id);
        } else {
            for &child in &orphans {
                if let Some(node) = self.get_mut(child) {
                    node.parent = None;
                    node.prev_sibling = None;
                    node.next_sibling = None;
                }
            }
        }

        let _ = self.tombstone(id);
        self.mutation_epoch += 1;
        self.trace_removal(id, 1);
        Ok(1)
    }

    /// Take `id` out of its parent's child list and repair sibling links.
    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let parent = node.parent.take();
        let prev = node.prev_sibling.take();
        let next = node.next_sibling.take();

        if let Some(parent_id) = parent
            && let Some(parent_node) = self.get_mut(parent_id)
        {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(prev_id) = prev
            && let Some(prev_node) = self.get_mut(prev_id)
        {
            prev_node.next_sibling = next;
        }
        if let Some(next_id) = next
            && let Some(next_node) = self.get_mut(next_id)
        {
            next_node.prev_sibling = prev;
        }
    }

    /// Recompute prev/next links for all children of `parent`.
    fn relink_children(&mut self, parent: NodeId) {
        let children = self.children(parent).to_vec();
        for (position, &child) in children.iter().enumerate() {
            if let Some(node) = self.get_mut(child) {
                node.prev_sibling = position.checked_sub(1).map(|p| children[p]);
                node.next_sibling = children.get(position + 1).copied();
            }
        }
    }

    /// Drop the payload of `id`'s slot and bump its generation.
    fn tombstone(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        Some(node)
    }

    #[cfg(feature = "mutation-trace")]
    #[allow(clippy::unused_self)]
    fn trace_removal(&self, id: NodeId, destroyed: usize) {
        eprintln!(
            "[mutation] removed {id} ({destroyed} slot(s) invalidated, epoch {})",
            self.mutation_epoch
        );
    }

    #[cfg(not(feature = "mutation-trace"))]
    #[allow(clippy::unused_self)]
    const fn trace_removal(&self, _id: NodeId, _destroyed: usize) {}
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.next_in_preorder(id, self.root);
        Some(id)
    }
}
