//! Lazy child and descendant iteration.
//!
//! Both iterators hold a handle to the document, not a borrow of the tree,
//! so the tree can be changed while one is alive. Each records the tree's
//! mutation epoch when created and ends for good as soon as it sees the
//! epoch move: after a decompose the links it would follow next may point
//! into removed positions.

use std::iter::FusedIterator;
use std::rc::Rc;

use bramble_dom::NodeId;

use crate::store::Store;
use crate::{Node, Result};

/// Non-text children of a node, left to right. See [`Node::iter`].
pub struct Children {
    store: Rc<Store>,
    next: Option<NodeId>,
    epoch: u64,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let tree = self.store.tree();
        if tree.mutation_epoch() != self.epoch {
            self.next = None;
            return None;
        }

        while let Some(id) = self.next {
            self.next = tree.next_sibling(id);
            if tree.get(id).is_some_and(|n| !n.node_type.is_text()) {
                return Some(Node::new(Rc::clone(&self.store), id));
            }
        }
        None
    }
}

impl FusedIterator for Children {}

/// Every node below a position in document order. See [`Node::descendants`].
pub struct Descendants {
    store: Rc<Store>,
    root: NodeId,
    next: Option<NodeId>,
    epoch: u64,
    include_text: bool,
}

impl Iterator for Descendants {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let tree = self.store.tree();
        if tree.mutation_epoch() != self.epoch {
            self.next = None;
            return None;
        }

        while let Some(id) = self.next {
            self.next = tree.next_in_preorder(id, self.root);
            if self.include_text || tree.get(id).is_some_and(|n| !n.node_type.is_text()) {
                return Some(Node::new(Rc::clone(&self.store), id));
            }
        }
        None
    }
}

impl FusedIterator for Descendants {}

impl Node {
    /// Iterate over the direct children that are not text nodes.
    ///
    /// Every call starts a fresh walk from the current first child. The
    /// iterator ends early if the tree is changed while it is in use.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position
    /// was removed.
    #[allow(clippy::iter_not_returning_iterator)]
    pub fn iter(&self) -> Result<Children> {
        let tree = self.store.live_tree(self.id())?;
        Ok(Children {
            store: Rc::clone(&self.store),
            next: tree.first_child(self.id()),
            epoch: tree.mutation_epoch(),
        })
    }

    /// Iterate over everything below this position in document order,
    /// leaving out text nodes unless `include_text` is set.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position
    /// was removed.
    pub fn descendants(&self, include_text: bool) -> Result<Descendants> {
        let tree = self.store.live_tree(self.id())?;
        Ok(Descendants {
            store: Rc::clone(&self.store),
            root: self.id(),
            next: tree.first_child(self.id()),
            epoch: tree.mutation_epoch(),
            include_text,
        })
    }
}
