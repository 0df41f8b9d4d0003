//! State shared by a document and all of its handles.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use bramble_common::warning::warn_once;
use bramble_dom::{DecodeError, DecodePolicy, DomTree, NodeId};
use bramble_select::SelectorEngine;

use crate::{Error, Result};

pub(crate) struct Store {
    tree: RefCell<DomTree>,
    pub(crate) policy: DecodePolicy,
    pub(crate) engine: Box<dyn SelectorEngine>,
}

impl Store {
    pub(crate) fn new(tree: DomTree, policy: DecodePolicy, engine: Box<dyn SelectorEngine>) -> Self {
        Self {
            tree: RefCell::new(tree),
            policy,
            engine,
        }
    }

    /// Borrow the tree for reading. Borrows never outlive a public call.
    pub(crate) fn tree(&self) -> Ref<'_, DomTree> {
        self.tree.borrow()
    }

    /// Borrow the tree, failing if `id` is no longer in it.
    pub(crate) fn live_tree(&self, id: NodeId) -> Result<Ref<'_, DomTree>> {
        let tree = self.tree.borrow();
        if tree.is_live(id) {
            Ok(tree)
        } else {
            Err(Error::StaleHandle(id))
        }
    }

    /// Run a detachment. The only place the tree is borrowed mutably.
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut DomTree) -> T) -> T {
        f(&mut self.tree.borrow_mut())
    }

    /// Decode stored bytes under the document's policy.
    pub(crate) fn decode(&self, bytes: &[u8]) -> std::result::Result<String, DecodeError> {
        let text = self.policy.decode(bytes)?;
        if self.policy == DecodePolicy::Replace && matches!(text, Cow::Owned(_)) {
            let _ = warn_once("Decode", "invalid UTF-8 replaced with U+FFFD");
        }
        Ok(text.into_owned())
    }
}
