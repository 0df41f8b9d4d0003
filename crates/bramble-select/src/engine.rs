//! Running queries against a subtree.

use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;

use bramble_dom::{DomTree, NodeId};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::SelectorError;
use crate::parser::parse_selector_list;
use crate::selector::SelectorList;

/// Compiled selector lists kept by a [`CssEngine`] unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Whether the element a query runs on can itself be a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchScope {
    /// Only strict descendants, like `Element.querySelectorAll`.
    #[default]
    Descendants,
    /// The query root and its descendants.
    Inclusive,
}

/// Anything that can answer a selector query over a tree.
pub trait SelectorEngine {
    /// Run `query` over the subtree rooted at `root`.
    ///
    /// Results are element ids in document order, each at most once.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if `query` does not compile.
    fn select(
        &self,
        tree: &DomTree,
        root: NodeId,
        query: &str,
    ) -> Result<Vec<NodeId>, SelectorError>;

    /// Whether the node `id` itself matches `query`. Scope plays no part.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if `query` does not compile.
    fn matches(&self, tree: &DomTree, id: NodeId, query: &str) -> Result<bool, SelectorError>;
}

/// The bundled engine: compiles with [`parse_selector_list`], caches the
/// result, and matches by walking the subtree in document order.
pub struct CssEngine {
    scope: MatchScope,
    cache: Option<RefCell<LruCache<String, Rc<SelectorList>>>>,
}

impl CssEngine {
    /// An engine with the default scope and cache size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(MatchScope::default(), DEFAULT_CACHE_CAPACITY)
    }

    /// An engine with the given scope, caching up to `cache_capacity`
    /// compiled queries. Zero disables the cache.
    #[must_use]
    pub fn with_options(scope: MatchScope, cache_capacity: usize) -> Self {
        Self {
            scope,
            cache: NonZeroUsize::new(cache_capacity).map(|cap| RefCell::new(LruCache::new(cap))),
        }
    }

    /// The scope this engine matches with.
    #[must_use]
    pub const fn scope(&self) -> MatchScope {
        self.scope
    }

    /// Number of compiled queries currently cached.
    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.borrow().len())
    }

    /// Compile `query`, reusing a cached result when there is one.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if `query` does not compile. Failures
    /// are not cached.
    pub fn compile(&self, query: &str) -> Result<Rc<SelectorList>, SelectorError> {
        let Some(cache) = &self.cache else {
            return parse_selector_list(query).map(Rc::new);
        };

        if let Some(hit) = cache.borrow_mut().get(query) {
            return Ok(Rc::clone(hit));
        }

        let compiled = Rc::new(parse_selector_list(query)?);
        let _ = cache.borrow_mut().put(query.to_owned(), Rc::clone(&compiled));
        Ok(compiled)
    }
}

impl Default for CssEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CssEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssEngine")
            .field("scope", &self.scope)
            .field(
                "cache_capacity",
                &self.cache.as_ref().map(|cache| cache.borrow().cap()),
            )
            .finish()
    }
}

impl SelectorEngine for CssEngine {
    fn select(
        &self,
        tree: &DomTree,
        root: NodeId,
        query: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = self.compile(query)?;
        let own = (self.scope == MatchScope::Inclusive).then_some(root);

        Ok(own
            .into_iter()
            .chain(tree.descendants(root))
            .filter(|&id| list.matches_in_tree(tree, id))
            .collect())
    }

    fn matches(&self, tree: &DomTree, id: NodeId, query: &str) -> Result<bool, SelectorError> {
        Ok(self.compile(query)?.matches_in_tree(tree, id))
    }
}
