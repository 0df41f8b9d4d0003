//! Selector queries through the document's engine.

use crate::{Error, Node, Result};

impl Node {
    /// Run `query` over the subtree rooted here.
    ///
    /// Matches come back in the order the engine yields them; the bundled
    /// engine yields document order. Whether this node itself can match is
    /// the engine's [`MatchScope`](crate::MatchScope).
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if this position was removed;
    /// [`Error::QueryCompile`] if the engine rejects `query`.
    pub fn css(&self, query: &str) -> Result<Vec<Self>> {
        let ids = {
            let tree = self.store.live_tree(self.id())?;
            self.store
                .engine
                .select(&tree, self.id(), query)
                .map_err(|source| Error::QueryCompile {
                    query: query.to_owned(),
                    source,
                })?
        };
        Ok(ids.into_iter().map(|id| self.wrap(id)).collect())
    }

    /// The first match of `query`, or `default` if there is none.
    ///
    /// # Errors
    ///
    /// [`Error::MultipleMatches`] if `strict` is set and more than one node
    /// matches. Otherwise as for [`Node::css`].
    pub fn css_first(&self, query: &str, default: Option<Self>, strict: bool) -> Result<Option<Self>> {
        let mut matches = self.css(query)?;
        if strict && matches.len() > 1 {
            return Err(Error::MultipleMatches {
                count: matches.len(),
            });
        }
        if matches.is_empty() {
            return Ok(default);
        }
        Ok(Some(matches.swap_remove(0)))
    }

    /// Whether this node itself matches `query`.
    ///
    /// # Errors
    ///
    /// As for [`Node::css`].
    pub fn css_matches(&self, query: &str) -> Result<bool> {
        let tree = self.store.live_tree(self.id())?;
        self.store
            .engine
            .matches(&tree, self.id(), query)
            .map_err(|source| Error::QueryCompile {
                query: query.to_owned(),
                source,
            })
    }
}
