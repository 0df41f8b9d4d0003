//! Text extraction.

use bramble_dom::{NodeId, NodeType};

use crate::{Node, Result, TextOptions};

impl Node {
    /// Concatenate the text nodes under this position.
    ///
    /// Shallow extraction reads direct children only. Deep extraction reads
    /// every descendant in document order: a node's own text, then its
    /// children, then its following siblings. The position's own data is
    /// never included, so deep text of a text node is empty.
    ///
    /// Each fragment is trimmed when `strip` is set and then followed by
    /// `separator`, so `[" a ", "b "]` with `","` gives `"a,b,"`. Empty
    /// fragments still get their separator.
    ///
    /// The walk follows sibling and parent links, so arbitrarily deep
    /// trees do not grow the call stack.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position
    /// was removed; [`Error::Decode`](crate::Error::Decode) if a fragment
    /// is not UTF-8 under a strict policy.
    pub fn text(&self, deep: bool, separator: &str, strip: bool) -> Result<String> {
        let tree = self.store.live_tree(self.id())?;
        let mut out = String::new();

        let mut append = |id: NodeId| -> Result<()> {
            if let Some(raw) = tree.as_text(id) {
                let fragment = self.store.decode(raw)?;
                out.push_str(if strip { fragment.trim() } else { &fragment });
                out.push_str(separator);
            }
            Ok(())
        };

        if deep {
            for id in tree.descendants(self.id()) {
                append(id)?;
            }
        } else {
            for &id in tree.children(self.id()) {
                append(id)?;
            }
        }

        Ok(out)
    }

    /// [`Node::text`] with its arguments taken from `options`.
    ///
    /// # Errors
    ///
    /// As for [`Node::text`].
    pub fn text_with(&self, options: &TextOptions) -> Result<String> {
        self.text(options.deep, &options.separator, options.strip)
    }

    /// The decoded data of a text or comment node itself. `None` for
    /// elements and the document root.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) if this position
    /// was removed; [`Error::Decode`](crate::Error::Decode) under a strict
    /// policy.
    pub fn text_content(&self) -> Result<Option<String>> {
        let tree = self.store.live_tree(self.id())?;
        let data = match tree.get(self.id()).map(|n| &n.node_type) {
            Some(NodeType::Text(data) | NodeType::Comment(data)) => data,
            _ => return Ok(None),
        };
        Ok(Some(self.store.decode(data)?))
    }
}
