//! Node layer errors.

use bramble_dom::{DecodeError, DomError, NodeId};
use bramble_select::SelectorError;
use thiserror::Error;

/// Convenience alias for results carrying [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a node operation can fail with.
///
/// Structural absence (no parent, no match, no markup) is never an error;
/// those operations return `Option`.
#[derive(Debug, Error)]
pub enum Error {
    /// The handle's position was removed by a decompose.
    #[error("node {0} has been removed from its document")]
    StaleHandle(NodeId),

    /// Stored bytes are not valid UTF-8 and the document decodes strictly.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A strict `css_first` found more than one match.
    #[error("expected at most one match, found {count}")]
    MultipleMatches {
        /// How many matches there were.
        count: usize,
    },

    /// The selector engine rejected the query.
    #[error("invalid selector {query:?}")]
    QueryCompile {
        /// The query as passed in.
        query: String,
        /// Why it was rejected.
        #[source]
        source: SelectorError,
    },

    /// A JSON snapshot could not be read.
    #[error("invalid snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),

    /// The tree store refused a structural change.
    #[error(transparent)]
    Tree(DomError),
}

impl From<DomError> for Error {
    fn from(err: DomError) -> Self {
        match err {
            DomError::StaleNode(id) => Self::StaleHandle(id),
            DomError::Snapshot(err) => Self::Snapshot(err),
            other @ DomError::Hierarchy { .. } => Self::Tree(other),
        }
    }
}
