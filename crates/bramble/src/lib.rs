//! Node handles over parsed HTML trees.
//!
//! A [`Document`] owns a [`DomTree`] together with the decode policy and
//! selector engine it was built with. Every [`Node`] handed out shares that
//! state and names one position by a generation-checked [`NodeId`], so a
//! handle whose position has been decomposed fails with
//! [`Error::StaleHandle`] instead of reading whatever took its place.
//!
//! ```
//! use bramble::{Document, DocumentOptions};
//!
//! let json = r#"{"type": "document", "children": [
//!     {"type": "element", "tag": "p", "children": [{"type": "text", "text": " hi "}]}
//! ]}"#;
//! let doc = Document::from_json(json, &DocumentOptions::default())?;
//! let p = doc.css_first("p", None, true)?.expect("one paragraph");
//! assert_eq!(p.text(true, "|", true)?, "hi|");
//! # Ok::<(), bramble::Error>(())
//! ```
//!
//! Handles are single-threaded (`!Send`): the tree sits behind a
//! `RefCell` that only this crate borrows, and never across a call.

mod document;
mod error;
mod iter;
mod node;
mod options;
mod query;
mod store;
mod text;

pub use bramble_dom::{DecodeError, DecodePolicy, DomTree, NodeId};
pub use bramble_select::{CssEngine, MatchScope, SelectorEngine, SelectorError};
pub use document::Document;
pub use error::{Error, Result};
pub use iter::{Children, Descendants};
pub use node::{Attributes, Node};
pub use options::{DocumentOptions, TextOptions};
