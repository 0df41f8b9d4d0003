//! Configuration values.

use bramble_dom::DecodePolicy;
use bramble_select::{DEFAULT_CACHE_CAPACITY, MatchScope};
use serde::{Deserialize, Serialize};

/// How a [`Document`](crate::Document) decodes and queries.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// let options: bramble::DocumentOptions =
///     serde_json::from_str(r#"{"decode_policy": "strict"}"#).unwrap();
/// assert_eq!(options.query_cache_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Applied to every name, value and text read through a handle.
    pub decode_policy: DecodePolicy,
    /// Whether `css` on a node can match the node itself.
    pub match_scope: MatchScope,
    /// Compiled queries kept for reuse. Zero disables the cache.
    pub query_cache_capacity: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            decode_policy: DecodePolicy::default(),
            match_scope: MatchScope::default(),
            query_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Arguments of [`Node::text`](crate::Node::text) bundled as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Visit every descendant rather than direct children only.
    pub deep: bool,
    /// Appended after every text fragment, including the last.
    pub separator: String,
    /// Trim each fragment before appending the separator.
    pub strip: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            deep: true,
            separator: String::new(),
            strip: false,
        }
    }
}
