//! JSON snapshots of trees.
//!
//! A snapshot is a nested, self-describing copy of a tree:
//!
//! ```json
//! {"type": "element", "tag": "div",
//!  "attributes": [["class", "x"], ["disabled", null]],
//!  "children": [{"type": "text", "text": "hello"}]}
//! ```
//!
//! Snapshots let tests and the command-line tool build a tree without an
//! HTML parser. JSON strings are UTF-8, so a snapshot cannot carry invalid
//! byte sequences; exporting replaces them with U+FFFD.

use serde::{Deserialize, Serialize};

use crate::{Attribute, DomTree, NodeId, NodeType, Result};

/// One node of a JSON snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotNode {
    /// The document root.
    Document {
        /// Top-level nodes.
        #[serde(default)]
        children: Vec<SnapshotNode>,
    },
    /// An element.
    Element {
        /// Tag name, case as stored.
        tag: String,
        /// Attributes in source order; `null` marks a value-less attribute.
        #[serde(default)]
        attributes: Vec<(String, Option<String>)>,
        /// Child nodes.
        #[serde(default)]
        children: Vec<SnapshotNode>,
    },
    /// A text node.
    Text {
        /// Character data.
        text: String,
    },
    /// A comment.
    Comment {
        /// Comment data.
        text: String,
    },
}

impl DomTree {
    /// Build a tree from a snapshot.
    ///
    /// A `document` snapshot becomes the tree's document node; any other
    /// kind is appended as the document's only child.
    ///
    /// # Errors
    ///
    /// Never fails for a freshly built tree; the `Result` mirrors the
    /// builder operations it is made of.
    pub fn from_snapshot(snapshot: &SnapshotNode) -> Result<Self> {
        let mut tree = Self::new();
        let mut pending: Vec<(NodeId, &SnapshotNode)> = match snapshot {
            SnapshotNode::Document { children } => {
                children.iter().rev().map(|c| (NodeId::ROOT, c)).collect()
            }
            other => vec![(NodeId::ROOT, other)],
        };

        while let Some((parent, node)) = pending.pop() {
            let id = match node {
                // A nested document has no meaning; keep its children.
                SnapshotNode::Document { children } => {
                    pending.extend(children.iter().rev().map(|c| (parent, c)));
                    continue;
                }
                SnapshotNode::Element {
                    tag,
                    attributes,
                    children,
                } => {
                    let id = tree.create_element(tag.as_str());
                    for (name, value) in attributes {
                        tree.push_attribute(id, Attribute::new(name.as_str(), value.as_deref()))?;
                    }
                    pending.extend(children.iter().rev().map(|c| (id, c)));
                    id
                }
                SnapshotNode::Text { text } => tree.create_text(text.as_str()),
                SnapshotNode::Comment { text } => tree.create_comment(text.as_str()),
            };
            tree.append_child(parent, id)?;
        }

        Ok(tree)
    }

    /// Parse a JSON snapshot and build a tree from it.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Snapshot`](crate::DomError::Snapshot) if `json`
    /// is not a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: SnapshotNode = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Copy the subtree at `id` into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`](crate::DomError::StaleNode) if `id`
    /// has been removed.
    pub fn to_snapshot(&self, id: NodeId) -> Result<SnapshotNode> {
        let _ = self.try_get(id)?;

        // Each frame is a node, the index of its next unvisited child and
        // the snapshots of the children already built.
        let mut frames = vec![(id, 0, Vec::new())];
        while let Some((current, next_child, _)) = frames.last_mut() {
            if let Some(&child) = self.children(*current).get(*next_child) {
                *next_child += 1;
                frames.push((child, 0, Vec::new()));
            } else if let Some((done, _, built)) = frames.pop() {
                let snapshot = self.snapshot_of(done, built);
                match frames.last_mut() {
                    Some((_, _, siblings)) => siblings.push(snapshot),
                    None => return Ok(snapshot),
                }
            }
        }
        // The root frame always returns above.
        Ok(SnapshotNode::Document {
            children: Vec::new(),
        })
    }

    fn snapshot_of(&self, id: NodeId, children: Vec<SnapshotNode>) -> SnapshotNode {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Element(data)) => SnapshotNode::Element {
                tag: lossy(&data.tag_name),
                attributes: data
                    .attrs
                    .iter()
                    .map(|a| (lossy(&a.name), a.value.as_deref().map(lossy)))
                    .collect(),
                children,
            },
            Some(NodeType::Text(text)) => SnapshotNode::Text { text: lossy(text) },
            Some(NodeType::Comment(text)) => SnapshotNode::Comment { text: lossy(text) },
            Some(NodeType::Document) | None => SnapshotNode::Document { children },
        }
    }

    /// Serialize the subtree at `id` as a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` has been removed.
    pub fn to_json(&self, id: NodeId) -> Result<String> {
        Ok(serde_json::to_string(&self.to_snapshot(id)?)?)
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
