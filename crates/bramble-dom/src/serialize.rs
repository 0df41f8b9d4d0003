//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! Turns a subtree back into markup. The output is equivalent to the tree,
//! not byte-identical to whatever source it was parsed from: attribute
//! values are always double-quoted and only the characters that must be
//! escaped are.

use crate::{DomTree, ElementData, NodeId, NodeType, Result};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified for void elements."
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"param", b"source", b"track", b"wbr",
];

/// Elements whose text children are written out verbatim.
const RAW_TEXT_ELEMENTS: &[&[u8]] = &[
    b"script",
    b"style",
    b"xmp",
    b"iframe",
    b"noembed",
    b"noframes",
    b"plaintext",
];

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl DomTree {
    /// Serialize `id` and all of its descendants to markup bytes.
    ///
    /// The document node contributes only its children. Iterative, so
    /// deeply nested trees do not grow the call stack.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`](crate::DomError::StaleNode) if `id`
    /// has been removed.
    pub fn serialize(&self, id: NodeId) -> Result<Vec<u8>> {
        let _ = self.try_get(id)?;

        let mut out = Vec::with_capacity(256);
        let mut stack = vec![Step::Open(id)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(current) => {
                    let Some(node) = self.get(current) else {
                        continue;
                    };
                    match &node.node_type {
                        NodeType::Document => {
                            stack.extend(node.children.iter().rev().map(|&c| Step::Open(c)));
                        }
                        NodeType::Element(data) => {
                            write_start_tag(&mut out, data);
                            if is_one_of(&data.tag_name, VOID_ELEMENTS) {
                                continue;
                            }
                            stack.push(Step::Close(current));
                            stack.extend(node.children.iter().rev().map(|&c| Step::Open(c)));
                        }
                        NodeType::Text(text) => {
                            let raw_parent = node
                                .parent
                                .and_then(|p| self.as_element(p))
                                .is_some_and(|p| is_one_of(&p.tag_name, RAW_TEXT_ELEMENTS));
                            if raw_parent {
                                out.extend_from_slice(text);
                            } else {
                                escape_into(&mut out, text, false);
                            }
                        }
                        NodeType::Comment(data) => {
                            out.extend_from_slice(b"<!--");
                            out.extend_from_slice(data);
                            out.extend_from_slice(b"-->");
                        }
                    }
                }
                Step::Close(current) => {
                    if let Some(data) = self.as_element(current) {
                        out.extend_from_slice(b"</");
                        out.extend_from_slice(&data.tag_name);
                        out.push(b'>');
                    }
                }
            }
        }

        Ok(out)
    }
}

fn write_start_tag(out: &mut Vec<u8>, data: &ElementData) {
    out.push(b'<');
    out.extend_from_slice(&data.tag_name);
    for attr in &data.attrs {
        out.push(b' ');
        out.extend_from_slice(&attr.name);
        if let Some(value) = &attr.value {
            out.extend_from_slice(b"=\"");
            escape_into(out, value, true);
            out.push(b'"');
        }
    }
    out.push(b'>');
}

fn is_one_of(tag_name: &[u8], set: &[&[u8]]) -> bool {
    set.iter().any(|name| tag_name.eq_ignore_ascii_case(name))
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
///
/// `&` and U+00A0 always; `"` in attribute mode; `<` and `>` otherwise.
/// U+00A0 is matched as its UTF-8 encoding, so invalid bytes pass through
/// untouched.
fn escape_into(out: &mut Vec<u8>, bytes: &[u8], attribute_mode: bool) {
    let mut rest = bytes;
    while let Some((&byte, tail)) = rest.split_first() {
        rest = tail;
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            0xC2 if rest.first() == Some(&0xA0) => {
                out.extend_from_slice(b"&nbsp;");
                rest = &rest[1..];
            }
            b'"' if attribute_mode => out.extend_from_slice(b"&quot;"),
            b'<' if !attribute_mode => out.extend_from_slice(b"&lt;"),
            b'>' if !attribute_mode => out.extend_from_slice(b"&gt;"),
            _ => out.push(byte),
        }
    }
}
