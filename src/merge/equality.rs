//! Semantic subtree equality.
//!
//! Two elements are semantically equal when their qualified names match,
//! their attribute sets match as unordered sets keyed by namespace and local
//! name, and their significant children (comments and whitespace-only text
//! filtered out) match pairwise in order. Source files, line numbers and
//! formatting never participate.

use crate::xml::{Document, Element, NodeId, NodeKind};

/// Deep comparison of two element subtrees, possibly across documents.
pub fn semantically_equal(
    a_doc: &Document,
    a_id: NodeId,
    b_doc: &Document,
    b_id: NodeId,
) -> bool {
    match (&a_doc.node(a_id).kind, &b_doc.node(b_id).kind) {
        (NodeKind::Element(a), NodeKind::Element(b)) => {
            if a.qualified_name() != b.qualified_name() {
                return false;
            }
            if !attribute_sets_equal(a, b) {
                return false;
            }
            children_equal(a_doc, a_id, b_doc, b_id)
        }
        (NodeKind::Text(a), NodeKind::Text(b)) => a == b,
        _ => false,
    }
}

/// Unordered attribute comparison on (namespace, local name, value).
pub fn attribute_sets_equal(a: &Element, b: &Element) -> bool {
    if a.attributes.len() != b.attributes.len() {
        return false;
    }
    a.attributes.iter().all(|attr| {
        b.attr(attr.namespace.as_deref(), &attr.local_name)
            .map(|other| other.value == attr.value)
            .unwrap_or(false)
    })
}

fn children_equal(a_doc: &Document, a_id: NodeId, b_doc: &Document, b_id: NodeId) -> bool {
    let a_children = significant_children(a_doc, a_id);
    let b_children = significant_children(b_doc, b_id);
    if a_children.len() != b_children.len() {
        return false;
    }
    a_children
        .iter()
        .zip(b_children.iter())
        .all(|(&a, &b)| semantically_equal(a_doc, a, b_doc, b))
}

/// Children that matter for comparison: elements and non-whitespace text.
pub fn significant_children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.children(id)
        .iter()
        .copied()
        .filter(|&c| !doc.node(c).is_trivia())
        .collect()
}
