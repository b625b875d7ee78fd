//! Leading-trivia capture for element migration.
//!
//! When a library element is appended to the main manifest it brings along
//! the comment block that documents it in its source file, with the
//! interleaved whitespace kept verbatim.

use crate::xml::{Document, NodeId};

/// Collect the run of comments and whitespace-only text nodes immediately
/// preceding `id` among its siblings, in document order.
///
/// The walk stops at the first element, non-whitespace text node, or the
/// parent's opening boundary.
pub fn leading_trivia(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let Some(parent) = doc.node(id).parent else {
        return Vec::new();
    };
    let siblings = doc.children(parent);
    let Some(pos) = siblings.iter().position(|&s| s == id) else {
        return Vec::new();
    };

    let mut run = Vec::new();
    for &sibling in siblings[..pos].iter().rev() {
        if doc.node(sibling).is_trivia() {
            run.push(sibling);
        } else {
            break;
        }
    }
    run.reverse();
    run
}
