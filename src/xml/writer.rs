//! Verbatim manifest serializer.
//!
//! Reproduces exactly what the reader saw: untouched documents round-trip
//! byte-for-byte, and engine edits (a rewritten attribute value, an appended
//! subtree) disturb nothing around them.

use super::{Document, NodeId, NodeKind};

/// Serialize a document back to XML text.
pub fn write_document(doc: &Document) -> String {
    let mut out = String::with_capacity(doc.prolog.len() + doc.epilog.len() + 1024);
    out.push_str(&doc.prolog);
    write_node(doc, doc.root, &mut out);
    out.push_str(&doc.epilog);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(content) => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::Element(el) => {
            let qname = el.qualified_name();
            out.push('<');
            out.push_str(&qname);
            for attr in &el.attributes {
                out.push_str(&attr.leading);
                out.push_str(&attr.qualified_name());
                out.push_str(&attr.eq);
                out.push_str(&attr.value);
                out.push(attr.quote());
            }
            out.push_str(&el.tag_tail);
            if el.self_closing {
                out.push_str("/>");
            } else {
                out.push('>');
                for &child in &el.children {
                    write_node(doc, child, out);
                }
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
            }
        }
    }
}
