//! Attribute and child diff rendering for incompatible elements.
//!
//! When two keyed elements collide and are not semantically equal, the
//! diagnostic carries a minimal two-sided diff: `--` rows show what the
//! library expected, `++` rows what the main manifest actually has, and
//! unmarked rows give the shared context. The diff stops at the first
//! structural divergence; attribute rows are sorted by local name, child
//! rows follow document order.

use super::equality::{attribute_sets_equal, semantically_equal, significant_children};
use crate::xml::{Document, Element, NodeId, NodeKind, ANDROID_NS};

const END_REACHED: &str = "(end reached)";

/// Render the diff block for a pair of colliding elements.
///
/// The first line is the element header (`<tag android:name=key>`); the
/// following lines are the marked rows. Lines are joined with `\n` and carry
/// no trailing newline, ready to be embedded in a diagnostic message.
pub fn render_element_diff(
    pri_doc: &Document,
    pri_id: NodeId,
    lib_doc: &Document,
    lib_id: NodeId,
) -> String {
    let mut lines = vec![header(pri_doc, pri_id)];
    diff_elements(pri_doc, pri_id, lib_doc, lib_id, 0, &mut lines);
    lines.join("\n")
}

fn header(doc: &Document, id: NodeId) -> String {
    let el = doc.element(id).expect("diff runs on elements");
    match el.attr(Some(ANDROID_NS), "name") {
        Some(key) => format!("<{} {}={}>", el.qualified_name(), key.qualified_name(), key.value),
        None => format!("<{}>", el.qualified_name()),
    }
}

fn diff_elements(
    pri_doc: &Document,
    pri_id: NodeId,
    lib_doc: &Document,
    lib_id: NodeId,
    depth: usize,
    lines: &mut Vec<String>,
) -> bool {
    let pri_el = pri_doc.element(pri_id).expect("diff runs on elements");
    let lib_el = lib_doc.element(lib_id).expect("diff runs on elements");

    if !attribute_sets_equal(pri_el, lib_el) {
        emit_attribute_rows(pri_el, lib_el, depth, lines);
        return true;
    }

    let pri_children = significant_children(pri_doc, pri_id);
    let lib_children = significant_children(lib_doc, lib_id);
    let child_indent = indent(depth + 1);

    for i in 0..pri_children.len().max(lib_children.len()) {
        match (lib_children.get(i), pri_children.get(i)) {
            (Some(&lib_child), Some(&pri_child)) => {
                if semantically_equal(lib_doc, lib_child, pri_doc, pri_child) {
                    continue;
                }
                // Same tag and key at the same slot: the divergence is deeper in.
                if let (Some(le), Some(pe)) =
                    (lib_doc.element(lib_child), pri_doc.element(pri_child))
                {
                    if le.qualified_name() == pe.qualified_name()
                        && le.android_attr("name") == pe.android_attr("name")
                    {
                        lines.push(format!("  {}{}", child_indent, node_label(lib_doc, lib_child)));
                        return diff_elements(pri_doc, pri_child, lib_doc, lib_child, depth + 1, lines);
                    }
                }
                lines.push(format!("--{}{}", child_indent, node_label(lib_doc, lib_child)));
                lines.push(format!("++{}{}", child_indent, node_label(pri_doc, pri_child)));
                return true;
            }
            (Some(&lib_child), None) => {
                lines.push(format!("--{}{}", child_indent, node_label(lib_doc, lib_child)));
                lines.push(format!("++{}{}", child_indent, END_REACHED));
                return true;
            }
            (None, Some(&pri_child)) => {
                lines.push(format!("--{}{}", child_indent, END_REACHED));
                lines.push(format!("++{}{}", child_indent, node_label(pri_doc, pri_child)));
                return true;
            }
            (None, None) => unreachable!(),
        }
    }
    false
}

/// Full attribute union sorted by local name; equal rows are unmarked
/// context, `--`/`++` rows carry the diverging sides.
fn emit_attribute_rows(pri_el: &Element, lib_el: &Element, depth: usize, lines: &mut Vec<String>) {
    let mut keys: Vec<(String, Option<String>, String)> = Vec::new();
    for attr in lib_el.attributes.iter().chain(pri_el.attributes.iter()) {
        let key = (attr.local_name.clone(), attr.namespace.clone(), attr.qualified_name());
        if !keys.iter().any(|(l, ns, _)| *l == key.0 && *ns == key.1) {
            keys.push(key);
        }
    }
    keys.sort_by(|a, b| (&a.0, &a.2).cmp(&(&b.0, &b.2)));

    let ind = format!("    {}", indent(depth));
    for (local, ns, qname) in keys {
        let lib_attr = lib_el.attr(ns.as_deref(), &local);
        let pri_attr = pri_el.attr(ns.as_deref(), &local);
        match (lib_attr, pri_attr) {
            (Some(l), Some(p)) if l.value == p.value => {
                lines.push(format!("  {}@{} = {}", ind, qname, l.value));
            }
            (Some(l), Some(p)) => {
                lines.push(format!("--{}@{} = {}", ind, qname, l.value));
                lines.push(format!("++{}@{} = {}", ind, qname, p.value));
            }
            (Some(l), None) => {
                lines.push(format!("--{}@{} = {}", ind, qname, l.value));
            }
            (None, Some(p)) => {
                lines.push(format!("++{}@{} = {}", ind, qname, p.value));
            }
            (None, None) => unreachable!(),
        }
    }
}

fn node_label(doc: &Document, id: NodeId) -> String {
    match &doc.node(id).kind {
        NodeKind::Element(el) => match el.attr(Some(ANDROID_NS), "name") {
            Some(key) => {
                format!("<{} {}={}>", el.qualified_name(), key.qualified_name(), key.value)
            }
            None => format!("<{}>", el.qualified_name()),
        },
        NodeKind::Text(text) => format!("\"{}\"", text.trim()),
        NodeKind::Comment(content) => format!("<!--{}-->", content),
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
