//! Canonical element paths for diagnostics.

use super::policy::ELEMENT_KINDS;
use crate::xml::{Document, NodeId, ANDROID_NS};

/// Canonical textual path of an element, e.g.
/// `/manifest/application/activity[@name=com.example.X]`.
///
/// A segment carries an `[@name=...]` key only when its kind is keyed in the
/// policy table; `manifest` and `application` stay bare. The path is
/// independent of source formatting.
pub fn element_path(doc: &Document, id: NodeId) -> String {
    let mut chain = Vec::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if doc.node(current).is_element() {
            chain.push(current);
        }
        cursor = doc.node(current).parent;
    }
    chain.reverse();

    let mut path = String::new();
    for node in chain {
        let el = doc.element(node).expect("chain holds elements only");
        let tag = el.qualified_name();
        path.push('/');
        path.push_str(&tag);

        let key_attr = ELEMENT_KINDS
            .iter()
            .find(|k| k.tag == tag)
            .and_then(|k| k.key_attr);
        if let Some(key) = key_attr {
            if let Some(attr) = el.attr(Some(ANDROID_NS), key) {
                path.push_str(&format!("[@{}={}]", key, attr.value));
            }
        }
    }
    path
}
