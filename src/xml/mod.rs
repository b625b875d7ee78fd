// XML tree model - some accessors reserved for library consumers
#![allow(dead_code)]

mod reader;
mod writer;

pub use reader::{read_document, ReadError};
pub use writer::write_document;

/// The Android resource namespace; recognized merge attributes live here.
pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// Namespace of `xmlns`/`xmlns:*` declaration attributes.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Handle into a document's node arena.
pub type NodeId = usize;

/// An attribute as written in the source, with enough verbatim context to
/// reproduce it byte-for-byte: the whitespace run before the name and the
/// exact `=`-plus-quote run between name and value.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Namespace prefix as written (e.g. `android`), if any.
    pub prefix: Option<String>,
    /// Local name (e.g. `name`).
    pub local_name: String,
    /// Resolved namespace URI, if the prefix was declared in scope.
    pub namespace: Option<String>,
    /// Value exactly as written (entities not expanded).
    pub value: String,
    /// 1-indexed source line of the attribute name.
    pub line: usize,
    /// Verbatim whitespace between the previous token and the name.
    pub leading: String,
    /// Verbatim run from the end of the name through the opening quote,
    /// e.g. `="` or ` = '`.
    pub eq: String,
}

impl Attribute {
    /// Name as written in the source (`android:name` or `package`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// The quote character delimiting the value.
    pub fn quote(&self) -> char {
        self.eq.chars().last().unwrap_or('"')
    }

    /// Namespace-aware name match.
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }
}

/// An element with ordered attributes and ordered children.
#[derive(Debug, Clone)]
pub struct Element {
    pub prefix: Option<String>,
    pub local_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
    /// Written as `<tag .../>` rather than `<tag ...></tag>`.
    pub self_closing: bool,
    /// Verbatim whitespace between the last attribute and `>` / `/>`.
    pub tag_tail: String,
}

impl Element {
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn attr(&self, namespace: Option<&str>, local_name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is(namespace, local_name))
    }

    pub fn attr_mut(&mut self, namespace: Option<&str>, local_name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.is(namespace, local_name))
    }

    /// Value of an attribute in the Android namespace.
    pub fn android_attr(&self, local_name: &str) -> Option<&str> {
        self.attr(Some(ANDROID_NS), local_name).map(|a| a.value.as_str())
    }

    /// Remove an attribute; the surrounding formatting of the remaining
    /// attributes is untouched.
    pub fn remove_attr(&mut self, namespace: Option<&str>, local_name: &str) -> Option<Attribute> {
        let idx = self.attributes.iter().position(|a| a.is(namespace, local_name))?;
        Some(self.attributes.remove(idx))
    }
}

/// Node payload: element, comment, or verbatim character data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    /// Comment content without the `<!--` / `-->` delimiters.
    Comment(String),
    /// Character data exactly as written, entities not expanded.
    Text(String),
}

/// A node in the arena: payload plus back-edge to its parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    /// 1-indexed source line; 0 for synthesized nodes.
    pub line: usize,
    pub kind: NodeKind,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, NodeKind::Comment(_))
    }

    /// True for text nodes consisting solely of whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        match &self.kind {
            NodeKind::Text(t) => t.chars().all(char::is_whitespace),
            _ => false,
        }
    }

    /// Comments and whitespace-only text are trivia; everything else is
    /// significant for semantic comparison.
    pub fn is_trivia(&self) -> bool {
        self.is_comment() || self.is_whitespace_text()
    }
}

/// A parsed manifest document backed by a node arena.
///
/// The arena keeps parent back-edges as plain indices, so subtrees can be
/// cloned across documents and diagnostics can hold node handles without
/// ownership cycles.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// The root element node (a manifest's `<manifest>`).
    pub root: NodeId,
    /// Identifier used in diagnostics, usually the input path.
    pub file_id: String,
    /// Everything before the root element's start tag, verbatim.
    pub prolog: String,
    /// Everything after the root element's end tag, verbatim.
    pub epilog: String,
}

impl Document {
    pub(crate) fn empty(file_id: String) -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
            file_id,
            prolog: String::new(),
            epilog: String::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes[id].as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn root_element(&self) -> &Element {
        self.element(self.root).expect("document root is an element")
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id].line
    }

    /// Append a node to the arena without attaching it to any child list.
    pub fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Child node ids of an element, empty for non-elements.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.element(id) {
            Some(el) => &el.children,
            None => &[],
        }
    }

    /// Element children of `id`, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.nodes[c].is_element())
            .collect()
    }

    /// First element child with the given tag name.
    pub fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.element_children(parent)
            .into_iter()
            .find(|&c| self.element(c).map(|el| el.qualified_name() == tag).unwrap_or(false))
    }

    /// Insert an already-allocated node into a parent's child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        match &mut self.nodes[parent].kind {
            NodeKind::Element(el) => el.children.insert(index, child),
            _ => panic!("insert_child on a non-element parent"),
        }
    }

    /// Deep-copy a subtree from another document into this arena.
    ///
    /// The copy keeps the source formatting (attribute runs, child text) and
    /// the source line numbers for provenance. The new root is allocated with
    /// the given parent but is not attached to its child list; the caller
    /// chooses the insertion index.
    pub fn import_subtree(&mut self, src: &Document, src_id: NodeId, parent: NodeId) -> NodeId {
        let src_node = src.node(src_id);
        match &src_node.kind {
            NodeKind::Element(el) => {
                let shell = Element {
                    prefix: el.prefix.clone(),
                    local_name: el.local_name.clone(),
                    attributes: el.attributes.clone(),
                    children: Vec::new(),
                    self_closing: el.self_closing,
                    tag_tail: el.tag_tail.clone(),
                };
                let new_id = self.push_node(Node {
                    parent: Some(parent),
                    line: src_node.line,
                    kind: NodeKind::Element(shell),
                });
                for &child in &el.children {
                    let new_child = self.import_subtree(src, child, new_id);
                    match &mut self.nodes[new_id].kind {
                        NodeKind::Element(el) => el.children.push(new_child),
                        _ => unreachable!(),
                    }
                }
                new_id
            }
            other => self.push_node(Node {
                parent: Some(parent),
                line: src_node.line,
                kind: other.clone(),
            }),
        }
    }
}
