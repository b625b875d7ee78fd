//! Positional manifest reader.
//!
//! Builds a [`Document`] from XML source while keeping every byte of the
//! original formatting: inter-tag text and comments become tree nodes,
//! attribute whitespace and quote style are stored on each [`Attribute`],
//! and everything outside the root element lands in the document's
//! prolog/epilog verbatim.

use super::{Attribute, Document, Element, Node, NodeId, NodeKind, XMLNS_NS};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// The `xml` prefix is bound implicitly per the XML namespaces spec.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Reader errors
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("{file}:{line}: {source}")]
    Syntax {
        file: String,
        line: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("{file}:{line}: malformed attribute in <{tag}>")]
    Attribute { file: String, line: usize, tag: String },
    #[error("{file}: document has no root element")]
    NoRoot { file: String },
    #[error("{file}:{line}: more than one root element")]
    MultipleRoots { file: String, line: usize },
}

/// Parse a manifest document from a string.
///
/// `file_id` is the identifier used in diagnostics, usually the path the
/// driver read the source from.
pub fn read_document(file_id: impl Into<String>, source: &str) -> Result<Document, ReadError> {
    let file_id = file_id.into();
    let lines = LineIndex::new(source);
    let mut reader = Reader::from_str(source);

    let mut doc = Document::empty(file_id.clone());
    let mut stack: Vec<NodeId> = Vec::new();
    let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        let start = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(ev) => ev,
            Err(source) => {
                return Err(ReadError::Syntax {
                    file: file_id,
                    line: lines.line_at(start),
                    source,
                })
            }
        };
        let end = reader.buffer_position();
        let raw = &source[start..end];
        let line = lines.line_at(start);

        match event {
            Event::Start(_) => {
                let inner = &raw[1..raw.len() - 1];
                let id = open_element(
                    &mut doc, &lines, &file_id, inner, start + 1, line, false, &mut scopes,
                )?;
                attach(&mut doc, &stack, &mut root, id, line, &file_id)?;
                stack.push(id);
            }
            Event::Empty(_) => {
                let inner = &raw[1..raw.len() - 2];
                let id = open_element(
                    &mut doc, &lines, &file_id, inner, start + 1, line, true, &mut scopes,
                )?;
                attach(&mut doc, &stack, &mut root, id, line, &file_id)?;
                scopes.pop();
            }
            Event::End(_) => {
                stack.pop();
                scopes.pop();
            }
            Event::Text(_) => {
                outside_or_child(&mut doc, &stack, root, raw, line, NodeKind::Text(raw.to_string()));
            }
            Event::CData(_) => {
                // Stored verbatim, delimiters included, so the writer
                // round-trips it untouched.
                outside_or_child(&mut doc, &stack, root, raw, line, NodeKind::Text(raw.to_string()));
            }
            Event::Comment(_) => {
                let content = raw[4..raw.len() - 3].to_string();
                outside_or_child(&mut doc, &stack, root, raw, line, NodeKind::Comment(content));
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                if root.is_none() {
                    doc.prolog.push_str(raw);
                } else {
                    doc.epilog.push_str(raw);
                }
            }
            Event::Eof => break,
        }
    }

    let root = root.ok_or(ReadError::NoRoot { file: file_id.clone() })?;
    doc.root = root;
    debug!("Parsed {}: {} nodes", file_id, doc.node_count());
    Ok(doc)
}

impl Document {
    fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            count += 1;
            pending.extend_from_slice(self.children(id));
        }
        count
    }
}

/// Attach a freshly parsed element to the open element on the stack, or make
/// it the document root.
fn attach(
    doc: &mut Document,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    id: NodeId,
    line: usize,
    file: &str,
) -> Result<(), ReadError> {
    if let Some(&parent) = stack.last() {
        doc.node_mut(id).parent = Some(parent);
        match &mut doc.node_mut(parent).kind {
            NodeKind::Element(el) => el.children.push(id),
            _ => unreachable!("stack holds elements only"),
        }
    } else if root.is_none() {
        *root = Some(id);
    } else {
        return Err(ReadError::MultipleRoots { file: file.to_string(), line });
    }
    Ok(())
}

/// Route a text/comment node: into the tree when an element is open, into
/// the prolog/epilog verbatim otherwise.
fn outside_or_child(
    doc: &mut Document,
    stack: &[NodeId],
    root: Option<NodeId>,
    raw: &str,
    line: usize,
    kind: NodeKind,
) {
    if let Some(&parent) = stack.last() {
        let id = doc.push_node(Node { parent: Some(parent), line, kind });
        match &mut doc.node_mut(parent).kind {
            NodeKind::Element(el) => el.children.push(id),
            _ => unreachable!("stack holds elements only"),
        }
    } else if root.is_none() {
        doc.prolog.push_str(raw);
    } else {
        doc.epilog.push_str(raw);
    }
}

/// Parse the inside of a start tag (`tag attr="v" ...`), allocate the
/// element, and push its namespace scope.
#[allow(clippy::too_many_arguments)]
fn open_element(
    doc: &mut Document,
    lines: &LineIndex,
    file: &str,
    inner: &str,
    base_offset: usize,
    line: usize,
    self_closing: bool,
    scopes: &mut Vec<Vec<(String, String)>>,
) -> Result<NodeId, ReadError> {
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let name = &inner[..i];
    let (prefix, local_name) = split_qname(name);

    let (raw_attrs, tag_tail) =
        lex_attributes(&inner[i..], base_offset + i, lines, file, name)?;

    // Namespace declarations on this element come into scope before its own
    // attributes are resolved.
    let mut scope = Vec::new();
    for a in &raw_attrs {
        if a.prefix.as_deref() == Some("xmlns") {
            scope.push((a.local_name.clone(), a.value.clone()));
        }
    }
    scopes.push(scope);

    let attributes = raw_attrs
        .into_iter()
        .map(|a| {
            let namespace = resolve_namespace(a.prefix.as_deref(), &a.local_name, scopes);
            Attribute {
                prefix: a.prefix,
                local_name: a.local_name,
                namespace,
                value: a.value,
                line: a.line,
                leading: a.leading,
                eq: a.eq,
            }
        })
        .collect();

    Ok(doc.push_node(Node {
        parent: None,
        line,
        kind: NodeKind::Element(Element {
            prefix,
            local_name: local_name.to_string(),
            attributes,
            children: Vec::new(),
            self_closing,
            tag_tail,
        }),
    }))
}

struct RawAttr {
    prefix: Option<String>,
    local_name: String,
    value: String,
    line: usize,
    leading: String,
    eq: String,
}

/// Lex the attribute run after a tag name. Returns the attributes plus the
/// verbatim whitespace between the last attribute and the closing `>`.
fn lex_attributes(
    rest: &str,
    base_offset: usize,
    lines: &LineIndex,
    file: &str,
    tag: &str,
) -> Result<(Vec<RawAttr>, String), ReadError> {
    let bytes = rest.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    loop {
        let ws_start = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == bytes.len() {
            return Ok((attrs, rest[ws_start..].to_string()));
        }
        let leading = rest[ws_start..i].to_string();

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &rest[name_start..i];

        let eq_start = i;
        while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\'' {
            i += 1;
        }
        let malformed = |at: usize| ReadError::Attribute {
            file: file.to_string(),
            line: lines.line_at(base_offset + at),
            tag: tag.to_string(),
        };
        if i == bytes.len() {
            return Err(malformed(name_start));
        }
        let quote = bytes[i];
        i += 1;
        let eq = rest[eq_start..i].to_string();
        if !eq.contains('=') {
            return Err(malformed(name_start));
        }

        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        if i == bytes.len() {
            return Err(malformed(value_start));
        }
        let value = rest[value_start..i].to_string();
        i += 1;

        let (prefix, local_name) = split_qname(name);
        attrs.push(RawAttr {
            prefix,
            local_name: local_name.to_string(),
            value,
            line: lines.line_at(base_offset + name_start),
            leading,
            eq,
        });
    }
}

fn split_qname(name: &str) -> (Option<String>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local),
        None => (None, name),
    }
}

fn resolve_namespace(
    prefix: Option<&str>,
    local_name: &str,
    scopes: &[Vec<(String, String)>],
) -> Option<String> {
    match prefix {
        None => {
            // Unprefixed attributes carry no namespace; the lone exception is
            // the default-namespace declaration itself.
            if local_name == "xmlns" {
                Some(XMLNS_NS.to_string())
            } else {
                None
            }
        }
        Some("xmlns") => Some(XMLNS_NS.to_string()),
        Some("xml") => Some(XML_NS.to_string()),
        Some(p) => scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().rev().find(|(pre, _)| pre == p))
            .map(|(_, uri)| uri.clone()),
    }
}

/// Byte offset to 1-indexed line lookup.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= offset)
    }
}
