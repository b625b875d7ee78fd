// Merge engine - some re-exports reserved for library consumers
#![allow(dead_code)]

mod diff;
mod equality;
mod path;
mod policy;
mod trivia;
mod values;

pub use equality::semantically_equal;
pub use path::element_path;
pub use policy::{lookup, ElementKind, MergePolicy, MergeScope, ELEMENT_KINDS};
pub use values::{
    format_gl_es_version, parse_gl_es_version, parse_required, parse_sdk_version,
    DEFAULT_GL_ES_VERSION, DEFAULT_MIN_SDK_VERSION, MIN_GL_ES_VERSION,
};

use crate::report::{FileRef, MergeReport};
use crate::xml::{Attribute, Document, Node, NodeId, NodeKind, ANDROID_NS};
use tracing::debug;

/// Merges library manifests into a main manifest, in place.
///
/// The engine mutates the main document (appended children, escalated
/// `uses-library/@required` values) and records every decision in a
/// [`MergeReport`]. Library documents are read-only. One engine drives one
/// merge; diagnostics accumulate across the `merge` call in deterministic
/// order: libraries in input order, elements in document order.
pub struct MergeEngine {
    /// Insert a `<!-- from @library -->` comment before each library's
    /// contributions.
    markers: bool,
    report: MergeReport,
}

/// What the main manifest effectively declares for `minSdkVersion`.
struct SdkBaseline {
    /// `None` when the declared value failed to parse (already reported).
    version: Option<u32>,
    declared: bool,
    file_ref: FileRef,
}

/// What the main manifest effectively declares for `glEsVersion`.
struct GlBaseline {
    version: u32,
    declared: bool,
    file_ref: FileRef,
}

/// A library element scheduled for appending under `/manifest/application`.
struct AppendItem {
    rank: usize,
    node: NodeId,
    /// Rewrite `android:required` to `true` on the imported copy.
    force_required: bool,
}

/// A library element scheduled for appending under `/manifest`.
struct TopAppend {
    node: NodeId,
    /// Drop `android:glEsVersion` from the imported copy.
    strip_gl: bool,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self {
            markers: true,
            report: MergeReport::new(),
        }
    }

    pub fn with_markers(mut self, markers: bool) -> Self {
        self.markers = markers;
        self
    }

    /// Merge `libraries` into `primary`, in the order given.
    ///
    /// Returns `true` when no error-severity diagnostic was recorded. The
    /// merge never aborts early: recoverable problems are reported, the
    /// offending element is skipped, and processing continues.
    pub fn merge(&mut self, primary: &mut Document, libraries: &[Document]) -> bool {
        if primary.root_element().qualified_name() != "manifest" {
            let found = primary.root_element().qualified_name();
            self.report.error(
                Some(FileRef::new(&primary.file_id, Some(primary.line(primary.root)))),
                None,
                format!(
                    "Root element of {} must be <manifest> but found <{}>.",
                    primary.file_id, found
                ),
            );
            return false;
        }
        if libraries.is_empty() {
            return true;
        }

        let sdk = self.sdk_baseline(primary);
        let gl = self.gl_baseline(primary);

        for lib in libraries {
            self.merge_library(primary, lib, &sdk, &gl);
        }
        !self.report.has_errors()
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    pub fn into_report(self) -> MergeReport {
        self.report
    }

    fn merge_library(
        &mut self,
        primary: &mut Document,
        lib: &Document,
        sdk: &SdkBaseline,
        gl: &GlBaseline,
    ) {
        debug!("Merging {} into {}", lib.file_id, primary.file_id);

        let lib_root = lib.root_element();
        if lib_root.qualified_name() != "manifest" {
            self.report.error(
                Some(FileRef::new(&lib.file_id, Some(lib.line(lib.root)))),
                None,
                format!(
                    "Root element of library {} must be <manifest> but found <{}>.",
                    lib.file_id,
                    lib_root.qualified_name()
                ),
            );
            return;
        }

        let mut top_appends = Vec::new();
        for child in lib.element_children(lib.root) {
            let tag = lib.element(child).expect("element child").qualified_name();
            match policy::lookup(MergeScope::Manifest, &tag).map(|k| k.policy) {
                Some(MergePolicy::UsesSdk) => self.check_uses_sdk(lib, child, sdk),
                Some(MergePolicy::UsesFeature) => {
                    self.merge_uses_feature(primary, lib, child, gl, &mut top_appends)
                }
                Some(MergePolicy::UsesPermission) => {
                    self.merge_uses_permission(primary, lib, child, &mut top_appends)
                }
                _ => {} // unrecognized top-level elements are ignored
            }
        }
        self.apply_manifest_appends(primary, lib, top_appends);

        if let Some(lib_app) = lib.find_child_element(lib.root, "application") {
            self.merge_application(primary, lib, lib_app);
        }
    }

    // ------------------------------------------------------------------
    // uses-sdk
    // ------------------------------------------------------------------

    fn sdk_baseline(&mut self, primary: &Document) -> SdkBaseline {
        let Some(sdk_el) = primary.find_child_element(primary.root, "uses-sdk") else {
            return SdkBaseline {
                version: Some(values::DEFAULT_MIN_SDK_VERSION),
                declared: false,
                file_ref: FileRef::new(&primary.file_id, None),
            };
        };
        let el = primary.element(sdk_el).expect("uses-sdk is an element");
        match el.attr(Some(ANDROID_NS), "minSdkVersion") {
            Some(attr) => {
                let file_ref = FileRef::new(&primary.file_id, Some(attr.line));
                match values::parse_sdk_version(&attr.value) {
                    Some(version) => SdkBaseline {
                        version: Some(version),
                        declared: true,
                        file_ref,
                    },
                    None => {
                        self.report.error(
                            Some(file_ref.clone()),
                            None,
                            format!(
                                "Failed to parse <uses-sdk android:minSdkVersion='{}'>: \
                                 must be an integer number.",
                                attr.value
                            ),
                        );
                        SdkBaseline {
                            version: None,
                            declared: true,
                            file_ref,
                        }
                    }
                }
            }
            None => SdkBaseline {
                version: Some(values::DEFAULT_MIN_SDK_VERSION),
                declared: false,
                file_ref: FileRef::new(&primary.file_id, Some(primary.line(sdk_el))),
            },
        }
    }

    fn check_uses_sdk(&mut self, lib: &Document, lib_sdk: NodeId, baseline: &SdkBaseline) {
        let el = lib.element(lib_sdk).expect("uses-sdk is an element");
        let Some(attr) = el.attr(Some(ANDROID_NS), "minSdkVersion") else {
            // An implicit library minimum of 1 can never exceed the main's.
            return;
        };
        let lib_ref = FileRef::new(&lib.file_id, Some(attr.line));
        let Some(lib_version) = values::parse_sdk_version(&attr.value) else {
            self.report.error(
                Some(lib_ref),
                None,
                format!(
                    "Failed to parse <uses-sdk android:minSdkVersion='{}'>: \
                     must be an integer number.",
                    attr.value
                ),
            );
            return;
        };
        let Some(main_version) = baseline.version else {
            return; // main value unparsable, already reported
        };
        if lib_version > main_version {
            self.report.error(
                Some(baseline.file_ref.clone()),
                Some(lib_ref),
                format!(
                    "Main manifest has <uses-sdk android:minSdkVersion='{}'> \
                     but library uses minSdkVersion='{}'",
                    main_version, attr.value
                ),
            );
            if !baseline.declared {
                self.report.warning(
                    Some(baseline.file_ref.clone()),
                    None,
                    "Note: main manifest lacks a <uses-sdk android:minSdkVersion> \
                     declaration, which defaults to value 1.",
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // uses-feature / glEsVersion
    // ------------------------------------------------------------------

    fn gl_baseline(&mut self, primary: &Document) -> GlBaseline {
        let mut best: Option<(u32, usize)> = None;
        for id in primary.element_children(primary.root) {
            let el = primary.element(id).expect("element child");
            if el.qualified_name() != "uses-feature" {
                continue;
            }
            let Some(attr) = el.attr(Some(ANDROID_NS), "glEsVersion") else {
                continue;
            };
            let file_ref = FileRef::new(&primary.file_id, Some(attr.line));
            match values::parse_gl_es_version(&attr.value) {
                Some(version) if version < values::MIN_GL_ES_VERSION => {
                    self.report.warning(
                        Some(file_ref),
                        None,
                        format!(
                            "Ignoring <uses-feature android:glEsVersion='{}'> \
                             because it's smaller than 1.0.",
                            values::format_gl_es_version(version)
                        ),
                    );
                }
                Some(version) => {
                    if best.map_or(true, |(b, _)| version > b) {
                        best = Some((version, attr.line));
                    }
                }
                None => {
                    self.report.error(
                        Some(file_ref),
                        None,
                        format!(
                            "Failed to parse <uses-feature android:glEsVersion='{}'>: \
                             must be an integer in the form 0x00020001.",
                            attr.value
                        ),
                    );
                }
            }
        }
        match best {
            Some((version, line)) => GlBaseline {
                version,
                declared: true,
                file_ref: FileRef::new(&primary.file_id, Some(line)),
            },
            None => GlBaseline {
                version: values::DEFAULT_GL_ES_VERSION,
                declared: false,
                file_ref: FileRef::new(&primary.file_id, None),
            },
        }
    }

    fn check_gl_es_version(&mut self, lib: &Document, attr: &Attribute, gl: &GlBaseline) {
        let lib_ref = FileRef::new(&lib.file_id, Some(attr.line));
        match values::parse_gl_es_version(&attr.value) {
            None => {
                self.report.error(
                    Some(lib_ref),
                    None,
                    format!(
                        "Failed to parse <uses-feature android:glEsVersion='{}'>: \
                         must be an integer in the form 0x00020001.",
                        attr.value
                    ),
                );
            }
            Some(version) if version < values::MIN_GL_ES_VERSION => {
                self.report.warning(
                    Some(lib_ref),
                    None,
                    format!(
                        "Ignoring <uses-feature android:glEsVersion='{}'> \
                         because it's smaller than 1.0.",
                        values::format_gl_es_version(version)
                    ),
                );
            }
            Some(version) if version > gl.version => {
                let message = format!(
                    "Main manifest has <uses-feature android:glEsVersion='{}'> \
                     but library uses glEsVersion='{}'",
                    values::format_gl_es_version(gl.version),
                    values::format_gl_es_version(version)
                );
                if gl.declared {
                    // The main manifest explicitly requires less than the
                    // library needs.
                    self.report
                        .error(Some(gl.file_ref.clone()), Some(lib_ref), message);
                } else {
                    self.report
                        .warning(Some(gl.file_ref.clone()), Some(lib_ref), message);
                    self.report.warning(
                        Some(gl.file_ref.clone()),
                        None,
                        "Note: main manifest lacks a <uses-feature android:glEsVersion> \
                         declaration, which defaults to value 0x00010000.",
                    );
                }
            }
            Some(_) => {}
        }
    }

    fn merge_uses_feature(
        &mut self,
        primary: &Document,
        lib: &Document,
        child: NodeId,
        gl: &GlBaseline,
        appends: &mut Vec<TopAppend>,
    ) {
        let el = lib.element(child).expect("uses-feature is an element");
        if let Some(attr) = el.attr(Some(ANDROID_NS), "glEsVersion") {
            self.check_gl_es_version(lib, attr, gl);
        }
        let Some(name) = el.android_attr("name") else {
            // glEsVersion-only declarations are compared, never appended.
            return;
        };
        let exists = primary.element_children(primary.root).into_iter().any(|c| {
            let pel = primary.element(c).expect("element child");
            pel.qualified_name() == "uses-feature" && pel.android_attr("name") == Some(name)
        });
        if exists {
            debug!("uses-feature {} already declared, skipping", name);
        } else {
            appends.push(TopAppend { node: child, strip_gl: true });
        }
    }

    fn merge_uses_permission(
        &mut self,
        primary: &Document,
        lib: &Document,
        child: NodeId,
        appends: &mut Vec<TopAppend>,
    ) {
        let el = lib.element(child).expect("uses-permission is an element");
        let Some(name) = el.android_attr("name") else {
            self.report.error(
                Some(FileRef::new(&lib.file_id, Some(lib.line(child)))),
                None,
                format!(
                    "Undefined 'name' attribute in {} element.",
                    element_path(lib, child)
                ),
            );
            return;
        };
        let exists = primary.element_children(primary.root).into_iter().any(|c| {
            let pel = primary.element(c).expect("element child");
            pel.qualified_name() == "uses-permission" && pel.android_attr("name") == Some(name)
        });
        if exists {
            debug!("uses-permission {} already declared, skipping", name);
        } else {
            appends.push(TopAppend { node: child, strip_gl: false });
        }
    }

    // ------------------------------------------------------------------
    // application children
    // ------------------------------------------------------------------

    fn merge_application(&mut self, primary: &mut Document, lib: &Document, lib_app: NodeId) {
        let recognized: Vec<(NodeId, &'static ElementKind)> = lib
            .element_children(lib_app)
            .into_iter()
            .filter_map(|c| {
                let tag = lib.element(c).expect("element child").qualified_name();
                policy::lookup(MergeScope::Application, &tag).map(|k| (c, k))
            })
            .collect();
        if recognized.is_empty() {
            return;
        }

        let Some(pri_app) = primary.find_child_element(primary.root, "application") else {
            self.report.error(
                Some(FileRef::new(&primary.file_id, None)),
                Some(FileRef::new(&lib.file_id, Some(lib.line(lib_app)))),
                "Main manifest has no <application> element.",
            );
            return;
        };

        let mut appends = Vec::new();
        for (child, kind) in recognized {
            match kind.policy {
                MergePolicy::Component => {
                    self.merge_component(primary, lib, child, kind, pri_app, &mut appends)
                }
                MergePolicy::UsesLibrary => {
                    self.merge_uses_library(primary, lib, child, pri_app, &mut appends)
                }
                _ => unreachable!("application scope holds component and uses-library rows"),
            }
        }
        self.apply_application_appends(primary, lib, pri_app, appends);
    }

    fn merge_component(
        &mut self,
        primary: &Document,
        lib: &Document,
        child: NodeId,
        kind: &ElementKind,
        pri_app: NodeId,
        appends: &mut Vec<AppendItem>,
    ) {
        let el = lib.element(child).expect("component is an element");
        let Some(name) = el.android_attr("name") else {
            self.report.error(
                Some(FileRef::new(&lib.file_id, Some(lib.line(child)))),
                None,
                format!(
                    "Undefined 'name' attribute in {} element.",
                    element_path(lib, child)
                ),
            );
            return;
        };

        let existing = primary.element_children(pri_app).into_iter().find(|&c| {
            let pel = primary.element(c).expect("element child");
            pel.qualified_name() == kind.tag && pel.android_attr("name") == Some(name)
        });

        match existing {
            None => {
                appends.push(AppendItem {
                    rank: policy::append_rank(kind.tag),
                    node: child,
                    force_required: false,
                });
            }
            Some(pri_el) => {
                let pri_ref = FileRef::new(&primary.file_id, Some(primary.line(pri_el)));
                let lib_ref = FileRef::new(&lib.file_id, Some(lib.line(child)));
                if semantically_equal(primary, pri_el, lib, child) {
                    self.report.progress(
                        Some(pri_ref),
                        Some(lib_ref),
                        format!("Skipping identical {} element.", element_path(primary, pri_el)),
                    );
                } else {
                    let diff = diff::render_element_diff(primary, pri_el, lib, child);
                    self.report.error(
                        Some(pri_ref),
                        Some(lib_ref),
                        format!(
                            "Trying to merge incompatible {} element:\n{}",
                            element_path(primary, pri_el),
                            diff
                        ),
                    );
                }
            }
        }
    }

    fn merge_uses_library(
        &mut self,
        primary: &mut Document,
        lib: &Document,
        child: NodeId,
        pri_app: NodeId,
        appends: &mut Vec<AppendItem>,
    ) {
        let el = lib.element(child).expect("uses-library is an element");
        let Some(name) = el.android_attr("name").map(str::to_string) else {
            self.report.error(
                Some(FileRef::new(&lib.file_id, Some(lib.line(child)))),
                None,
                format!(
                    "Undefined 'name' attribute in {} element.",
                    element_path(lib, child)
                ),
            );
            return;
        };

        // The library's effective flag: absent and invalid both count as
        // required.
        let mut invalid_required = false;
        let lib_required = match el.attr(Some(ANDROID_NS), "required") {
            None => true,
            Some(attr) => match values::parse_required(&attr.value) {
                Some(v) => v,
                None => {
                    self.report.warning(
                        Some(FileRef::new(&lib.file_id, Some(attr.line))),
                        None,
                        format!(
                            "Invalid attribute 'required' in {} element: \
                             expected 'true' or 'false' but found '{}'.",
                            element_path(lib, child),
                            attr.value
                        ),
                    );
                    invalid_required = true;
                    true
                }
            },
        };

        let matches: Vec<NodeId> = primary
            .element_children(pri_app)
            .into_iter()
            .filter(|&c| {
                let pel = primary.element(c).expect("element child");
                pel.qualified_name() == "uses-library"
                    && pel.android_attr("name") == Some(name.as_str())
            })
            .collect();

        if matches.is_empty() {
            appends.push(AppendItem {
                rank: policy::append_rank("uses-library"),
                node: child,
                force_required: invalid_required,
            });
            return;
        }

        if matches.len() > 1 {
            self.report.warning(
                Some(FileRef::new(&primary.file_id, Some(primary.line(matches[0])))),
                Some(FileRef::new(&lib.file_id, Some(lib.line(child)))),
                format!(
                    "Main manifest has more than one {} element.",
                    element_path(primary, matches[0])
                ),
            );
        }

        for m in matches {
            let path = element_path(primary, m);
            let file_id = primary.file_id.clone();
            let Some(attr) = primary
                .element_mut(m)
                .expect("uses-library is an element")
                .attr_mut(Some(ANDROID_NS), "required")
            else {
                continue; // absent means required; nothing to escalate
            };
            match values::parse_required(&attr.value) {
                Some(true) => {}
                Some(false) => {
                    if lib_required {
                        debug!("Escalating required flag of {}", path);
                        attr.value = "true".to_string();
                    }
                }
                None => {
                    let line = attr.line;
                    let found = attr.value.clone();
                    attr.value = "true".to_string();
                    self.report.warning(
                        Some(FileRef::new(&file_id, Some(line))),
                        None,
                        format!(
                            "Invalid attribute 'required' in {} element: \
                             expected 'true' or 'false' but found '{}'.",
                            path, found
                        ),
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // insertion
    // ------------------------------------------------------------------

    fn apply_manifest_appends(
        &mut self,
        primary: &mut Document,
        lib: &Document,
        appends: Vec<TopAppend>,
    ) {
        if appends.is_empty() {
            return;
        }
        let root = primary.root;
        let indent = insertion_indent(primary, root);
        let mut at = insertion_index(primary, root);
        for item in appends {
            let (next, imported) = self.append_with_trivia(primary, lib, item.node, root, at, &indent);
            if item.strip_gl {
                if let Some(el) = primary.element_mut(imported) {
                    el.remove_attr(Some(ANDROID_NS), "glEsVersion");
                }
            }
            at = next;
        }
    }

    fn apply_application_appends(
        &mut self,
        primary: &mut Document,
        lib: &Document,
        pri_app: NodeId,
        mut items: Vec<AppendItem>,
    ) {
        if items.is_empty() {
            return;
        }
        // Stable sort: document order is preserved within each kind.
        items.sort_by_key(|i| i.rank);

        let indent = insertion_indent(primary, pri_app);
        let mut at = insertion_index(primary, pri_app);

        if self.markers {
            let text = primary.push_node(Node {
                parent: Some(pri_app),
                line: 0,
                kind: NodeKind::Text(format!("\n{}", indent)),
            });
            primary.insert_child(pri_app, at, text);
            at += 1;
            let comment = primary.push_node(Node {
                parent: Some(pri_app),
                line: 0,
                kind: NodeKind::Comment(format!(" from @{} ", lib.file_id)),
            });
            primary.insert_child(pri_app, at, comment);
            at += 1;
        }

        for item in items {
            let (next, imported) =
                self.append_with_trivia(primary, lib, item.node, pri_app, at, &indent);
            if item.force_required {
                if let Some(attr) = primary
                    .element_mut(imported)
                    .and_then(|el| el.attr_mut(Some(ANDROID_NS), "required"))
                {
                    attr.value = "true".to_string();
                }
            }
            at = next;
        }
    }

    /// Import a library element with its leading comment block and
    /// whitespace, inserting everything at `at` under `parent`.
    ///
    /// Returns the next insertion index and the imported element's id.
    fn append_with_trivia(
        &mut self,
        primary: &mut Document,
        lib: &Document,
        node: NodeId,
        parent: NodeId,
        mut at: usize,
        indent: &str,
    ) -> (usize, NodeId) {
        // Appending into a childless self-closed parent forces it open.
        if let Some(el) = primary.element_mut(parent) {
            el.self_closing = false;
        }

        let run = trivia::leading_trivia(lib, node);
        let has_line_break = run.first().map_or(false, |&first| {
            matches!(&lib.node(first).kind, NodeKind::Text(t) if t.contains('\n'))
        });
        if !has_line_break {
            let text = primary.push_node(Node {
                parent: Some(parent),
                line: 0,
                kind: NodeKind::Text(format!("\n{}", indent)),
            });
            primary.insert_child(parent, at, text);
            at += 1;
        }
        for &t in &run {
            let imported = primary.import_subtree(lib, t, parent);
            primary.insert_child(parent, at, imported);
            at += 1;
        }

        let imported = primary.import_subtree(lib, node, parent);
        primary.insert_child(parent, at, imported);
        at += 1;
        debug!(
            "Appended {} from {}",
            element_path(primary, imported),
            lib.file_id
        );
        (at, imported)
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// New children go immediately before the whitespace that indents the
/// parent's closing tag, so that formatting stays intact.
fn insertion_index(doc: &Document, parent: NodeId) -> usize {
    let children = doc.children(parent);
    match children.last() {
        Some(&last) if doc.node(last).is_whitespace_text() => children.len() - 1,
        _ => children.len(),
    }
}

/// One level deeper than the parent's closing-tag indentation.
fn insertion_indent(doc: &Document, parent: NodeId) -> String {
    let base = doc
        .children(parent)
        .last()
        .and_then(|&last| match &doc.node(last).kind {
            NodeKind::Text(t) if doc.node(last).is_whitespace_text() => {
                t.rsplit('\n').next().map(str::to_string)
            }
            _ => None,
        })
        .unwrap_or_default();
    format!("{}    ", base)
}
