//! The element-kind table: which manifest children are merged, how they are
//! keyed, and which policy reconciles a collision.
//!
//! The table is process-wide and immutable. Tags without an entry are
//! ignored when they appear in a library; that silently covers
//! `supports-screens`, `uses-configuration`, `compatible-screens`,
//! `supports-gl-texture` and the open set of everything else.

/// Where a merged element lives in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeScope {
    /// Direct child of `/manifest`.
    Manifest,
    /// Direct child of `/manifest/application`.
    Application,
}

/// How a recognized element kind is folded into the main manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Singleton numeric check; the main manifest is never rewritten.
    UsesSdk,
    /// Union by `android:name` with `glEsVersion` comparison and stripping.
    UsesFeature,
    /// Union by `android:name`.
    UsesPermission,
    /// Keyed structural identity: equal duplicates are skipped, unequal
    /// duplicates are errors, absent keys are appended.
    Component,
    /// Union by `android:name` with `required` escalation.
    UsesLibrary,
}

/// A row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct ElementKind {
    pub tag: &'static str,
    pub scope: MergeScope,
    /// Android-namespace local name identifying an element among siblings.
    pub key_attr: Option<&'static str>,
    pub policy: MergePolicy,
}

/// Application-scope rows are listed in the fixed order appended elements
/// are grouped in; `append_rank` relies on this.
pub const ELEMENT_KINDS: &[ElementKind] = &[
    ElementKind {
        tag: "uses-sdk",
        scope: MergeScope::Manifest,
        key_attr: None,
        policy: MergePolicy::UsesSdk,
    },
    ElementKind {
        tag: "uses-feature",
        scope: MergeScope::Manifest,
        key_attr: Some("name"),
        policy: MergePolicy::UsesFeature,
    },
    ElementKind {
        tag: "uses-permission",
        scope: MergeScope::Manifest,
        key_attr: Some("name"),
        policy: MergePolicy::UsesPermission,
    },
    ElementKind {
        tag: "activity",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
    ElementKind {
        tag: "activity-alias",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
    ElementKind {
        tag: "service",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
    ElementKind {
        tag: "receiver",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
    ElementKind {
        tag: "provider",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
    ElementKind {
        tag: "uses-library",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::UsesLibrary,
    },
    ElementKind {
        tag: "meta-data",
        scope: MergeScope::Application,
        key_attr: Some("name"),
        policy: MergePolicy::Component,
    },
];

/// Look up the policy row for a tag in a scope.
pub fn lookup(scope: MergeScope, tag: &str) -> Option<&'static ElementKind> {
    ELEMENT_KINDS.iter().find(|k| k.scope == scope && k.tag == tag)
}

/// Position of an application-scope kind in the fixed append ordering
/// (activity, activity-alias, service, receiver, provider, uses-library,
/// meta-data).
pub fn append_rank(tag: &str) -> usize {
    ELEMENT_KINDS
        .iter()
        .filter(|k| k.scope == MergeScope::Application)
        .position(|k| k.tag == tag)
        .unwrap_or(usize::MAX)
}
