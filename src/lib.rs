//! manifestmerge - AndroidManifest.xml merging for application build pipelines
//!
//! This library folds the declared components of library manifests into an
//! application's manifest ahead of packaging, so that runtime registration
//! does not require manual copy-paste.
//!
//! # Architecture
//!
//! The merge pipeline consists of:
//! 1. **Reading** - Parse manifests into trivia-preserving document trees
//! 2. **Policy lookup** - Map each recognized element kind to its merge rule
//! 3. **Merging** - Fold library elements into the main tree in place
//! 4. **Reporting** - Emit structured diagnostics in a stable textual form
//! 5. **Writing** - Serialize the merged tree, formatting intact
//!
//! The main manifest is law: its formatting is never disturbed, conflicts are
//! reported rather than resolved, and `minSdkVersion`/`glEsVersion` are never
//! rewritten.

pub mod config;
pub mod depfile;
pub mod merge;
pub mod report;
pub mod watch;
pub mod xml;

pub use config::MergeConfig;
pub use depfile::{Depfile, FileStamp};
pub use merge::{element_path, semantically_equal, MergeEngine};
pub use report::{Diagnostic, FileRef, MergeReport, ReportFormat, Reporter, Severity};
pub use watch::FileWatcher;
pub use xml::{read_document, write_document, Document, NodeId};
