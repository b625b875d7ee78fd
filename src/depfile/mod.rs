//! Dependency fingerprint for incremental builds
//!
//! A build driver records the merge inputs after a successful run; on the
//! next run the merge is skipped when no input changed and the output still
//! exists. The engine itself stays purely functional on its inputs.

#![allow(dead_code)] // Fingerprint infrastructure for build-tool integration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Dependency file errors
#[derive(Error, Debug)]
pub enum DepfileError {
    #[error("Failed to read dependency file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse dependency file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Dependency file version mismatch")]
    VersionMismatch,
}

/// Current dependency file format version
const DEPFILE_VERSION: u32 = 1;

/// Recorded state of one input file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileStamp {
    /// File modification time (as seconds since UNIX epoch)
    pub mtime: u64,
    /// File size in bytes
    pub size: u64,
    /// Content hash (first 16 hex digits)
    pub content_hash: String,
}

impl FileStamp {
    /// Create a stamp from a file path
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let size = metadata.len();

        let content = fs::read(path)?;
        let hash = Self::compute_hash(&content);

        Ok(Self {
            mtime,
            size,
            content_hash: hash,
        })
    }

    /// Quick check if file might have changed (fast path)
    pub fn quick_changed(&self, path: &Path) -> bool {
        if let Ok(metadata) = fs::metadata(path) {
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            mtime != self.mtime || metadata.len() != self.size
        } else {
            true // File doesn't exist, consider changed
        }
    }

    /// Full check with content hash (slow path, only if quick check fails)
    pub fn content_changed(&self, path: &Path) -> bool {
        if let Ok(content) = fs::read(path) {
            Self::compute_hash(&content) != self.content_hash
        } else {
            true
        }
    }

    fn compute_hash(content: &[u8]) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// Fingerprint of one merge job: output path plus every input's stamp
#[derive(Debug, Serialize, Deserialize)]
pub struct Depfile {
    version: u32,
    output: PathBuf,
    inputs: BTreeMap<PathBuf, FileStamp>,
}

impl Depfile {
    /// Stamp the given inputs for an output
    pub fn capture(output: &Path, inputs: &[PathBuf]) -> Result<Self, DepfileError> {
        let mut stamped = BTreeMap::new();
        for input in inputs {
            stamped.insert(input.clone(), FileStamp::from_path(input)?);
        }
        Ok(Self {
            version: DEPFILE_VERSION,
            output: output.to_path_buf(),
            inputs: stamped,
        })
    }

    /// Load a fingerprint from disk
    pub fn load(path: &Path) -> Result<Self, DepfileError> {
        let contents = fs::read_to_string(path)?;
        let depfile: Depfile = serde_json::from_str(&contents)?;
        if depfile.version != DEPFILE_VERSION {
            return Err(DepfileError::VersionMismatch);
        }
        Ok(depfile)
    }

    /// Persist the fingerprint to disk
    pub fn save(&self, path: &Path) -> Result<(), DepfileError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// True when the output exists, the input set is unchanged, and no
    /// input's content changed since the fingerprint was taken.
    pub fn is_up_to_date(&self, output: &Path, inputs: &[PathBuf]) -> bool {
        if self.output.as_path() != output || !output.exists() {
            return false;
        }
        if self.inputs.len() != inputs.len() {
            return false;
        }
        for input in inputs {
            let Some(stamp) = self.inputs.get(input) else {
                return false;
            };
            if stamp.quick_changed(input) && stamp.content_changed(input) {
                return false;
            }
        }
        true
    }
}
