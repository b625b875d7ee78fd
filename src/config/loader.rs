// Configuration loader - some methods reserved for future use
#![allow(dead_code)]

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a manifest merge job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Merge library manifests; when false the main manifest is copied
    /// through unchanged
    pub enabled: bool,

    /// Insert a `<!-- from @library -->` comment before each library's
    /// contributions
    pub markers: bool,

    /// Library manifests to merge, in order
    pub libraries: Vec<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            markers: true,
            libraries: vec![],
        }
    }
}

impl MergeConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".manifestmerge.yml",
            ".manifestmerge.yaml",
            ".manifestmerge.toml",
            "manifestmerge.yml",
            "manifestmerge.yaml",
            "manifestmerge.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }
}
