//! Watch mode for manifestmerge
//!
//! This module provides functionality for continuously monitoring the input
//! manifests and re-running the merge automatically.

#![allow(dead_code)] // Builder pattern methods for future configuration

use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

/// Watch mode errors
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    WatcherError(#[from] notify::Error),
    #[error("Failed to receive events: {0}")]
    RecvError(#[from] std::sync::mpsc::RecvError),
}

/// File watcher for continuous merging
pub struct FileWatcher {
    /// Debounce duration in milliseconds
    debounce_ms: u64,
}

impl FileWatcher {
    /// Create a new file watcher with default settings
    pub fn new() -> Self {
        Self { debounce_ms: 500 }
    }

    /// Set debounce duration
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Check if a changed path is one of the watched manifests
    fn should_trigger(&self, path: &Path, watched: &[PathBuf]) -> bool {
        watched.iter().any(|w| {
            w == path || (path.file_name() == w.file_name() && path.ends_with(w))
        })
    }

    /// Watch the given manifest files and call the callback on changes
    pub fn watch<F>(&self, files: &[PathBuf], mut on_change: F) -> Result<(), WatchError>
    where
        F: FnMut() -> bool, // Returns false to stop watching
    {
        let (tx, rx) = channel();

        // Create debounced watcher
        let mut debouncer = new_debouncer(Duration::from_millis(self.debounce_ms), tx)?;

        // Watching the parent directories survives editors that replace
        // files instead of writing in place.
        let mut dirs: Vec<&Path> = files
            .iter()
            .filter_map(|f| f.parent())
            .collect();
        dirs.sort();
        dirs.dedup();
        for dir in dirs {
            debouncer.watcher().watch(dir, RecursiveMode::NonRecursive)?;
        }

        println!();
        println!("{}", "Watch mode active. Press Ctrl+C to stop.".cyan().bold());
        for file in files {
            println!("{}", format!("   Watching: {}", file.display()).dimmed());
        }
        println!();

        // Run initial merge
        if !on_change() {
            return Ok(());
        }

        // Event loop
        loop {
            match rx.recv() {
                Ok(result) => match result {
                    Ok(events) => {
                        let relevant: Vec<_> = events
                            .iter()
                            .filter(|e| {
                                matches!(
                                    e.kind,
                                    DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                                ) && self.should_trigger(&e.path, files)
                            })
                            .collect();

                        if !relevant.is_empty() {
                            println!();
                            println!(
                                "{}",
                                format!(
                                    "Changes detected in {} file(s), re-merging...",
                                    relevant.len()
                                )
                                .yellow()
                            );
                            if !on_change() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("{}: {:?}", "Watch error".red(), e);
                    }
                },
                Err(e) => {
                    return Err(WatchError::RecvError(e));
                }
            }
        }

        Ok(())
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}
