//! Scan results and their aggregation
//!
//! A [`ScanResult`] is what one scanner invocation reports: the files it
//! looked at and the rewritten content of those it would change. The run
//! folds every result into a single [`UnifiedResult`] with [`merge`] before
//! anything is applied.

mod merge;

pub use merge::{merge, ConflictingRewrite, MergeOutcome};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Output of a single scanner invocation
///
/// Paths are repository-relative and use `/` separators on every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Files the scanner looked at
    pub processed: BTreeSet<String>,
    /// New content for the files the scanner would rewrite
    pub modified: BTreeMap<String, String>,
}

impl ScanResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file as processed
    pub fn add_processed(&mut self, path: impl Into<String>) {
        self.processed.insert(path.into());
    }

    /// Record new content for a file, marking it processed as well
    pub fn add_modified(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        self.processed.insert(path.clone());
        self.modified.insert(path, content.into());
    }
}

/// All scan results of a run folded together
///
/// Same shape as [`ScanResult`]; kept as its own type so the applier and the
/// publication controller only ever receive the finalized view. Only
/// [`merge`] builds one with content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedResult {
    processed: BTreeSet<String>,
    modified: BTreeMap<String, String>,
    #[serde(skip)]
    published: bool,
}

impl UnifiedResult {
    /// Create an empty unified result
    pub fn new() -> Self {
        Self::default()
    }

    /// Files processed by any scanner, sorted
    pub fn processed(&self) -> &BTreeSet<String> {
        &self.processed
    }

    /// Rewritten content per modified file, sorted by path
    pub fn modified(&self) -> &BTreeMap<String, String> {
        &self.modified
    }

    /// Check if any file would change
    pub fn has_modifications(&self) -> bool {
        !self.modified.is_empty()
    }

    /// Whether the publication sequence completed for this result
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Mark the publication sequence as completed
    pub fn mark_published(&mut self) {
        self.published = true;
    }
}
