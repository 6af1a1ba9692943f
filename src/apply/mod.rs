//! Change applier - Writes rewritten files into the working tree
//!
//! Given the unified result of a run, the applier either writes every
//! modified file and stages it, or, in dry-run mode, only reports a diff of
//! what would change. Files that were processed but not modified are never
//! touched.
//!
//! Application is all-or-nothing: the first failed write or stage aborts the
//! remaining ones.

use std::io::Write;

use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::error::{ApplyError, VcsError};
use crate::results::UnifiedResult;
use crate::vcs::VersionControl;

/// Options for [`ChangeApplier::apply`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Report changes without touching the working tree
    pub dry_run: bool,
}

/// What happened to one modified file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyEntry {
    /// Repository-relative path
    pub path: String,
    /// Whether the file was written and staged, `false` in dry-run mode
    pub written: bool,
    /// Unified diff against the current content, dry-run only
    pub diff: Option<String>,
}

/// Outcome of applying a unified result
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    entries: Vec<ApplyEntry>,
}

impl ApplyReport {
    /// Entries in path order
    pub fn entries(&self) -> &[ApplyEntry] {
        &self.entries
    }

    /// Paths that were written and staged
    pub fn written_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.written)
            .map(|e| e.path.as_str())
            .collect()
    }

    /// Whether anything was staged, i.e. whether a commit is needed
    pub fn has_staged_changes(&self) -> bool {
        self.entries.iter().any(|e| e.written)
    }
}

/// Applies rewritten content through a [`VersionControl`]
pub struct ChangeApplier<'a> {
    vcs: &'a dyn VersionControl,
}

impl<'a> ChangeApplier<'a> {
    /// Create a new applier writing through `vcs`
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self { vcs }
    }

    /// Apply every modified file of `unified`
    ///
    /// # Errors
    ///
    /// Returns the first write or stage failure; files after it are left
    /// untouched.
    pub fn apply(
        &self,
        unified: &UnifiedResult,
        options: ApplyOptions,
    ) -> Result<ApplyReport, ApplyError> {
        let mut report = ApplyReport::default();

        for (path, content) in unified.modified() {
            let entry = if options.dry_run {
                self.preview(path, content)
            } else {
                self.write(path, content)?;
                ApplyEntry {
                    path: path.clone(),
                    written: true,
                    diff: None,
                }
            };
            report.entries.push(entry);
        }

        info!(
            files = report.entries.len(),
            dry_run = options.dry_run,
            "Applied changes"
        );
        Ok(report)
    }

    fn preview(&self, path: &str, content: &str) -> ApplyEntry {
        let diff = match self.vcs.read(path) {
            Ok(current) => {
                let current = current.unwrap_or_default();
                let diff = TextDiff::from_lines(current.as_str(), content)
                    .unified_diff()
                    .context_radius(3)
                    .header(&format!("a/{}", path), &format!("b/{}", path))
                    .to_string();
                Some(diff)
            }
            Err(e) => {
                warn!(path = path, error = %e, "Could not read current content for diff");
                None
            }
        };

        ApplyEntry {
            path: path.to_string(),
            written: false,
            diff,
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<(), ApplyError> {
        debug!(path = path, "Writing file");
        let write_error = |source| ApplyError::Write {
            path: path.to_string(),
            source,
        };

        let mut writer = self.vcs.open_for_overwrite(path).map_err(write_error)?;
        writer
            .write_all(content.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|source| {
                write_error(VcsError::Io {
                    path: path.to_string(),
                    source,
                })
            })?;
        drop(writer);

        self.vcs.stage(path).map_err(|source| ApplyError::Stage {
            path: path.to_string(),
            source,
        })
    }
}
