//! Folding scan results into the unified result

use std::path::{Component, Path};

use super::{ScanResult, UnifiedResult};
use crate::error::FrizbeeError;

/// Two scans produced different content for the same file
///
/// The later scan wins. This only happens when scan scopes overlap, which
/// the run reports but does not treat as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingRewrite {
    /// Repository-relative path both scans rewrote
    pub path: String,
}

impl std::fmt::Display for ConflictingRewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' was rewritten differently by two scans, keeping the later rewrite",
            self.path
        )
    }
}

/// Result of [`merge`]
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The accumulator with the incoming result folded in
    pub result: UnifiedResult,
    /// One entry per path whose rewrite was replaced by different content
    pub conflicts: Vec<ConflictingRewrite>,
}

/// Fold `incoming` into `accumulator`
///
/// `processed` becomes the set union and `modified` the key union, with the
/// incoming content winning on collision. Pure: the caller decides how to
/// report the returned conflicts.
///
/// # Errors
///
/// Returns [`FrizbeeError::InvalidScanResult`] if `incoming` breaks the
/// result contract: a modified path missing from `processed`, or a path that
/// is empty, absolute, escapes the repository or uses `\` separators.
pub fn merge(
    mut accumulator: UnifiedResult,
    incoming: ScanResult,
) -> Result<MergeOutcome, FrizbeeError> {
    validate(&incoming)?;

    let ScanResult {
        processed,
        modified,
    } = incoming;

    accumulator.processed.extend(processed);

    let mut conflicts = Vec::new();
    for (path, content) in modified {
        if let Some(previous) = accumulator.modified.get(&path) {
            if *previous != content {
                conflicts.push(ConflictingRewrite { path: path.clone() });
            }
        }
        accumulator.modified.insert(path, content);
    }

    Ok(MergeOutcome {
        result: accumulator,
        conflicts,
    })
}

fn validate(result: &ScanResult) -> Result<(), FrizbeeError> {
    for path in &result.processed {
        if let Some(reason) = path_problem(path) {
            return Err(invalid(path, reason));
        }
    }

    for path in result.modified.keys() {
        if !result.processed.contains(path) {
            return Err(invalid(path, "modified file was not reported as processed"));
        }
    }

    Ok(())
}

fn path_problem(path: &str) -> Option<&'static str> {
    if path.is_empty() {
        return Some("empty path");
    }
    if path.contains('\\') {
        return Some("path must use '/' separators");
    }
    if path.starts_with('/') {
        return Some("path must be repository-relative");
    }
    let escapes = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Some("path escapes the repository");
    }
    None
}

fn invalid(path: &str, reason: &str) -> FrizbeeError {
    FrizbeeError::InvalidScanResult {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
