//! Scanner module - Finding and rewriting unpinned references
//!
//! Every scan category implements [`Scanner`]: given a path below the
//! repository root it reports which files it processed and the rewritten
//! content of the files it would change. Scanners never write to the tree.
//!
//! - [`actions::ActionsScanner`] pins `uses:` references in workflows
//! - [`images::ImagesScanner`] pins container images in Dockerfiles,
//!   Kubernetes manifests and compose files

pub mod actions;
mod filesystem;
pub mod images;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ScanError;
use crate::results::ScanResult;

pub use actions::{ActionRef, ActionResolver, ActionsScanner, RefKind, ResolvedRef};
pub use filesystem::walk_path;
pub use images::{DigestResolver, ImageRef, ImagesScanner};

/// Source categories, in the order a run scans them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScanCategory {
    Actions,
    Dockerfiles,
    Kubernetes,
    DockerCompose,
}

impl ScanCategory {
    /// Get the category name
    pub fn name(&self) -> &'static str {
        match self {
            ScanCategory::Actions => "actions",
            ScanCategory::Dockerfiles => "dockerfiles",
            ScanCategory::Kubernetes => "kubernetes",
            ScanCategory::DockerCompose => "docker-compose",
        }
    }
}

impl std::fmt::Display for ScanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A scanner for one category of references
#[async_trait]
pub trait Scanner: Send + Sync {
    /// The category this scanner covers
    fn category(&self) -> ScanCategory;

    /// Scan `path`, relative to the repository root
    async fn scan(&self, path: &str) -> Result<ScanResult, ScanError>;
}

/// Compile exclusion patterns into a glob set
///
/// Patterns are globs, so a plain name only matches itself.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ScanError::InvalidPattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}
