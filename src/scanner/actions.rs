//! GitHub Actions `uses:` reference pinning

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use globset::GlobSet;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use super::{build_globset, filesystem, ScanCategory, Scanner};
use crate::error::{ResolveError, ScanError};
use crate::results::ScanResult;

lazy_static! {
    static ref USES_LINE: Regex = Regex::new(
        r#"^(?P<prefix>\s*(?:-\s+)?uses:\s*)(?P<open>["']?)(?P<action>[^@\s"']+)@(?P<reference>[^\s"'#]+)(?P<close>["']?)(?P<rest>.*)$"#
    )
    .unwrap();
    static ref COMMIT_SHA: Regex = Regex::new(r"^[0-9a-f]{40}$").unwrap();
}

/// An action reference as written in a workflow (`owner/repo[/path]@ref`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionRef {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Full action name, including any sub-path
    pub name: String,
    /// Tag, branch or commit the workflow refers to
    pub reference: String,
}

impl ActionRef {
    /// Parse `owner/repo[/path]` and a reference
    ///
    /// Returns `None` for local actions (`./…`) and `docker://` images.
    pub fn parse(action: &str, reference: &str) -> Option<Self> {
        if action.starts_with("./") || action.starts_with("docker://") {
            return None;
        }
        let mut parts = action.split('/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            name: action.to_string(),
            reference: reference.to_string(),
        })
    }

    /// Whether the reference is already a full commit sha
    pub fn is_pinned(&self) -> bool {
        COMMIT_SHA.is_match(&self.reference)
    }
}

/// Whether a reference names a tag or a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    Branch,
}

/// A reference resolved to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub sha: String,
    pub kind: RefKind,
}

/// Resolves action references to commits
#[async_trait]
pub trait ActionResolver: Send + Sync {
    /// Resolve `action.reference`, `None` if the repository has no such ref
    async fn resolve(&self, action: &ActionRef) -> Result<Option<ResolvedRef>, ResolveError>;
}

/// Exclusions applied to action references
#[derive(Debug, Clone)]
pub struct ActionExclusions {
    actions: GlobSet,
    branches: GlobSet,
}

impl ActionExclusions {
    /// Compile the excluded action names and branch names
    pub fn new(actions: &[String], branches: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            actions: build_globset(actions)?,
            branches: build_globset(branches)?,
        })
    }

    fn excludes_action(&self, action: &ActionRef) -> bool {
        self.actions.is_match(&action.name)
            || self.actions.is_match(format!("{}/{}", action.owner, action.repo))
    }

    fn excludes_branch(&self, branch: &str) -> bool {
        self.branches.is_match(branch)
    }
}

/// Pins `uses:` references in workflow files to commit shas
pub struct ActionsScanner {
    root: PathBuf,
    resolver: Arc<dyn ActionResolver>,
    exclusions: ActionExclusions,
}

impl ActionsScanner {
    /// Create a new scanner for the repository at `root`
    pub fn new(
        root: impl Into<PathBuf>,
        resolver: Arc<dyn ActionResolver>,
        exclusions: ActionExclusions,
    ) -> Self {
        Self {
            root: root.into(),
            resolver,
            exclusions,
        }
    }

    /// Rewrite the `uses:` lines of one workflow, `None` if nothing changed
    async fn rewrite(
        &self,
        path: &str,
        content: &str,
        cache: &mut HashMap<ActionRef, Option<ResolvedRef>>,
    ) -> Option<String> {
        let mut changed = false;
        let mut output = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            match self.rewrite_line(path, body, cache).await {
                Some(new_body) => {
                    changed = true;
                    output.push_str(&new_body);
                }
                None => output.push_str(body),
            }
            output.push_str(ending);
        }

        changed.then_some(output)
    }

    async fn rewrite_line(
        &self,
        path: &str,
        line: &str,
        cache: &mut HashMap<ActionRef, Option<ResolvedRef>>,
    ) -> Option<String> {
        let caps = USES_LINE.captures(line)?;
        let action = ActionRef::parse(&caps["action"], &caps["reference"])?;

        if action.is_pinned() {
            return None;
        }
        if self.exclusions.excludes_action(&action) {
            debug!(action = %action.name, "Action excluded");
            return None;
        }

        let cached = cache.get(&action).cloned();
        let resolved = match cached {
            Some(cached) => cached,
            None => {
                let resolved = match self.resolver.resolve(&action).await {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        warn!(
                            file = path,
                            action = %action.name,
                            reference = %action.reference,
                            error = %e,
                            "Failed to resolve action reference"
                        );
                        None
                    }
                };
                cache.insert(action.clone(), resolved.clone());
                resolved
            }
        }?;

        if resolved.kind == RefKind::Branch && self.exclusions.excludes_branch(&action.reference) {
            debug!(action = %action.name, branch = %action.reference, "Branch reference excluded");
            return None;
        }

        // Anything after the reference, including a comment, follows the new ref comment
        let rest = caps["rest"].trim();
        let trailing = if rest.is_empty() {
            String::new()
        } else {
            format!(" {}", rest)
        };

        Some(format!(
            "{}{}{}@{}{} # {}{}",
            &caps["prefix"],
            &caps["open"],
            action.name,
            resolved.sha,
            &caps["close"],
            action.reference,
            trailing
        ))
    }
}

#[async_trait]
impl Scanner for ActionsScanner {
    fn category(&self) -> ScanCategory {
        ScanCategory::Actions
    }

    async fn scan(&self, path: &str) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::new();
        let mut cache = HashMap::new();

        for file in filesystem::walk_path(&self.root, path)? {
            if !is_yaml(&file) {
                continue;
            }

            let content = std::fs::read_to_string(self.root.join(&file)).map_err(|source| {
                ScanError::FileRead {
                    path: file.clone(),
                    source,
                }
            })?;

            match self.rewrite(&file, &content, &mut cache).await {
                Some(rewritten) => result.add_modified(file, rewritten),
                None => result.add_processed(file),
            }
        }

        Ok(result)
    }
}

pub(crate) fn is_yaml(path: &str) -> bool {
    path.ends_with(".yml") || path.ends_with(".yaml")
}

/// Split a line into its body and its `\n` / `\r\n` ending
pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
