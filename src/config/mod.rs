//! Configuration module

pub mod loader;

pub use loader::{ActionInputs, Config};

use std::str::FromStr;

use crate::publish::templates;
use crate::vcs::Signature;

/// Patterns the scanners leave alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Action names (`owner/repo[/path]`)
    pub actions: Vec<String>,
    /// Branch names an action may point at
    pub branches: Vec<String>,
    /// Image names
    pub images: Vec<String>,
    /// Image tags
    pub tags: Vec<String>,
}

/// Which binding talks to the hosting API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostingBackend {
    /// GitHub REST API through octocrab
    #[default]
    Api,
    /// The `gh` command-line tool
    GhCli,
}

impl FromStr for HostingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(HostingBackend::Api),
            "gh-cli" | "gh" => Ok(HostingBackend::GhCli),
            other => Err(format!("unknown backend '{}', expected api or gh-cli", other)),
        }
    }
}

/// Settings of the publication sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// The one branch every run force-pushes to
    pub branch_name: String,
    /// Author and committer of the commit
    pub author: Signature,
    /// Pull request title
    pub title: String,
    /// Pull request body
    pub body: String,
    /// Commit message when more than one file changed
    pub summary_message: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            branch_name: "frizbee-action-patch".to_string(),
            author: Signature::new(
                "github-actions[bot]",
                "github-actions[bot]@users.noreply.github.com",
            ),
            title: templates::PR_TITLE.to_string(),
            body: templates::pull_request_body(),
            summary_message: "frizbee: pin images and actions to commit hash".to_string(),
        }
    }
}

impl PublishSettings {
    /// Commit message for the staged paths
    pub fn commit_message(&self, paths: &[&str]) -> String {
        match paths {
            [single] => format!("Update {} by pinning its image references", single),
            _ => self.summary_message.clone(),
        }
    }
}
