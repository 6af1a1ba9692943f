//! # Providers Module
//!
//! This module handles integrations with external services: the hosting API
//! that receives pull requests and the registries that resolve references.
//!
//! ## Hosting API
//!
//! [`HostingApi`] is what the publication controller needs from the code
//! host. Two bindings exist:
//!
//! - [`github::GitHubApi`] talks to the GitHub REST API through `octocrab`
//!   and authenticates with the workflow token. It also resolves action tags
//!   to commits for the actions scanner.
//! - [`gh_cli::GhCli`] runs the `gh` command-line tool, for runners where it
//!   is already installed and authenticated.
//!
//! ## Registries
//!
//! [`registry::RegistryResolver`] resolves container image tags to manifest
//! digests over the OCI distribution API.

pub mod gh_cli;
pub mod github;
pub mod registry;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::HostingApiError;

pub use gh_cli::GhCli;
pub use github::GitHubApi;
pub use registry::RegistryResolver;

/// An open pull request as reported by the hosting API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(rename = "headRefName")]
    pub head_ref: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Everything needed to open the pull request of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestIntent {
    /// The fixed branch carrying the pinned references
    pub branch_name: String,
    pub title: String,
    pub body: String,
    /// Branch the pull request targets
    pub base_branch: String,
    /// Branch the pull request merges from
    pub head_branch: String,
}

/// Pull request operations of the code host
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Open pull requests whose head branch is `head`
    async fn list_open_pull_requests(&self, head: &str)
        -> Result<Vec<PullRequest>, HostingApiError>;

    /// The repository's default branch
    async fn default_branch(&self) -> Result<String, HostingApiError>;

    /// Open a pull request, returning it
    async fn create_pull_request(
        &self,
        intent: &PullRequestIntent,
    ) -> Result<PullRequest, HostingApiError>;
}
