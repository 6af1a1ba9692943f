//! GitHub provider - Interactions with GitHub via the `gh` CLI
//!
//! `gh` picks its credentials up from `GH_TOKEN` or `GITHUB_TOKEN`, so the
//! workflow token needs no extra plumbing.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::{HostingApi, PullRequest, PullRequestIntent};
use crate::error::HostingApiError;
use crate::utils::command::execute_command;

lazy_static! {
    static ref HTTP_STATUS: Regex = Regex::new(r"HTTP (\d{3})").unwrap();
    static ref PR_NUMBER: Regex = Regex::new(r"/pull/(\d+)\s*$").unwrap();
}

/// [`HostingApi`] backed by the `gh` command-line tool
pub struct GhCli {
    repo_owner: String,
    repo_name: String,
}

#[derive(Debug, Deserialize)]
struct RepoView {
    #[serde(rename = "defaultBranchRef")]
    default_branch_ref: BranchRef,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    name: String,
}

impl GhCli {
    /// Create a provider for `owner/name`
    pub fn new(repo_owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
        }
    }

    /// Check if GitHub CLI is installed
    pub fn is_available() -> bool {
        which::which("gh").is_ok()
    }

    /// Get the full repository name (owner/name)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    fn gh(&self, command: &str, args: &[&str]) -> Result<String, HostingApiError> {
        let result = execute_command("gh", args, None).map_err(|e| {
            HostingApiError::CommandFailed {
                command: command.to_string(),
                message: e.to_string(),
            }
        })?;

        if !result.success() {
            return Err(classify_failure(command, result.stderr));
        }
        Ok(result.stdout)
    }
}

#[async_trait]
impl HostingApi for GhCli {
    async fn list_open_pull_requests(
        &self,
        head: &str,
    ) -> Result<Vec<PullRequest>, HostingApiError> {
        let repo = self.full_name();
        let stdout = self.gh(
            "pr list",
            &[
                "pr",
                "list",
                "--repo",
                &repo,
                "--head",
                head,
                "--state",
                "open",
                "--json",
                "number,headRefName,url",
            ],
        )?;

        let prs: Vec<PullRequest> = serde_json::from_str(&stdout).map_err(|e| {
            HostingApiError::CommandFailed {
                command: "pr list".to_string(),
                message: format!("unexpected output: {}", e),
            }
        })?;

        Ok(prs.into_iter().filter(|pr| pr.head_ref == head).collect())
    }

    async fn default_branch(&self) -> Result<String, HostingApiError> {
        let repo = self.full_name();
        let stdout = self.gh(
            "repo view",
            &["repo", "view", &repo, "--json", "defaultBranchRef"],
        )?;

        let view: RepoView =
            serde_json::from_str(&stdout).map_err(|e| HostingApiError::CommandFailed {
                command: "repo view".to_string(),
                message: format!("unexpected output: {}", e),
            })?;

        Ok(view.default_branch_ref.name)
    }

    async fn create_pull_request(
        &self,
        intent: &PullRequestIntent,
    ) -> Result<PullRequest, HostingApiError> {
        let repo = self.full_name();
        // gh allows maintainer edits unless --no-maintainer-edit is passed
        let stdout = self.gh(
            "pr create",
            &[
                "pr",
                "create",
                "--repo",
                &repo,
                "--title",
                &intent.title,
                "--body",
                &intent.body,
                "--head",
                &intent.head_branch,
                "--base",
                &intent.base_branch,
            ],
        )?;

        // Extract PR number from the URL gh prints
        let url = stdout.lines().last().unwrap_or_default().trim().to_string();
        let number = parse_pr_number(&url).ok_or_else(|| HostingApiError::CommandFailed {
            command: "pr create".to_string(),
            message: format!("could not read pull request number from '{}'", url),
        })?;

        Ok(PullRequest {
            number,
            head_ref: intent.head_branch.clone(),
            url: Some(url),
        })
    }
}

/// Turn a failed `gh` invocation into a status error when gh reports one
fn classify_failure(command: &str, stderr: String) -> HostingApiError {
    let status = HTTP_STATUS
        .captures(&stderr)
        .and_then(|caps| caps[1].parse::<u16>().ok());

    match status {
        Some(status) => HostingApiError::from_status(format!("gh {}", command), status, stderr),
        None => HostingApiError::CommandFailed {
            command: command.to_string(),
            message: stderr,
        },
    }
}

fn parse_pr_number(url: &str) -> Option<u64> {
    PR_NUMBER
        .captures(url)
        .and_then(|caps| caps[1].parse().ok())
}
