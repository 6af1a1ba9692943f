//! GitHub provider - Interactions with the GitHub REST API via octocrab

use async_trait::async_trait;
use octocrab::params;
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

use super::{HostingApi, PullRequest, PullRequestIntent};
use crate::error::{HostingApiError, HostingApiErrorKind, ResolveError};
use crate::scanner::{ActionRef, ActionResolver, RefKind, ResolvedRef};

/// GitHub API client for one repository
pub struct GitHubApi {
    client: Octocrab,
    repo_owner: String,
    repo_name: String,
}

/// Response of `GET /repos/{owner}/{repo}/git/ref/{ref}` and `/git/tags/{sha}`
#[derive(Debug, Deserialize)]
struct GitObjectResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GitHubApi {
    /// Create a client authenticated with `token`
    ///
    /// An empty token gives an anonymous client, enough to resolve public
    /// action tags. `api_url` points the client at a GitHub Enterprise
    /// Server instead of api.github.com.
    pub fn new(
        token: Option<String>,
        api_url: Option<&str>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
    ) -> Result<Self, HostingApiError> {
        let mut builder = Octocrab::builder();
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| map_octocrab_error("build client", e))?;
        }

        let client = match token.filter(|t| !t.is_empty()) {
            Some(token) => builder.personal_token(token).build(),
            None => builder.build(),
        }
        .map_err(|e| map_octocrab_error("build client", e))?;

        Ok(Self::with_client(client, repo_owner, repo_name))
    }

    /// Wrap an existing client
    pub fn with_client(
        client: Octocrab,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
        }
    }

    /// Get the full repository name (owner/name)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    /// Look up `ref_path` (`tags/v4`, `heads/main`) in `owner/repo`
    async fn git_ref(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<Option<GitObject>, HostingApiError> {
        let route = format!("/repos/{}/{}/git/ref/{}", owner, repo, ref_path);
        match self.client.get::<GitObjectResponse, _, ()>(&route, None).await {
            Ok(response) => Ok(Some(response.object)),
            Err(e) => {
                let err = map_octocrab_error("get git ref", e);
                if err.kind() == HostingApiErrorKind::NotFound {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Follow annotated tag objects down to the commit they tag
    async fn peel_tag(
        &self,
        owner: &str,
        repo: &str,
        mut object: GitObject,
    ) -> Result<String, HostingApiError> {
        while object.kind == "tag" {
            let route = format!("/repos/{}/{}/git/tags/{}", owner, repo, object.sha);
            let response = self
                .client
                .get::<GitObjectResponse, _, ()>(&route, None)
                .await
                .map_err(|e| map_octocrab_error("get annotated tag", e))?;
            object = response.object;
        }
        Ok(object.sha)
    }
}

#[async_trait]
impl HostingApi for GitHubApi {
    async fn list_open_pull_requests(
        &self,
        head: &str,
    ) -> Result<Vec<PullRequest>, HostingApiError> {
        let page = self
            .client
            .pulls(&self.repo_owner, &self.repo_name)
            .list()
            .state(params::State::Open)
            .head(format!("{}:{}", self.repo_owner, head))
            .per_page(100)
            .send()
            .await
            .map_err(|e| map_octocrab_error("list pull requests", e))?;

        // The head filter is advisory on forks, so check the ref as well
        Ok(page
            .items
            .into_iter()
            .filter(|pr| pr.head.ref_field == head)
            .map(|pr| PullRequest {
                number: pr.number,
                head_ref: pr.head.ref_field.clone(),
                url: pr.html_url.map(|u| u.to_string()),
            })
            .collect())
    }

    async fn default_branch(&self) -> Result<String, HostingApiError> {
        let repository = self
            .client
            .repos(&self.repo_owner, &self.repo_name)
            .get()
            .await
            .map_err(|e| map_octocrab_error("get repository", e))?;

        repository.default_branch.ok_or_else(|| {
            HostingApiError::from_status(
                "get repository",
                404,
                format!("{} has no default branch", self.full_name()),
            )
        })
    }

    async fn create_pull_request(
        &self,
        intent: &PullRequestIntent,
    ) -> Result<PullRequest, HostingApiError> {
        let pr = self
            .client
            .pulls(&self.repo_owner, &self.repo_name)
            .create(&intent.title, &intent.head_branch, &intent.base_branch)
            .body(&intent.body)
            .maintainer_can_modify(true)
            .send()
            .await
            .map_err(|e| map_octocrab_error("create pull request", e))?;

        Ok(PullRequest {
            number: pr.number,
            head_ref: pr.head.ref_field.clone(),
            url: pr.html_url.map(|u| u.to_string()),
        })
    }
}

#[async_trait]
impl ActionResolver for GitHubApi {
    async fn resolve(&self, action: &ActionRef) -> Result<Option<ResolvedRef>, ResolveError> {
        let (owner, repo) = (action.owner.as_str(), action.repo.as_str());

        if let Some(object) = self
            .git_ref(owner, repo, &format!("tags/{}", action.reference))
            .await?
        {
            let sha = self.peel_tag(owner, repo, object).await?;
            debug!(action = %action.name, reference = %action.reference, sha = %sha, "Resolved tag");
            return Ok(Some(ResolvedRef {
                sha,
                kind: RefKind::Tag,
            }));
        }

        if let Some(object) = self
            .git_ref(owner, repo, &format!("heads/{}", action.reference))
            .await?
        {
            debug!(action = %action.name, reference = %action.reference, sha = %object.sha, "Resolved branch");
            return Ok(Some(ResolvedRef {
                sha: object.sha,
                kind: RefKind::Branch,
            }));
        }

        Ok(None)
    }
}

/// Map an octocrab error onto the hosting API taxonomy
fn map_octocrab_error(operation: &str, error: octocrab::Error) -> HostingApiError {
    match error {
        octocrab::Error::GitHub { source, .. } => HostingApiError::from_status(
            operation,
            source.status_code.as_u16(),
            source.message.clone(),
        ),
        other => HostingApiError::Transport {
            operation: operation.to_string(),
            message: other.to_string(),
        },
    }
}
