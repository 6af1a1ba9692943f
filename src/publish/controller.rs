//! Commit, push and pull request sequence

use tracing::{debug, info};

use super::decision::PublicationDecision;
use crate::apply::ApplyReport;
use crate::config::PublishSettings;
use crate::error::{FrizbeeError, PublishStep};
use crate::providers::{HostingApi, PullRequest, PullRequestIntent};
use crate::results::UnifiedResult;
use crate::vcs::VersionControl;

/// How a publication ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A pull request for the branch was already open
    AlreadyOpen(PullRequest),
    /// A new pull request was opened
    Created(PullRequest),
}

impl PublishOutcome {
    /// The pull request the branch is proposed through
    pub fn pull_request(&self) -> &PullRequest {
        match self {
            PublishOutcome::AlreadyOpen(pr) | PublishOutcome::Created(pr) => pr,
        }
    }
}

/// Drives the publication sequence of a run
///
/// The branch is force-pushed on every run, so two runs against the same
/// repository at the same time would overwrite each other's branch.
pub struct PublicationController<'a> {
    vcs: &'a dyn VersionControl,
    hosting: &'a dyn HostingApi,
    settings: &'a PublishSettings,
}

impl<'a> PublicationController<'a> {
    /// Create a controller over the two collaborators
    pub fn new(
        vcs: &'a dyn VersionControl,
        hosting: &'a dyn HostingApi,
        settings: &'a PublishSettings,
    ) -> Self {
        Self {
            vcs,
            hosting,
            settings,
        }
    }

    /// Act on `decision`
    ///
    /// Publishes when the decision asks for it, then fails with
    /// [`FrizbeeError::UnpinnedFound`] when the decision is fail-fast.
    pub async fn execute(
        &self,
        decision: PublicationDecision,
        result: &mut UnifiedResult,
        report: &ApplyReport,
    ) -> Result<Option<PublishOutcome>, FrizbeeError> {
        debug!(decision = ?decision, "Publication decision");

        let mut outcome = None;
        if decision.publishes() {
            if report.has_staged_changes() {
                outcome = Some(self.publish(result, report).await?);
            } else {
                info!("Dry run, skipping commit, push and pull request");
            }
        }

        if decision.fails() {
            return Err(FrizbeeError::UnpinnedFound);
        }
        Ok(outcome)
    }

    /// Commit the staged files, push them and make sure a pull request is open
    pub async fn publish(
        &self,
        result: &mut UnifiedResult,
        report: &ApplyReport,
    ) -> Result<PublishOutcome, FrizbeeError> {
        let branch = self.settings.branch_name.as_str();

        let message = self.settings.commit_message(&report.written_paths());
        let commit = self
            .vcs
            .commit(&message, &self.settings.author)
            .map_err(|e| FrizbeeError::at_step(PublishStep::Commit, e))?;
        debug!(commit = %commit, "Committed changes");

        self.vcs
            .push(branch, true)
            .map_err(|e| FrizbeeError::at_step(PublishStep::Push, e))?;
        info!(branch, "Branch {} pushed successfully", branch);

        let open = self
            .hosting
            .list_open_pull_requests(branch)
            .await
            .map_err(|e| FrizbeeError::at_step(PublishStep::ListPullRequests, e))?;
        if let Some(existing) = open.into_iter().next() {
            info!(number = existing.number, "PR {} already exists", existing.number);
            result.mark_published();
            return Ok(PublishOutcome::AlreadyOpen(existing));
        }

        let base_branch = self
            .hosting
            .default_branch()
            .await
            .map_err(|e| FrizbeeError::at_step(PublishStep::DefaultBranch, e))?;

        let intent = PullRequestIntent {
            branch_name: branch.to_string(),
            title: self.settings.title.clone(),
            body: self.settings.body.clone(),
            base_branch,
            head_branch: branch.to_string(),
        };
        let created = self
            .hosting
            .create_pull_request(&intent)
            .await
            .map_err(|e| FrizbeeError::at_step(PublishStep::CreatePullRequest, e))?;
        info!(number = created.number, "PR {} created successfully", created.number);

        result.mark_published();
        Ok(PublishOutcome::Created(created))
    }
}
