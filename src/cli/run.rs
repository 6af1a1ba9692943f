//! Run command - Wire the collaborators and execute one run

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use super::exit_codes;
use crate::config::{ActionInputs, Config, HostingBackend, PublishSettings};
use crate::orchestrator::{RunOrchestrator, RunOutcome};
use crate::providers::{GhCli, GitHubApi, HostingApi, RegistryResolver};
use crate::scanner::actions::ActionExclusions;
use crate::scanner::images::ImageExclusions;
use crate::scanner::{ActionsScanner, ImagesScanner, ScanCategory};
use crate::vcs::GitCli;

/// Execute a run and return the process exit code
pub async fn execute(inputs: &ActionInputs) -> i32 {
    let orchestrator = match build(inputs).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Error initializing action: {:#}", e);
            return exit_codes::INVALID_ARGS;
        }
    };

    let outcome = orchestrator.run().await;
    match &outcome {
        RunOutcome::Success => info!("Run complete"),
        RunOutcome::SuccessWithUnpinnedFound => error!(
            "Unpinned actions or container images found. Check the Frizbee Action logs for more information."
        ),
        RunOutcome::Fatal(e) => error!("Error running action: {}", e),
    }
    outcome.exit_code()
}

/// Validate inputs and build the orchestrator with its collaborators
pub async fn build(inputs: &ActionInputs) -> Result<RunOrchestrator> {
    let config = Config::from_inputs(inputs).context("invalid inputs")?;
    info!(
        repository = %format!("{}/{}", config.repo_owner, config.repo_name),
        root = %config.repo_root.display(),
        open_pr = config.open_pr,
        fail_on_unpinned = config.fail_on_unpinned,
        "Starting frizbee-action"
    );

    let vcs = Arc::new(GitCli::open(&config.repo_root).context("failed to open repository")?);

    let github = Arc::new(
        GitHubApi::new(
            config.token.clone(),
            config.api_url.as_deref(),
            config.repo_owner.clone(),
            config.repo_name.clone(),
        )
        .context("failed to create GitHub client")?,
    );
    let hosting: Arc<dyn HostingApi> = match config.hosting_backend {
        HostingBackend::Api => github.clone(),
        HostingBackend::GhCli => {
            if !GhCli::is_available() {
                anyhow::bail!("gh is not installed or not in PATH");
            }
            Arc::new(GhCli::new(
                config.repo_owner.clone(),
                config.repo_name.clone(),
            ))
        }
    };

    let registry = Arc::new(RegistryResolver::new().context("failed to create registry client")?);
    let action_exclusions =
        ActionExclusions::new(&config.exclusions.actions, &config.exclusions.branches)
            .context("invalid action exclusions")?;
    let image_exclusions = ImageExclusions::new(&config.exclusions.images, &config.exclusions.tags)
        .context("invalid image exclusions")?;

    let root = config.repo_root.clone();
    let mut orchestrator = RunOrchestrator::new(config, PublishSettings::default(), vcs, hosting)
        .with_scanner(Box::new(ActionsScanner::new(
            root.clone(),
            github,
            action_exclusions,
        )));
    for category in [
        ScanCategory::Dockerfiles,
        ScanCategory::Kubernetes,
        ScanCategory::DockerCompose,
    ] {
        orchestrator = orchestrator.with_scanner(Box::new(ImagesScanner::new(
            root.clone(),
            category,
            registry.clone(),
            image_exclusions.clone(),
        )));
    }

    Ok(orchestrator)
}
