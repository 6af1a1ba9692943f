//! Run orchestration
//!
//! A run scans every configured path, merges the results, applies the
//! modifications to the working tree and hands over to the publication
//! controller. Everything happens in order on the calling task: one scan,
//! one registry or API call at a time.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::apply::{ApplyOptions, ChangeApplier};
use crate::cli::exit_codes;
use crate::config::{Config, PublishSettings};
use crate::error::FrizbeeError;
use crate::providers::HostingApi;
use crate::publish::{decide, PublicationController};
use crate::results::{merge, UnifiedResult};
use crate::scanner::{ScanCategory, Scanner};
use crate::utils::timing::{format_duration, ScanTiming, ScanTimings, Timer};
use crate::vcs::VersionControl;

const SCAN_ORDER: [ScanCategory; 4] = [
    ScanCategory::Actions,
    ScanCategory::Dockerfiles,
    ScanCategory::Kubernetes,
    ScanCategory::DockerCompose,
];

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing to fail on
    Success,
    /// Every requested step completed and the policy fails the build
    SuccessWithUnpinnedFound,
    /// A step failed
    Fatal(FrizbeeError),
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => exit_codes::SUCCESS,
            RunOutcome::SuccessWithUnpinnedFound => exit_codes::UNPINNED_FOUND,
            RunOutcome::Fatal(_) => exit_codes::ERROR,
        }
    }
}

/// Sequences scanners, merger, applier and publication controller
pub struct RunOrchestrator {
    config: Config,
    settings: PublishSettings,
    scanners: BTreeMap<ScanCategory, Box<dyn Scanner>>,
    vcs: Arc<dyn VersionControl>,
    hosting: Arc<dyn HostingApi>,
}

impl RunOrchestrator {
    /// Create an orchestrator with no scanners registered
    pub fn new(
        config: Config,
        settings: PublishSettings,
        vcs: Arc<dyn VersionControl>,
        hosting: Arc<dyn HostingApi>,
    ) -> Self {
        Self {
            config,
            settings,
            scanners: BTreeMap::new(),
            vcs,
            hosting,
        }
    }

    /// Register the scanner of its category, replacing any previous one
    pub fn with_scanner(mut self, scanner: Box<dyn Scanner>) -> Self {
        self.scanners.insert(scanner.category(), scanner);
        self
    }

    /// Execute the run
    pub async fn run(&self) -> RunOutcome {
        match self.execute().await {
            Ok(()) => RunOutcome::Success,
            Err(e) if e.is_unpinned_found() => RunOutcome::SuccessWithUnpinnedFound,
            Err(e) => RunOutcome::Fatal(e),
        }
    }

    async fn execute(&self) -> Result<(), FrizbeeError> {
        let mut result = self.scan_all().await?;

        if result.processed().is_empty() {
            info!("No files were processed");
            return Ok(());
        }
        info!("Processed the following files:");
        for path in result.processed() {
            info!("  {}", path);
        }

        if !result.has_modifications() {
            info!("No unpinned references found");
            return Ok(());
        }
        info!("Modified the following files:");
        for path in result.modified().keys() {
            info!("  {}", path);
        }

        let options = ApplyOptions {
            dry_run: self.config.is_dry_run(),
        };
        let report = ChangeApplier::new(self.vcs.as_ref()).apply(&result, options)?;
        for entry in report.entries() {
            if let Some(diff) = &entry.diff {
                info!(path = %entry.path, "Pinned references:\n{}", diff);
            }
        }

        let decision = decide(&result, self.config.open_pr, self.config.fail_on_unpinned);
        let controller =
            PublicationController::new(self.vcs.as_ref(), self.hosting.as_ref(), &self.settings);
        if let Some(outcome) = controller.execute(decision, &mut result, &report).await? {
            if let Some(url) = &outcome.pull_request().url {
                info!(url = %url, "Pull request");
            }
        }

        Ok(())
    }

    /// Scan every configured path and merge the results in scan order
    async fn scan_all(&self) -> Result<UnifiedResult, FrizbeeError> {
        let mut unified = UnifiedResult::new();
        let mut timings = ScanTimings::new();

        for category in SCAN_ORDER {
            let paths = self.config.paths_for(category);
            if paths.is_empty() {
                if category == ScanCategory::Actions {
                    info!("No actions paths configured, skipping actions");
                } else {
                    debug!(category = category.name(), "No paths configured");
                }
                continue;
            }

            let Some(scanner) = self.scanners.get(&category) else {
                warn!(category = category.name(), "No scanner available, skipping");
                continue;
            };

            for path in paths.iter().filter(|p| !p.is_empty()) {
                let timer = Timer::start();
                let scan = scanner.scan(path).await?;
                let timing = ScanTiming {
                    category: category.name().to_string(),
                    path: path.clone(),
                    processed: scan.processed.len(),
                    modified: scan.modified.len(),
                    duration: timer.elapsed(),
                };
                debug!(
                    category = %timing.category,
                    path = %timing.path,
                    processed = timing.processed,
                    modified = timing.modified,
                    duration = %format_duration(timing.duration),
                    "Scan complete"
                );
                timings.record(timing);

                let outcome = merge(unified, scan)?;
                for conflict in &outcome.conflicts {
                    warn!(path = %conflict.path, "{}", conflict);
                }
                unified = outcome.result;
            }
        }

        info!(
            scans = timings.scans().len(),
            duration = %format_duration(timings.total()),
            "Scanning complete"
        );
        Ok(unified)
    }
}
