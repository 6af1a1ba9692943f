//! Configuration loader
//!
//! GitHub passes action inputs to the container as `INPUT_<NAME>`
//! environment variables and the run context as `GITHUB_*` variables.
//! [`ActionInputs`] collects them raw through clap, [`Config::from_inputs`]
//! validates them.

use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use super::{Exclusions, HostingBackend};
use crate::error::ConfigError;
use crate::scanner::ScanCategory;

const DEFAULT_ACTIONS_PATH: &str = ".github/workflows";
const DEFAULT_EXCLUDED_BRANCHES: &[&str] = &["*"];
const DEFAULT_EXCLUDED_IMAGES: &[&str] = &["scratch"];
const DEFAULT_EXCLUDED_TAGS: &[&str] = &["latest"];

/// Raw action inputs, as set by the workflow
#[derive(Args, Debug, Clone, Default)]
pub struct ActionInputs {
    /// Token used for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API (GitHub Enterprise Server)
    #[arg(long, env = "GITHUB_API_URL", value_name = "URL", hide = true)]
    pub api_url: Option<String>,

    /// Owner of the repository being processed
    #[arg(long, env = "GITHUB_REPOSITORY_OWNER")]
    pub repository_owner: Option<String>,

    /// Repository being processed (owner/name)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Root of the checked out repository
    #[arg(long, env = "INPUT_REPO_ROOT", value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Workspace GitHub checks the repository out into
    #[arg(long, env = "GITHUB_WORKSPACE", value_name = "DIR", hide = true)]
    pub workspace: Option<PathBuf>,

    /// Single workflows path to pin actions in
    #[arg(long, env = "INPUT_ACTIONS", value_name = "PATH")]
    pub actions: Option<String>,

    /// JSON list of workflows paths to pin actions in
    #[arg(long, env = "INPUT_ACTIONS_PATHS", value_name = "JSON")]
    pub actions_paths: Option<String>,

    /// JSON list of Dockerfile paths
    #[arg(long, env = "INPUT_DOCKERFILES", value_name = "JSON")]
    pub dockerfiles: Option<String>,

    /// JSON list of Kubernetes manifest paths
    #[arg(long, env = "INPUT_KUBERNETES", value_name = "JSON")]
    pub kubernetes: Option<String>,

    /// JSON list of docker compose paths
    #[arg(long, env = "INPUT_DOCKER_COMPOSE", value_name = "JSON")]
    pub docker_compose: Option<String>,

    /// Open a pull request with the pinned references ("true" enables)
    #[arg(long, env = "INPUT_OPEN_PR", value_name = "BOOL")]
    pub open_pr: Option<String>,

    /// Fail the run when unpinned references are found ("true" enables)
    #[arg(long, env = "INPUT_FAIL_ON_UNPINNED", value_name = "BOOL")]
    pub fail_on_unpinned: Option<String>,

    /// Only report diffs, never commit, push or open pull requests
    #[arg(long, env = "INPUT_DRY_RUN", value_name = "BOOL")]
    pub dry_run: Option<String>,

    /// JSON list of actions to leave unpinned
    #[arg(long, env = "INPUT_ACTIONS_EXCLUDE", value_name = "JSON")]
    pub actions_exclude: Option<String>,

    /// JSON list of branch patterns to leave unpinned
    #[arg(long, env = "INPUT_ACTIONS_EXCLUDE_BRANCHES", value_name = "JSON")]
    pub actions_exclude_branches: Option<String>,

    /// JSON list of images to leave unpinned
    #[arg(long, env = "INPUT_IMAGES_EXCLUDE", value_name = "JSON")]
    pub images_exclude: Option<String>,

    /// JSON list of image tags to leave unpinned
    #[arg(long, env = "INPUT_IMAGES_EXCLUDE_TAGS", value_name = "JSON")]
    pub images_exclude_tags: Option<String>,

    /// Pull request backend: api or gh-cli
    #[arg(long, env = "INPUT_HOSTING_BACKEND", value_name = "BACKEND")]
    pub hosting_backend: Option<String>,
}

/// Validated configuration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Repository owner
    pub repo_owner: String,
    /// Repository name, without the owner
    pub repo_name: String,
    /// Root of the working tree
    pub repo_root: PathBuf,
    /// GitHub token, if any
    pub token: Option<String>,
    /// GitHub REST API base URL, when not api.github.com
    pub api_url: Option<String>,

    /// Paths scanned for workflows
    pub actions_paths: Vec<String>,
    /// Paths scanned for Dockerfiles
    pub dockerfiles_paths: Vec<String>,
    /// Paths scanned for Kubernetes manifests
    pub kubernetes_paths: Vec<String>,
    /// Paths scanned for compose files
    pub docker_compose_paths: Vec<String>,

    /// Publish modifications as a pull request
    pub open_pr: bool,
    /// Fail the run when modifications exist
    pub fail_on_unpinned: bool,
    /// Report diffs instead of writing
    pub dry_run: bool,

    /// Exclusions passed to the scanners
    pub exclusions: Exclusions,
    /// Hosting API binding
    pub hosting_backend: HostingBackend,
}

impl Config {
    /// Validate raw inputs
    pub fn from_inputs(inputs: &ActionInputs) -> Result<Self, ConfigError> {
        let repo_owner = required(&inputs.repository_owner, "GITHUB_REPOSITORY_OWNER")?;
        let full_name = required(&inputs.repository, "GITHUB_REPOSITORY")?;
        let repo_name = full_name
            .strip_prefix(&format!("{}/", repo_owner))
            .unwrap_or(&full_name)
            .to_string();

        let repo_root = inputs
            .repo_root
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| {
                inputs
                    .workspace
                    .clone()
                    .filter(|p| !p.as_os_str().is_empty())
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let hosting_backend = match non_empty(&inputs.hosting_backend) {
            None => HostingBackend::default(),
            Some(value) => value.parse().map_err(|message| ConfigError::InvalidValue {
                name: "INPUT_HOSTING_BACKEND".to_string(),
                message,
            })?,
        };

        let open_pr = is_true(&inputs.open_pr);
        let dry_run = is_true(&inputs.dry_run);
        let token = non_empty(&inputs.github_token).map(str::to_string);

        if open_pr && !dry_run && hosting_backend == HostingBackend::Api && token.is_none() {
            return Err(ConfigError::MissingVariable {
                name: "GITHUB_TOKEN".to_string(),
            });
        }

        Ok(Self {
            repo_owner,
            repo_name,
            repo_root,
            token,
            api_url: non_empty(&inputs.api_url).map(str::to_string),
            actions_paths: actions_paths(inputs)?,
            dockerfiles_paths: json_list("INPUT_DOCKERFILES", &inputs.dockerfiles, &[]),
            kubernetes_paths: json_list("INPUT_KUBERNETES", &inputs.kubernetes, &[]),
            docker_compose_paths: json_list("INPUT_DOCKER_COMPOSE", &inputs.docker_compose, &[]),
            open_pr,
            fail_on_unpinned: is_true(&inputs.fail_on_unpinned),
            dry_run,
            exclusions: Exclusions {
                actions: json_list("INPUT_ACTIONS_EXCLUDE", &inputs.actions_exclude, &[]),
                branches: json_list(
                    "INPUT_ACTIONS_EXCLUDE_BRANCHES",
                    &inputs.actions_exclude_branches,
                    DEFAULT_EXCLUDED_BRANCHES,
                ),
                images: json_list(
                    "INPUT_IMAGES_EXCLUDE",
                    &inputs.images_exclude,
                    DEFAULT_EXCLUDED_IMAGES,
                ),
                tags: json_list(
                    "INPUT_IMAGES_EXCLUDE_TAGS",
                    &inputs.images_exclude_tags,
                    DEFAULT_EXCLUDED_TAGS,
                ),
            },
            hosting_backend,
        })
    }

    /// Configured paths for a scan category
    pub fn paths_for(&self, category: ScanCategory) -> &[String] {
        match category {
            ScanCategory::Actions => &self.actions_paths,
            ScanCategory::Dockerfiles => &self.dockerfiles_paths,
            ScanCategory::Kubernetes => &self.kubernetes_paths,
            ScanCategory::DockerCompose => &self.docker_compose_paths,
        }
    }

    /// Whether the applier only reports diffs
    ///
    /// Without a pull request to open there is nothing to commit, so the
    /// working tree is left untouched.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || !self.open_pr
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn is_true(value: &Option<String>) -> bool {
    non_empty(value) == Some("true")
}

fn required(value: &Option<String>, name: &str) -> Result<String, ConfigError> {
    non_empty(value)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingVariable {
            name: name.to_string(),
        })
}

/// Parse a JSON string list
///
/// Unset inputs take `default`. Inputs that are not a JSON list of strings
/// are logged and treated as empty.
fn json_list(name: &str, value: &Option<String>, default: &[&str]) -> Vec<String> {
    match non_empty(value) {
        None => default.iter().map(|s| s.to_string()).collect(),
        Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => list,
            Err(e) => {
                warn!(input = name, value = raw, error = %e, "Error unmarshalling input, ignoring it");
                Vec::new()
            }
        },
    }
}

fn actions_paths(inputs: &ActionInputs) -> Result<Vec<String>, ConfigError> {
    match (non_empty(&inputs.actions), non_empty(&inputs.actions_paths)) {
        (Some(_), Some(_)) => Err(ConfigError::Conflicting {
            first: "INPUT_ACTIONS".to_string(),
            second: "INPUT_ACTIONS_PATHS".to_string(),
        }),
        (Some(single), None) => Ok(vec![single.to_string()]),
        (None, Some(_)) => Ok(json_list("INPUT_ACTIONS_PATHS", &inputs.actions_paths, &[])),
        (None, None) => Ok(vec![DEFAULT_ACTIONS_PATH.to_string()]),
    }
}
