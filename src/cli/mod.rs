//! # CLI Module
//!
//! This module defines the command-line interface of the action using
//! `clap`. GitHub runs the action container without arguments and passes
//! every input as an environment variable, so each option below also reads
//! its `INPUT_*` or `GITHUB_*` variable.
//!
//! ## Submodules
//!
//! - [`run`] - Wiring of the collaborators and the run itself
//! - [`exit_codes`] - Standardized exit codes
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv)
//! - `--log-format <FORMAT>` - `text` (default) or `json`
//!
//! ## Examples
//!
//! ```bash
//! # What GitHub does
//! GITHUB_REPOSITORY_OWNER=stacklok GITHUB_REPOSITORY=stacklok/demo frizbee-action
//!
//! # Report what would be pinned in a local checkout
//! frizbee-action --repository-owner stacklok --repository stacklok/demo \
//!     --repo-root . --dockerfiles '["docker"]'
//! ```

pub mod exit_codes;
pub mod run;

use clap::{Parser, ValueEnum};

use crate::config::ActionInputs;

/// frizbee-action - Pin GitHub Actions and container images to immutable digests
#[derive(Parser, Debug)]
#[command(name = "frizbee-action")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, env = "INPUT_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub inputs: ActionInputs,
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
