//! frizbee-action Library
//!
//! This crate provides the orchestration layer of a CI action that pins
//! GitHub Actions and container image references to immutable digests: it
//! scans the configured paths, merges the results, writes the rewritten
//! files and publishes them as a pull request.

pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod publish;
pub mod results;
pub mod scanner;
pub mod utils;
pub mod vcs;

pub use error::FrizbeeError;
pub use orchestrator::{RunOrchestrator, RunOutcome};
