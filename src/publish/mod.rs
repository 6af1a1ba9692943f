//! # Publication
//!
//! Once every scan is merged and applied, the run decides what to do with
//! the modifications ([`decision::decide`]) and, when asked to, commits them
//! to a fixed branch, force-pushes it and opens a pull request
//! ([`controller::PublicationController`]).

pub mod controller;
pub mod decision;
pub mod templates;

pub use controller::{PublicationController, PublishOutcome};
pub use decision::{decide, PublicationDecision};
