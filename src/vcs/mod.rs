//! # Version control
//!
//! The [`VersionControl`] trait is the capability set the applier and the
//! publication controller need from the working tree and its repository:
//! overwrite and stage files, commit, push and read HEAD.
//!
//! [`git::GitCli`] implements it by running the `git` command-line tool in
//! the repository root. Tests substitute in-memory implementations.
//!
//! A run assumes it is the only writer of the working tree and the index for
//! its whole duration. CI serializes runs per repository, so no locking is
//! done here.

pub mod git;

use std::io::Write;

use crate::error::VcsError;

pub use git::GitCli;

/// Identity used to author commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    /// Create a new signature
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Working tree and repository operations
pub trait VersionControl: Send + Sync {
    /// Read the current content of a file, `None` if it does not exist
    fn read(&self, path: &str) -> Result<Option<String>, VcsError>;

    /// Open an existing file for a truncating write
    ///
    /// Dropping the returned writer closes the file.
    fn open_for_overwrite(&self, path: &str) -> Result<Box<dyn Write + '_>, VcsError>;

    /// Add a file to the index
    fn stage(&self, path: &str) -> Result<(), VcsError>;

    /// Commit everything staged, returning the new commit id
    fn commit(&self, message: &str, author: &Signature) -> Result<String, VcsError>;

    /// Push HEAD to `branch` on the remote
    fn push(&self, branch: &str, force: bool) -> Result<(), VcsError>;

    /// The commit HEAD points at
    fn current_head(&self) -> Result<String, VcsError>;
}
