//! Git operations for overwriting, staging, committing and pushing changes

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Signature, VersionControl};
use crate::error::VcsError;
use crate::utils::command::{execute_command, CommandResult};

const REMOTE: &str = "origin";

/// The checkout may belong to another user than the one running git
const SAFE_DIRECTORY: &str = "safe.directory=*";

/// [`VersionControl`] backed by the `git` command-line tool
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Open the repository rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a git repository or `git` is not
    /// installed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VcsError> {
        let root = root.into();
        if !is_git_repository(&root) {
            return Err(VcsError::NotARepository {
                path: root.display().to_string(),
            });
        }
        if which::which("git").is_err() {
            return Err(VcsError::CommandFailed {
                command: "--version".to_string(),
                message: "git is not installed or not in PATH".to_string(),
            });
        }

        Ok(Self { root })
    }

    fn git(&self, subcommand: &str, args: &[&str]) -> Result<CommandResult, VcsError> {
        self.git_with_config(&[], subcommand, args)
    }

    fn git_with_config(
        &self,
        config: &[&str],
        subcommand: &str,
        args: &[&str],
    ) -> Result<CommandResult, VcsError> {
        let mut full_args = Vec::with_capacity(config.len() * 2 + args.len() + 3);
        full_args.push("-c");
        full_args.push(SAFE_DIRECTORY);
        for entry in config {
            full_args.push("-c");
            full_args.push(*entry);
        }
        full_args.push(subcommand);
        full_args.extend_from_slice(args);

        debug!(command = subcommand, "Running git");
        let result = execute_command("git", &full_args, Some(&self.root)).map_err(|e| {
            VcsError::CommandFailed {
                command: subcommand.to_string(),
                message: e.to_string(),
            }
        })?;

        if !result.success() {
            return Err(VcsError::CommandFailed {
                command: subcommand.to_string(),
                message: result.stderr,
            });
        }

        Ok(result)
    }
}

impl VersionControl for GitCli {
    fn read(&self, path: &str) -> Result<Option<String>, VcsError> {
        let full_path = self.root.join(path);
        if !full_path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&full_path)
            .map(Some)
            .map_err(|source| VcsError::Io {
                path: path.to_string(),
                source,
            })
    }

    fn open_for_overwrite(&self, path: &str) -> Result<Box<dyn Write + '_>, VcsError> {
        let full_path = self.root.join(path);
        if !full_path.is_file() {
            return Err(VcsError::MissingPath {
                path: path.to_string(),
            });
        }

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&full_path)
            .map_err(|source| VcsError::Io {
                path: path.to_string(),
                source,
            })?;

        Ok(Box::new(file))
    }

    fn stage(&self, path: &str) -> Result<(), VcsError> {
        self.git("add", &["--", path]).map(|_| ())
    }

    fn commit(&self, message: &str, author: &Signature) -> Result<String, VcsError> {
        let name = format!("user.name={}", author.name);
        let email = format!("user.email={}", author.email);
        let author_arg = author.to_string();

        // Committer identity must match the author, and comes from -c
        self.git_with_config(
            &[name.as_str(), email.as_str()],
            "commit",
            &["--author", author_arg.as_str(), "-m", message],
        )?;

        self.current_head()
    }

    fn push(&self, branch: &str, force: bool) -> Result<(), VcsError> {
        let refspec = format!("HEAD:refs/heads/{}", branch);
        let mut args = Vec::new();
        if force {
            args.push("--force");
        }
        args.push(REMOTE);
        args.push(refspec.as_str());

        self.git("push", &args).map(|_| ())
    }

    fn current_head(&self) -> Result<String, VcsError> {
        match self.git("rev-parse", &["--verify", "HEAD"]) {
            Ok(result) if result.stdout.is_empty() => Err(VcsError::NoHead),
            Ok(result) => Ok(result.stdout),
            Err(VcsError::CommandFailed { message, .. }) if is_unborn_head(&message) => {
                Err(VcsError::NoHead)
            }
            Err(e) => Err(e),
        }
    }
}

/// Whether `rev-parse --verify HEAD` failed only because HEAD has no commit yet
fn is_unborn_head(stderr: &str) -> bool {
    stderr.contains("Needed a single revision")
        || stderr.contains("unknown revision")
        || stderr.contains("ambiguous argument 'HEAD'")
}

/// Check if the directory is the root of a git repository
///
/// `.git` may be a directory or, for worktrees and submodules, a file.
pub fn is_git_repository(root: &Path) -> bool {
    root.join(".git").exists()
}
