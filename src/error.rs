//! Error types for frizbee-action
//!
//! This module defines the error taxonomy of a run using `thiserror`. Every
//! fatal error raised by a collaborator is wrapped with the operation and the
//! path or branch it concerned before it reaches the top of the run.

use thiserror::Error;

/// Main error type for frizbee-action
#[derive(Error, Debug)]
pub enum FrizbeeError {
    /// A scanner returned a result that breaks the result contract
    #[error("Invalid scan result: {reason} (path '{path}')")]
    InvalidScanResult {
        /// Offending path
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Scanner errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Errors while writing changes into the working tree
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Version control errors outside of a publication step
    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),

    /// Hosting API errors outside of a publication step
    #[error("Hosting API error: {0}")]
    HostingApi(#[from] HostingApiError),

    /// A publication step failed
    #[error("Failed to {step}: {source}")]
    Publish {
        /// The step of the publication sequence that failed
        step: PublishStep,
        /// The collaborator error
        #[source]
        source: Box<FrizbeeError>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unpinned references were found and the run is configured to fail on them
    #[error("unpinned actions or container images found")]
    UnpinnedFound,
}

impl FrizbeeError {
    /// Wrap a collaborator error with the publication step that raised it
    pub fn at_step(step: PublishStep, source: impl Into<FrizbeeError>) -> Self {
        FrizbeeError::Publish {
            step,
            source: Box::new(source.into()),
        }
    }

    /// Whether this is the "policy says fail" sentinel rather than a defect
    pub fn is_unpinned_found(&self) -> bool {
        matches!(self, FrizbeeError::UnpinnedFound)
    }
}

/// Steps of the publication sequence, used to give fatal errors context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Commit,
    Push,
    ListPullRequests,
    DefaultBranch,
    CreatePullRequest,
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            PublishStep::Commit => "commit changes",
            PublishStep::Push => "push branch",
            PublishStep::ListPullRequests => "list open pull requests",
            PublishStep::DefaultBranch => "get default branch",
            PublishStep::CreatePullRequest => "create pull request",
        };
        f.write_str(step)
    }
}

/// Errors that occur while scanning a path for references
#[derive(Error, Debug)]
pub enum ScanError {
    /// The configured path does not exist below the repository root
    #[error("Path '{path}' does not exist")]
    PathNotFound {
        /// Configured path
        path: String,
    },

    /// Failed to read a file
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// A manifest could not be understood
    #[error("Malformed manifest '{path}': {message}")]
    Malformed {
        /// Path to the manifest
        path: String,
        /// Parser message
        message: String,
    },

    /// An exclusion pattern is not a valid glob
    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as configured
        pattern: String,
        /// Glob compiler message
        message: String,
    },
}

/// Errors raised while resolving a reference to an immutable digest
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The GitHub API failed
    #[error(transparent)]
    Api(#[from] HostingApiError),

    /// A container registry answered with an error status
    #[error("Registry {registry} returned HTTP {status} for '{reference}'")]
    Registry {
        /// Registry host
        registry: String,
        /// Image reference
        reference: String,
        /// HTTP status code
        status: u16,
    },

    /// A container registry answered without a digest
    #[error("Registry {registry} did not report a digest for '{reference}'")]
    MissingDigest {
        /// Registry host
        registry: String,
        /// Image reference
        reference: String,
    },

    /// The request never got an answer
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Transport error message
        message: String,
    },
}

/// Errors raised by the change applier
#[derive(Error, Debug)]
pub enum ApplyError {
    /// Failed to write new content to a file
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// Repository-relative path
        path: String,
        /// Version control error that caused it
        source: VcsError,
    },

    /// Failed to stage a written file
    #[error("Failed to stage '{path}': {source}")]
    Stage {
        /// Repository-relative path
        path: String,
        /// Version control error that caused it
        source: VcsError,
    },
}

/// Errors raised by the version control binding
#[derive(Error, Debug)]
pub enum VcsError {
    /// The repository root is not a git repository
    #[error("'{path}' is not a git repository")]
    NotARepository {
        /// Repository root
        path: String,
    },

    /// A path to overwrite does not exist in the working tree
    #[error("Path '{path}' does not exist in the working tree")]
    MissingPath {
        /// Repository-relative path
        path: String,
    },

    /// HEAD does not point at a commit
    #[error("HEAD does not point at a commit")]
    NoHead,

    /// I/O error on the working tree
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Repository-relative path
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// A git command failed
    #[error("git {command} failed: {message}")]
    CommandFailed {
        /// Git subcommand
        command: String,
        /// Captured stderr
        message: String,
    },
}

/// Kinds of hosting API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingApiErrorKind {
    Unauthorized,
    RateLimited,
    NotFound,
    Other,
}

/// Errors raised by the hosting API bindings
#[derive(Error, Debug)]
pub enum HostingApiError {
    /// The API answered with an error status
    #[error("{operation} returned HTTP {status}: {message}")]
    Status {
        /// API operation
        operation: String,
        /// HTTP status code
        status: u16,
        /// Classification of the status
        kind: HostingApiErrorKind,
        /// Message returned by the API
        message: String,
    },

    /// The request never got an answer
    #[error("{operation} failed: {message}")]
    Transport {
        /// API operation
        operation: String,
        /// Transport error message
        message: String,
    },

    /// The `gh` command-line tool failed
    #[error("gh {command} failed: {message}")]
    CommandFailed {
        /// `gh` subcommand
        command: String,
        /// Captured stderr
        message: String,
    },
}

impl HostingApiError {
    /// Build a status error, classifying the status code
    pub fn from_status(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = match status {
            401 => HostingApiErrorKind::Unauthorized,
            429 => HostingApiErrorKind::RateLimited,
            403 if message.to_lowercase().contains("rate limit") => HostingApiErrorKind::RateLimited,
            403 => HostingApiErrorKind::Unauthorized,
            404 => HostingApiErrorKind::NotFound,
            _ => HostingApiErrorKind::Other,
        };
        HostingApiError::Status {
            operation: operation.into(),
            status,
            kind,
            message,
        }
    }

    /// HTTP status code, when the API answered
    pub fn status(&self) -> Option<u16> {
        match self {
            HostingApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classification of the failure
    pub fn kind(&self) -> HostingApiErrorKind {
        match self {
            HostingApiError::Status { kind, .. } => *kind,
            _ => HostingApiErrorKind::Other,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing
    #[error("{name} environment variable is not set")]
    MissingVariable {
        /// Variable name
        name: String,
    },

    /// Two inputs that exclude each other were both set
    #[error("cannot set both {first} and {second}")]
    Conflicting {
        /// First input
        first: String,
        /// Second input
        second: String,
    },

    /// An input has an unusable value
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// Input name
        name: String,
        /// What is wrong with it
        message: String,
    },
}
