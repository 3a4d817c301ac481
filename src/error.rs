//! Error types for gitgrab.
//!
//! Configuration problems surface as [`ValidationError`], the organization
//! listing as [`FetchError`], and per-repository work as [`SyncError`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::RepositoryName;

/// A raw value rejected at the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {kind} name: {value:?}")]
    InvalidName { kind: &'static str, value: String },

    #[error("invalid {kind} clone URL: {value:?}")]
    InvalidUrl { kind: &'static str, value: String },

    #[error("GitHub token must not be empty")]
    EmptyToken,

    #[error("invalid clone method: {0} (expected 'ssh' or 'http')")]
    CloneMethod(String),
}

/// Failure while listing an organization's repositories.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to make request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed: {status} - {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of a single git subprocess.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe_exit(*.code))]
    Exit { code: Option<i32> },

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// The git operation a sync attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitVerb {
    Clone,
    Pull,
    Fetch,
}

impl GitVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitVerb::Clone => "clone",
            GitVerb::Pull => "pull",
            GitVerb::Fetch => "fetch",
        }
    }
}

impl fmt::Display for GitVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-repository failure. Never fatal to the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to {verb} {repository}: {source}")]
    Git {
        repository: RepositoryName,
        verb: GitVerb,
        #[source]
        source: CommandError,
    },

    #[error("{repository} maps to {} which another repository in this run already targets", .path.display())]
    DuplicateTarget {
        repository: RepositoryName,
        path: PathBuf,
    },
}

impl SyncError {
    pub(crate) fn git(repository: &RepositoryName, verb: GitVerb, source: CommandError) -> Self {
        SyncError::Git {
            repository: repository.clone(),
            verb,
            source,
        }
    }

    pub fn repository(&self) -> &RepositoryName {
        match self {
            SyncError::Git { repository, .. } | SyncError::DuplicateTarget { repository, .. } => {
                repository
            }
        }
    }

    /// The git verb that failed, if the failure came from a subprocess.
    pub fn verb(&self) -> Option<GitVerb> {
        match self {
            SyncError::Git { verb, .. } => Some(*verb),
            SyncError::DuplicateTarget { .. } => None,
        }
    }
}
