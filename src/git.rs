use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{CommandError, GitVerb, SyncError};
use crate::types::{BranchName, RepoSyncConfig};

/// Captured output of a successful subprocess
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
}

/// Runs the git executable with the given arguments.
///
/// Implementations must report a non-zero exit as an error and must not
/// forward the child's stdout/stderr to the terminal.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, args: &[OsString]) -> Result<CommandOutput, CommandError>;
}

/// Runs a real executable, bounded by a timeout
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: OsString,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(program: impl Into<OsString>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        let mut command = AsyncCommand::new(&self.program);
        command
            .args(args)
            // git must never prompt on the controlling terminal.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?,
            Err(_) => return Err(CommandError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(CommandError::Exit {
                code: output.status.code(),
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// What the engine decided (or did) for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// No local copy existed; the repository was cloned
    Clone,
    /// The local copy is on the default branch; it was pulled
    Pull,
    /// The local copy was only fetched
    Fetch { reason: FetchReason },
}

impl SyncAction {
    pub fn verb(&self) -> GitVerb {
        match self {
            SyncAction::Clone => GitVerb::Clone,
            SyncAction::Pull => GitVerb::Pull,
            SyncAction::Fetch { .. } => GitVerb::Fetch,
        }
    }
}

/// Why an existing clone was fetched rather than pulled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchReason {
    /// The API reported no default branch
    NoDefaultBranch,
    /// `git branch --show-current` failed
    BranchUndetermined { error: String },
    /// HEAD is detached
    DetachedHead,
    /// A branch other than the default is checked out
    OffDefaultBranch { current: BranchName },
}

/// Git operations handler: decides between clone, pull and fetch per repository
pub struct GitClient<R = SystemRunner> {
    runner: R,
}

impl GitClient<SystemRunner> {
    /// Client running the given git executable
    pub fn system(program: impl Into<OsString>, timeout: Duration) -> Self {
        Self::new(SystemRunner::new(program, timeout))
    }
}

impl<R: ProcessRunner> GitClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Decide what a sync of this repository would do.
    ///
    /// Read-only: at most the current-branch query runs.
    pub async fn plan(&self, config: &RepoSyncConfig) -> SyncAction {
        let path = config.local_path();
        let name = &config.repository.name;

        if tokio::fs::metadata(&path).await.is_err() {
            return SyncAction::Clone;
        }

        debug!("{} already exists at {}", name, path.display());

        let Some(default_branch) = config.repository.default_branch.as_ref() else {
            warn!("No default branch information for {}, fetching instead", name);
            return SyncAction::Fetch {
                reason: FetchReason::NoDefaultBranch,
            };
        };

        match self.current_branch(&path).await {
            Err(e) => {
                warn!(
                    "Could not determine current branch for {}: {}, fetching instead",
                    name, e
                );
                SyncAction::Fetch {
                    reason: FetchReason::BranchUndetermined {
                        error: e.to_string(),
                    },
                }
            }
            Ok(current) if current.is_empty() => SyncAction::Fetch {
                reason: FetchReason::DetachedHead,
            },
            Ok(current) if &current == default_branch => SyncAction::Pull,
            Ok(current) => SyncAction::Fetch {
                reason: FetchReason::OffDefaultBranch { current },
            },
        }
    }

    /// Synchronize one repository: clone it if absent, otherwise pull or
    /// fetch. Existing directories are never removed or overwritten.
    pub async fn sync_repository(&self, config: RepoSyncConfig) -> Result<SyncAction, SyncError> {
        let action = self.plan(&config).await;
        let path = config.local_path();
        let name = &config.repository.name;

        let result = match &action {
            SyncAction::Clone => {
                info!("Cloning {} over {} -> {}", name, config.method, path.display());
                self.clone_into(&config.clone_url(), &path).await
            }
            SyncAction::Pull => {
                info!("{} is on its default branch, pulling", name);
                self.pull(&path).await
            }
            SyncAction::Fetch { reason } => {
                info!("Fetching {} ({:?})", name, reason);
                self.fetch(&path).await
            }
        };

        result.map_err(|e| SyncError::git(name, action.verb(), e))?;
        Ok(action)
    }

    async fn current_branch(&self, path: &Path) -> Result<BranchName, CommandError> {
        let output = self
            .git(&[
                OsStr::new("-C"),
                path.as_os_str(),
                OsStr::new("branch"),
                OsStr::new("--show-current"),
            ])
            .await?;
        Ok(BranchName::new(output.stdout.trim()))
    }

    async fn clone_into(&self, url: &str, path: &Path) -> Result<(), CommandError> {
        self.git(&[
            OsStr::new("clone"),
            OsStr::new("--"),
            OsStr::new(url),
            path.as_os_str(),
        ])
            .await
            .map(drop)
    }

    async fn pull(&self, path: &Path) -> Result<(), CommandError> {
        self.git(&[OsStr::new("-C"), path.as_os_str(), OsStr::new("pull")])
            .await
            .map(drop)
    }

    async fn fetch(&self, path: &Path) -> Result<(), CommandError> {
        self.git(&[OsStr::new("-C"), path.as_os_str(), OsStr::new("fetch")])
            .await
            .map(drop)
    }

    async fn git(&self, args: &[&OsStr]) -> Result<CommandOutput, CommandError> {
        let args: Vec<OsString> = args.iter().map(|a| a.to_os_string()).collect();
        // A clone URL may carry a token.
        if args.first().map(|a| a != "clone").unwrap_or(true) {
            debug!("Running git {:?}", args);
        }
        self.runner.run(&args).await
    }
}
