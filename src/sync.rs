//! Sync Engine - Orchestrates repository synchronization
//!
//! Drives a [`GitClient`] over a whole organization listing: builds the
//! per-repository configuration, runs the syncs (sequentially unless
//! `max_parallel` says otherwise), isolates failures, and compiles the summary.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::git::{GitClient, ProcessRunner, SyncAction, SystemRunner};
use crate::types::{
    CloneMethod, GitHubToken, OrganizationName, RepoSyncConfig, Repository, RepositoryName,
};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Inputs shared by every repository in one run
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub target_dir: PathBuf,
    pub token: GitHubToken,
    pub organization: OrganizationName,
    pub method: CloneMethod,
}

impl SyncContext {
    fn config_for(&self, repository: Repository) -> RepoSyncConfig {
        RepoSyncConfig {
            repository,
            target_dir: self.target_dir.clone(),
            token: self.token.clone(),
            organization: self.organization.clone(),
            method: self.method,
        }
    }
}

/// Result of syncing one repository
#[derive(Debug)]
pub struct RepoOutcome {
    pub name: RepositoryName,
    pub result: Result<SyncAction, SyncError>,
}

impl RepoOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results from a complete sync operation
#[derive(Debug)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub duration: Duration,
    /// One entry per repository, in listing order
    pub outcomes: Vec<RepoOutcome>,
}

impl SyncSummary {
    pub fn from_outcomes(outcomes: Vec<RepoOutcome>, duration: Duration) -> Self {
        let successful_operations = outcomes.iter().filter(|o| o.is_success()).count();

        Self {
            total_repositories: outcomes.len(),
            successful_operations,
            failed_operations: outcomes.len() - successful_operations,
            duration,
            outcomes,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}

/// The sync engine that orchestrates repository synchronization
pub struct SyncEngine<R = SystemRunner> {
    git: GitClient<R>,
    max_parallel: usize,
}

impl SyncEngine<SystemRunner> {
    /// Engine running the configured git binary with the configured limits
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            GitClient::system(&config.git_binary, config.git_timeout()),
            config.max_parallel,
        )
    }
}

impl<R: ProcessRunner> SyncEngine<R> {
    pub fn new(git: GitClient<R>, max_parallel: usize) -> Self {
        Self {
            git,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Sync every repository and report each outcome as it completes.
    ///
    /// `on_outcome` receives the 1-based position, the total, and the outcome;
    /// outcomes arrive in listing order. A failure never stops the others.
    pub async fn sync_repos<F>(
        &self,
        repositories: Vec<Repository>,
        context: &SyncContext,
        mut on_outcome: F,
    ) -> SyncSummary
    where
        F: FnMut(usize, usize, &RepoOutcome),
    {
        let start_time = Instant::now();
        let total = repositories.len();

        info!(
            "Syncing {} repositories into {} (max_parallel={})",
            total,
            context.target_dir.display(),
            self.max_parallel
        );

        // Two syncs must never share a directory; the first claim wins.
        let mut claimed = HashSet::new();
        let tasks: Vec<_> = repositories
            .into_iter()
            .map(|repo| {
                let fresh = claimed.insert(repo.name.as_str().to_lowercase());
                let config = context.config_for(repo);
                async move {
                    let name = config.repository.name.clone();
                    let result = if fresh {
                        self.git.sync_repository(config).await
                    } else {
                        warn!("Skipping {}: target directory already claimed", name);
                        Err(SyncError::DuplicateTarget {
                            repository: name.clone(),
                            path: config.local_path(),
                        })
                    };
                    RepoOutcome { name, result }
                }
            })
            .collect();

        let stream = stream::iter(tasks).buffered(self.max_parallel);
        futures::pin_mut!(stream);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = stream.next().await {
            match &outcome.result {
                Ok(action) => debug!("Sync completed for {}: {:?}", outcome.name, action),
                Err(e) => warn!("Sync failed: {}", e),
            }
            on_outcome(outcomes.len() + 1, total, &outcome);
            outcomes.push(outcome);
        }

        let summary = SyncSummary::from_outcomes(outcomes, start_time.elapsed());

        info!(
            "Sync completed in {:.2}s: {} successful, {} failed",
            summary.duration.as_secs_f64(),
            summary.successful_operations,
            summary.failed_operations
        );

        summary
    }

    /// Dry run: the action each repository would get, without cloning,
    /// pulling or fetching anything
    pub async fn plan_repos(
        &self,
        repositories: Vec<Repository>,
        context: &SyncContext,
    ) -> Vec<(RepositoryName, SyncAction)> {
        let mut plans = Vec::with_capacity(repositories.len());

        for repo in repositories {
            let config = context.config_for(repo);
            let action = self.git.plan(&config).await;
            plans.push((config.repository.name, action));
        }

        plans
    }
}
