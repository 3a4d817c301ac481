//! Repository discovery abstraction layer
//!
//! A [`Discovery`] source turns an organization name into the list of
//! repository records the sync engine works through. [`GitHubDiscovery`]
//! pages the GitHub API and applies the configured [`RepoFilter`].

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::error::FetchError;
use crate::github::GitHubClient;
use crate::types::{OrganizationName, Repository};

/// Trait for repository discovery from a hosting provider
#[async_trait]
pub trait Discovery: Send + Sync {
    /// List the organization's repositories, in provider order.
    ///
    /// Fails as a whole; an incomplete listing is never returned.
    async fn discover(&self, org: &OrganizationName) -> Result<Vec<Repository>, FetchError>;

    /// Provider name for display/logging
    fn provider_name(&self) -> &'static str;
}

/// Drops repositories the configuration excludes
#[derive(Debug, Clone)]
pub struct RepoFilter {
    exclude: Vec<Regex>,
    include_forks: bool,
    include_archived: bool,
}

impl Default for RepoFilter {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            include_forks: true,
            include_archived: true,
        }
    }
}

impl RepoFilter {
    pub fn from_config(config: &GitHubConfig) -> Self {
        Self {
            exclude: config
                .exclude_patterns
                .iter()
                .filter_map(|p| glob_to_regex(p))
                .collect(),
            include_forks: config.include_forks,
            include_archived: config.include_archived,
        }
    }

    pub fn is_excluded(&self, repo: &Repository) -> bool {
        if self.exclude.iter().any(|re| re.is_match(repo.name.as_str())) {
            debug!("Excluding repository due to pattern match: {}", repo.name);
            return true;
        }
        if repo.fork && !self.include_forks {
            debug!("Excluding fork repository: {}", repo.name);
            return true;
        }
        if repo.archived && !self.include_archived {
            debug!("Excluding archived repository: {}", repo.name);
            return true;
        }
        false
    }

    /// Keep the repositories that pass, preserving order
    pub fn apply(&self, repositories: Vec<Repository>) -> Vec<Repository> {
        repositories
            .into_iter()
            .filter(|repo| !self.is_excluded(repo))
            .collect()
    }
}

/// `*` matches any run of characters; everything else is literal.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).ok()
}

/// GitHub repository discovery implementation
pub struct GitHubDiscovery {
    client: GitHubClient,
    filter: RepoFilter,
}

impl GitHubDiscovery {
    pub fn new(client: GitHubClient, filter: RepoFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl Discovery for GitHubDiscovery {
    async fn discover(&self, org: &OrganizationName) -> Result<Vec<Repository>, FetchError> {
        let repositories = self.client.fetch_all_repos(org).await?;
        let total = repositories.len();
        let kept = self.filter.apply(repositories);

        if kept.len() != total {
            debug!("Filtered {} repositories to {}", total, kept.len());
        }
        Ok(kept)
    }

    fn provider_name(&self) -> &'static str {
        "GitHub"
    }
}
