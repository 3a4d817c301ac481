//! gitgrab - Mirror every repository of a GitHub organization
//!
//! gitgrab lists an organization's repositories through the GitHub API and
//! brings a local directory in line with it: missing repositories are cloned,
//! repositories sitting on their default branch are pulled, everything else
//! is fetched so local work is never merged into.
//!
//! ## Core Features
//!
//! - **Paginated Discovery**: all-or-nothing listing via the GitHub REST API
//! - **Clone Transports**: SSH, or HTTPS with the token embedded for private repositories
//! - **Safe Updates**: pull only when the checked-out branch is the default branch
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`types`]: Validated domain types and the repository record
//! - [`github`]: GitHub API client
//! - [`discovery`]: Discovery trait and repository filters
//! - [`git`]: Git subprocess runner and per-repository decision logic
//! - [`sync`]: Orchestration over a whole listing
//! - [`config`]: Configuration management and parsing

pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod github;
pub mod health;
pub mod sync;
pub mod types;

pub use config::Config;
pub use discovery::{Discovery, GitHubDiscovery, RepoFilter};
pub use error::{CommandError, FetchError, GitVerb, SyncError, ValidationError};
pub use git::{FetchReason, GitClient, ProcessRunner, SyncAction, SystemRunner};
pub use github::GitHubClient;
pub use health::HealthCheck;
pub use sync::{RepoOutcome, SyncContext, SyncEngine, SyncSummary};
pub use types::{
    BranchName, CloneMethod, GitHubToken, HttpUrl, OrganizationName, RepoSyncConfig, Repository,
    RepositoryName, SshUrl,
};
