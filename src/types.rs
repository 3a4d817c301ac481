//! Domain types for gitgrab.
//!
//! Opaque strings (tokens, names, URLs, branches) are distinct newtypes so one
//! cannot be passed where another is expected. Names and tokens are validated
//! where a raw value enters the crate: API decode and CLI/config parsing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Host used for token-embedded HTTPS URLs when the record's own URL has none.
pub const DEFAULT_GIT_HOST: &str = "github.com";

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\')
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// A GitHub organization login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrganizationName(String);

impl OrganizationName {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if is_valid_name(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidName {
                kind: "organization",
                value: s,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrganizationName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrganizationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A repository name; safe to join onto a base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryName(String);

impl RepositoryName {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if is_valid_name(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidName {
                kind: "repository",
                value: s,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RepositoryName> for String {
    fn from(name: RepositoryName) -> Self {
        name.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A git branch name. No validation; compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A GitHub personal access token. The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubToken(String);

impl GitHubToken {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        Ok(Self(s))
    }

    /// Value for the `Authorization` header of API requests.
    pub fn auth_header(&self) -> String {
        format!("token {}", self.0)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GitHubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GitHubToken(***)")
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

/// HTTPS clone URL as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HttpUrl(String);

impl HttpUrl {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if is_valid_http_url(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidUrl {
                kind: "HTTPS",
                value: s,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

fn is_valid_http_url(s: &str) -> bool {
    s.starts_with("https://") && !s.chars().any(char::is_whitespace)
}

impl TryFrom<String> for HttpUrl {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<HttpUrl> for String {
    fn from(url: HttpUrl) -> Self {
        url.0
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SSH clone URL (`git@host:org/name.git`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SshUrl(String);

impl SshUrl {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if is_valid_ssh_url(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidUrl {
                kind: "SSH",
                value: s,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_ssh_url(s: &str) -> bool {
    s.starts_with("git@") && s.contains(':') && !s.chars().any(char::is_whitespace)
}

impl TryFrom<String> for SshUrl {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<SshUrl> for String {
    fn from(url: SshUrl) -> Self {
        url.0
    }
}

impl fmt::Display for SshUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Clone method
// ---------------------------------------------------------------------------

/// Transport used for new clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneMethod {
    #[default]
    Ssh,
    Http,
}

impl CloneMethod {
    /// Lenient parse: unknown input resolves to [`CloneMethod::Ssh`] and the
    /// parse error is handed back so the caller can report it.
    pub fn parse_or_default(s: &str) -> (Self, Option<ValidationError>) {
        match s.parse() {
            Ok(method) => (method, None),
            Err(e) => (CloneMethod::Ssh, Some(e)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloneMethod::Ssh => "ssh",
            CloneMethod::Http => "http",
        }
    }
}

impl FromStr for CloneMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssh" => Ok(CloneMethod::Ssh),
            "http" => Ok(CloneMethod::Http),
            _ => Err(ValidationError::CloneMethod(s.to_string())),
        }
    }
}

impl fmt::Display for CloneMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One entry of the organization repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: RepositoryName,
    pub clone_url: HttpUrl,
    pub ssh_url: SshUrl,
    #[serde(default)]
    pub private: bool,
    /// `None` when the API reports no default branch (null or empty).
    #[serde(default, deserialize_with = "empty_branch_as_none")]
    pub default_branch: Option<BranchName>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
}

fn empty_branch_as_none<'de, D>(deserializer: D) -> Result<Option<BranchName>, D::Error>
where
    D: Deserializer<'de>,
{
    let branch = Option::<String>::deserialize(deserializer)?;
    Ok(branch.filter(|b| !b.is_empty()).map(BranchName))
}

/// Everything the engine needs to sync one repository.
#[derive(Debug, Clone)]
pub struct RepoSyncConfig {
    pub repository: Repository,
    pub target_dir: PathBuf,
    pub token: GitHubToken,
    pub organization: OrganizationName,
    pub method: CloneMethod,
}

impl RepoSyncConfig {
    /// Where the repository lives on disk.
    pub fn local_path(&self) -> PathBuf {
        local_path(&self.target_dir, &self.repository.name)
    }

    /// URL handed to `git clone`. May embed the token; do not log it.
    pub fn clone_url(&self) -> String {
        let repo = &self.repository;
        match self.method {
            CloneMethod::Ssh => repo.ssh_url.to_string(),
            CloneMethod::Http if repo.private => {
                let host = repo
                    .clone_url
                    .host()
                    .unwrap_or_else(|| DEFAULT_GIT_HOST.to_string());
                format!(
                    "https://{}@{}/{}/{}.git",
                    self.token.expose(),
                    host,
                    self.organization,
                    repo.name
                )
            }
            CloneMethod::Http => repo.clone_url.to_string(),
        }
    }
}

pub fn local_path(target_dir: &Path, name: &RepositoryName) -> PathBuf {
    target_dir.join(name.as_str())
}
