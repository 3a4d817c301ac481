use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ValidationError;
use crate::types::CloneMethod;

/// Main configuration structure for gitgrab
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory repositories are cloned into (overridden by the CLI argument)
    #[serde(default = "default_base_directory")]
    pub base_directory: String,

    /// GitHub API and discovery settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Organization to mirror (the --org flag takes precedence)
    pub organization: Option<String>,

    /// REST API root
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Clone transport for new clones
    #[serde(default = "default_clone_method")]
    pub clone_method: String, // "ssh", "http"

    /// Page size for the repository listing
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Timeout for each API request in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout: u64,

    /// Repository exclusion patterns
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Include forked repositories
    #[serde(default = "default_true")]
    pub include_forks: bool,

    /// Include archived repositories
    #[serde(default = "default_true")]
    pub include_archived: bool,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Maximum repositories synced at once (1 = sequential)
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Timeout for git operations in seconds
    #[serde(default = "default_git_timeout")]
    pub timeout: u64,

    /// Git executable to invoke
    #[serde(default = "default_git_binary")]
    pub git_binary: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_base_directory() -> String {
    ".".to_string()
}
fn default_api_url() -> String {
    crate::github::DEFAULT_API_URL.to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_clone_method() -> String {
    "ssh".to_string()
}
fn default_per_page() -> u32 {
    crate::github::DEFAULT_PER_PAGE
}
fn default_http_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_max_parallel() -> usize {
    1
}
fn default_git_timeout() -> u64 {
    300
}
fn default_git_binary() -> String {
    "git".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            organization: None,
            api_url: default_api_url(),
            token_env: default_token_env(),
            clone_method: default_clone_method(),
            per_page: default_per_page(),
            timeout: default_http_timeout(),
            exclude_patterns: Vec::new(),
            include_forks: default_true(),
            include_archived: default_true(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            timeout: default_git_timeout(),
            git_binary: default_git_binary(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GitHubConfig {
    /// Configured clone method. Unknown values fall back to ssh; the parse
    /// error is returned alongside so the caller can warn about it.
    pub fn clone_method(&self) -> (CloneMethod, Option<ValidationError>) {
        CloneMethod::parse_or_default(&self.clone_method)
    }

    /// Per-request timeout; zero is raised to one second
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

impl SyncConfig {
    /// Per-subprocess timeout; zero is raised to one second
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;
            config.expand_paths()?;

            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("gitgrab").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.base_directory = shellexpand::full(&self.base_directory)
            .context("Failed to expand base_directory path")?
            .into_owned();

        self.sync.git_binary = shellexpand::full(&self.sync.git_binary)
            .context("Failed to expand git_binary path")?
            .into_owned();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            github: GitHubConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
