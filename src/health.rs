//! System health checks for gitgrab
//!
//! This module provides preflight checks to verify the system is properly
//! configured before a sync touches the network or the filesystem.

use crate::Config;
use std::path::Path;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Access token status
    pub token: CheckResult,
    /// Target directory status (warning only, sync creates it)
    pub base_dir: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks against the directory a sync would use
    pub fn run(config: &Config, target_dir: &Path) -> Self {
        Self {
            git: Self::check_git(&config.sync.git_binary),
            token: Self::check_token(&config.github.token_env),
            base_dir: Self::check_base_dir(target_dir),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.git.passed && self.token.passed && self.base_dir.passed
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        [&self.git, &self.token, &self.base_dir]
            .into_iter()
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        [&self.git, &self.token, &self.base_dir]
            .into_iter()
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check that the git executable runs
    pub fn check_git(git_binary: &str) -> CheckResult {
        match std::process::Command::new(git_binary).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(_) => CheckResult::error(format!("`{} --version` failed", git_binary)),
            Err(_) => CheckResult::error_with_details(
                format!("{} not found in PATH", git_binary),
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// Check that the token environment variable is set and non-empty
    fn check_token(token_env: &str) -> CheckResult {
        match std::env::var(token_env) {
            Ok(token) if !token.is_empty() => {
                CheckResult::ok_with_details("GitHub token found", format!("From ${}", token_env))
            }
            Ok(_) => CheckResult::error_with_details(
                format!("{} is empty", token_env),
                format!("export {}=<personal access token>", token_env),
            ),
            Err(_) => CheckResult::error_with_details(
                format!("{} environment variable is not set", token_env),
                format!("export {}=<personal access token>", token_env),
            ),
        }
    }

    /// Check the target directory (missing is only a warning)
    fn check_base_dir(path: &Path) -> CheckResult {
        if path.is_dir() {
            CheckResult::ok_with_details("Target directory exists", path.display().to_string())
        } else if path.exists() {
            CheckResult::error_with_details(
                "Target path is not a directory",
                path.display().to_string(),
            )
        } else {
            CheckResult::warning_with_details(
                "Target directory does not exist yet",
                format!("It will be created: {}", path.display()),
            )
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 3] {
        [
            ("Git Installation", &self.git),
            ("GitHub Token", &self.token),
            ("Target Directory", &self.base_dir),
        ]
    }
}
