use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitgrab::types::local_path;
use gitgrab::{
    CloneMethod, Config, Discovery, FetchReason, GitHubClient, GitHubDiscovery, GitHubToken,
    HealthCheck, OrganizationName, RepoFilter, RepoOutcome, SyncAction, SyncContext, SyncEngine,
};

#[derive(Parser)]
#[command(name = "gitgrab")]
#[command(about = "Clone or update every repository of a GitHub organization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone missing repositories and update existing ones
    Sync {
        /// Directory to sync into (defaults to base_directory from config)
        target_dir: Option<PathBuf>,

        /// GitHub organization name
        #[arg(long)]
        org: Option<String>,

        /// Clone method: ssh or http
        #[arg(long)]
        method: Option<String>,

        /// Show what would happen without cloning, pulling or fetching
        #[arg(long)]
        dry_run: bool,

        /// Maximum repositories synced at once
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// List the organization's repositories
    List {
        /// GitHub organization name
        #[arg(long)]
        org: Option<String>,

        /// Show repository details
        #[arg(long)]
        details: bool,
    },

    /// System health check and diagnostics
    Doctor {
        /// Directory a sync would use
        target_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.logging.level)?;
    info!("Starting gitgrab v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync {
            target_dir,
            org,
            method,
            dry_run,
            parallel,
        } => cmd_sync(target_dir, org, method, dry_run, parallel, config).await,
        Commands::List { org, details } => cmd_list(org, details, &config).await,
        Commands::Doctor { target_dir } => cmd_doctor(target_dir, &config),
    }
}

/// Initialize logging: RUST_LOG wins, then --verbose, then the configured level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(if verbose { "debug" } else { level })
            .with_context(|| format!("Invalid log level: {}", level))
    })?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

fn resolve_token(config: &Config) -> Result<GitHubToken> {
    let env_name = &config.github.token_env;
    let value = std::env::var(env_name)
        .with_context(|| format!("{} environment variable is required", env_name))?;

    GitHubToken::new(value).with_context(|| format!("{} must not be empty", env_name))
}

fn resolve_org(org: Option<String>, config: &Config) -> Result<OrganizationName> {
    let Some(org) = org.or_else(|| config.github.organization.clone()) else {
        bail!("Organization name is required (--org or github.organization)");
    };

    Ok(OrganizationName::parse(org)?)
}

/// The command line is strict; the config file falls back to ssh with a warning
fn resolve_method(method: Option<String>, config: &Config) -> Result<CloneMethod> {
    if let Some(method) = method {
        return Ok(method.parse::<CloneMethod>()?);
    }

    let (method, error) = config.github.clone_method();
    if let Some(e) = error {
        warn!("{}, using {}", e, method);
    }
    Ok(method)
}

fn resolve_target_dir(target_dir: Option<PathBuf>, config: &Config) -> PathBuf {
    target_dir.unwrap_or_else(|| PathBuf::from(&config.base_directory))
}

fn build_discovery(config: &Config, token: GitHubToken) -> Result<GitHubDiscovery> {
    let client = GitHubClient::from_config(&config.github, token)
        .context("Failed to create GitHub client")?;

    Ok(GitHubDiscovery::new(
        client,
        RepoFilter::from_config(&config.github),
    ))
}

/// Sync every repository of the organization into the target directory
async fn cmd_sync(
    target_dir: Option<PathBuf>,
    org: Option<String>,
    method: Option<String>,
    dry_run: bool,
    parallel: Option<usize>,
    mut config: Config,
) -> Result<()> {
    let token = resolve_token(&config)?;
    let organization = resolve_org(org, &config)?;
    let method = resolve_method(method, &config)?;
    let target_dir = resolve_target_dir(target_dir, &config);

    if let Some(parallel) = parallel {
        config.sync.max_parallel = parallel;
    }

    let git_binary = config.sync.git_binary.clone();
    let git = tokio::task::spawn_blocking(move || HealthCheck::check_git(&git_binary))
        .await
        .context("git availability check did not complete")?;
    if !git.passed {
        bail!("{}", git.message);
    }

    if !dry_run {
        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", target_dir.display()))?;
    }

    let discovery = build_discovery(&config, token.clone())?;
    let engine = SyncEngine::from_config(&config.sync);
    let context = SyncContext {
        target_dir: target_dir.clone(),
        token,
        organization: organization.clone(),
        method,
    };

    println!("Fetching repositories for {} organization...", organization);
    println!("Target directory: {}", target_dir.display());
    println!("Clone method: {}", method);
    println!("{}", "-".repeat(50));

    info!(
        "Discovering repositories for {} via {}",
        organization,
        discovery.provider_name()
    );
    let repositories = discovery
        .discover(&organization)
        .await
        .context("Failed to fetch repositories")?;

    if repositories.is_empty() {
        println!("No repositories found for {} organization", organization);
        return Ok(());
    }

    println!("Found {} repositories", repositories.len());

    if dry_run {
        let plans = engine.plan_repos(repositories, &context).await;
        for (i, (name, action)) in plans.iter().enumerate() {
            println!("[{}/{}] {} would {}", i + 1, plans.len(), name, describe(action));
        }
        return Ok(());
    }

    let summary = engine
        .sync_repos(repositories, &context, print_progress)
        .await;

    println!("{}", "-".repeat(50));
    println!(
        "Completed! Success: {}, Failed: {}",
        summary.successful_operations, summary.failed_operations
    );

    if summary.failed_operations > 0 {
        println!();
        println!("Failed repositories:");
        for error in summary.failures() {
            println!("  {}", error);
        }
    }

    Ok(())
}

fn print_progress(index: usize, total: usize, outcome: &RepoOutcome) {
    match &outcome.result {
        Ok(action) => println!(
            "[{}/{}] ✓ {} ({})",
            index,
            total,
            outcome.name,
            past_tense(action)
        ),
        Err(e) => println!("[{}/{}] ✗ {}", index, total, e),
    }
}

fn past_tense(action: &SyncAction) -> &'static str {
    match action {
        SyncAction::Clone => "cloned",
        SyncAction::Pull => "pulled",
        SyncAction::Fetch { .. } => "fetched",
    }
}

fn describe(action: &SyncAction) -> String {
    match action {
        SyncAction::Clone => "clone".to_string(),
        SyncAction::Pull => "pull".to_string(),
        SyncAction::Fetch { reason } => match reason {
            FetchReason::NoDefaultBranch => "fetch (no default branch)".to_string(),
            FetchReason::BranchUndetermined { error } => {
                format!("fetch (current branch unknown: {})", error)
            }
            FetchReason::DetachedHead => "fetch (detached HEAD)".to_string(),
            FetchReason::OffDefaultBranch { current } => {
                format!("fetch (on {})", current)
            }
        },
    }
}

/// List the repositories a sync would touch
async fn cmd_list(org: Option<String>, details: bool, config: &Config) -> Result<()> {
    let token = resolve_token(config)?;
    let organization = resolve_org(org, config)?;
    let discovery = build_discovery(config, token)?;

    let repositories = discovery
        .discover(&organization)
        .await
        .context("Failed to fetch repositories")?;

    println!("Repositories ({}):", repositories.len());

    for repo in &repositories {
        if details {
            println!("📁 {}", repo.name);
            println!("   🔒 Private: {}", repo.private);
            println!(
                "   🌿 Default branch: {}",
                repo.default_branch
                    .as_ref()
                    .map(|b| b.as_str())
                    .unwrap_or("(none)")
            );
            if repo.fork {
                println!("   🍴 Fork");
            }
            if repo.archived {
                println!("   📦 Archived");
            }
            println!("   🔗 {}", repo.ssh_url);
            println!(
                "   📂 {}",
                local_path(Path::new(&config.base_directory), &repo.name).display()
            );
            println!();
        } else {
            println!("  {}", repo.name);
        }
    }

    Ok(())
}

/// Run health checks and print the report
fn cmd_doctor(target_dir: Option<PathBuf>, config: &Config) -> Result<()> {
    let target_dir = resolve_target_dir(target_dir, config);

    println!("🏥 gitgrab Health Check");
    println!("======================");
    println!();

    let health = HealthCheck::run(config, &target_dir);

    for (name, check) in health.all_checks() {
        let icon = if !check.passed {
            "❌"
        } else if check.is_warning {
            "⚠️ "
        } else {
            "✅"
        };

        println!("{} {}: {}", icon, name, check.message);
        if let Some(details) = &check.details {
            println!("   {}", details);
        }
    }

    println!();

    let warnings = health.warnings().len();
    if warnings > 0 {
        println!("⚠️  {} warning(s)", warnings);
    }

    if health.all_passed() {
        println!("✅ All checks passed!");
        Ok(())
    } else {
        bail!("{} check(s) failed", health.errors().len());
    }
}
