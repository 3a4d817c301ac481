use std::time::Duration;
use tracing::{debug, info};

use crate::config::GitHubConfig;
use crate::error::FetchError;
use crate::types::{GitHubToken, OrganizationName, Repository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
pub const USER_AGENT: &str = concat!("gitgrab/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Client for the GitHub organization repository listing
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: GitHubToken,
    api_url: String,
    per_page: u32,
}

impl GitHubClient {
    /// Create a client against the public GitHub API
    pub fn new(token: GitHubToken, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            token,
            api_url: DEFAULT_API_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
        })
    }

    /// Create a client from the `github` config section
    pub fn from_config(config: &GitHubConfig, token: GitHubToken) -> Result<Self, FetchError> {
        Ok(Self::new(token, config.http_timeout())?
            .with_api_url(&config.api_url)
            .with_per_page(config.per_page))
    }

    /// Point the client at another API root (GitHub Enterprise, test servers)
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Fetch every repository of an organization.
    ///
    /// Pages are requested in order until one comes back empty. Any failing
    /// page aborts the whole listing; partial results are never returned.
    pub async fn fetch_all_repos(
        &self,
        org: &OrganizationName,
    ) -> Result<Vec<Repository>, FetchError> {
        debug!("Fetching repositories for organization: {}", org);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let items = self.fetch_page(org, page).await?;
            if items.is_empty() {
                break;
            }

            debug!("Page {} returned {} repositories", page, items.len());
            repositories.extend(items);
            page += 1;
        }

        info!(
            "Found {} repositories for organization: {}",
            repositories.len(),
            org
        );
        Ok(repositories)
    }

    async fn fetch_page(
        &self,
        org: &OrganizationName,
        page: u32,
    ) -> Result<Vec<Repository>, FetchError> {
        let url = format!("{}/orgs/{}/repos", self.api_url, org);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
                ("type", "all".to_string()),
            ])
            .header(reqwest::header::AUTHORIZATION, self.token.auth_header())
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
