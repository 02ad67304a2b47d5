//! GitHub repository search fetcher
//!
//! Walks the paginated `search/repositories` endpoint, sorted by stars in
//! descending order, and collects every item into raw table rows.
//!
//! Pagination stops at the first of:
//! - the configured page limit,
//! - a page with no items,
//! - a non-success status or a transport failure.
//!
//! The last two are logged but never returned as errors; whatever was
//! collected up to that point is the result. Only a missing token fails the
//! fetch, and it does so before any request is sent.

pub mod models;

use crate::config::FetchConfig;
use crate::records::RawRepoRecord;
use models::SearchResponse;
use repometrics_common::table::{ensure_parent_dir, write_table};
use repometrics_common::{RepoMetricsError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Client for the repository search endpoint
pub struct RepoFetcher {
    client: Client,
    token: String,
    config: FetchConfig,
}

impl RepoFetcher {
    /// Create a fetcher from configuration
    ///
    /// Fails with a configuration error when no token is set or the
    /// configuration is invalid. No network traffic happens here.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let token = match config.token.clone() {
            Some(token) => token,
            None => {
                error!("GitHub token not found. Please set the GITHUB_TOKEN environment variable.");
                return Err(RepoMetricsError::config("GitHub token not found."));
            },
        };

        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            RepoMetricsError::config(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            token,
            config,
        })
    }

    /// Fetch pages until one of the stop conditions is hit
    pub async fn fetch(&self) -> Vec<RawRepoRecord> {
        let mut repos = Vec::new();

        for page in 1..=self.config.max_pages {
            info!("Fetching page {}...", page);

            let response = match self.fetch_page(page).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Error fetching page {}: {}", page, e);
                    break;
                },
            };

            if response.items.is_empty() {
                info!("No more data to fetch.");
                break;
            }

            let count = response.items.len();
            repos.extend(response.items.into_iter().map(RawRepoRecord::from));
            info!("Fetched {} repositories from page {}.", count, page);
        }

        if repos.is_empty() {
            warn!("No data fetched.");
        }

        repos
    }

    /// Request a single 1-based page
    async fn fetch_page(&self, page: u32) -> Result<SearchResponse> {
        let url = self.config.search_url();
        debug!(url = %url, page = page, "Requesting search page");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("q", self.config.search_query()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", self.config.per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| RepoMetricsError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RepoMetricsError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(RepoMetricsError::network(format!(
                "{} - {}",
                status.as_u16(),
                body
            )));
        }

        parse_page(&body)
    }
}

fn parse_page(body: &str) -> Result<SearchResponse> {
    serde_json::from_str(body)
        .map_err(|e| RepoMetricsError::parse(format!("Invalid search response: {}", e)))
}

/// Fetch repositories described by `config`
///
/// Convenience wrapper around [`RepoFetcher`]: a missing token is the only
/// error; an empty vector means nothing could be fetched.
pub async fn fetch_github_repos(config: FetchConfig) -> Result<Vec<RawRepoRecord>> {
    let fetcher = RepoFetcher::new(config)?;
    Ok(fetcher.fetch().await)
}

/// Write fetched repositories to the raw table at `output_path`
pub fn save_raw_data(repos: &[RawRepoRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let output_path = output_path.as_ref();
    write_table(output_path, repos).map_err(|e| {
        error!("Error saving raw data to {}: {}", output_path.display(), e);
        e
    })?;

    info!("Data saved to {}", output_path.display());
    Ok(())
}

/// Run fetch → save into the raw table at `output_path`
///
/// The token is checked before anything touches the filesystem. An empty
/// fetch leaves `output_path` as it was, so a previous raw table survives a
/// failed run. Returns the number of rows written.
pub async fn run(config: FetchConfig, output_path: impl AsRef<Path>) -> Result<usize> {
    let output_path = output_path.as_ref();
    let fetcher = RepoFetcher::new(config)?;

    ensure_parent_dir(output_path)?;
    let repos = fetcher.fetch().await;

    if repos.is_empty() {
        warn!(path = %output_path.display(), "Raw table not written");
        return Ok(0);
    }

    save_raw_data(&repos, output_path)?;
    Ok(repos.len())
}
