//! Environment-driven configuration for the fetch and process stages

use repometrics_common::{RepoMetricsError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// Public GitHub REST API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Only repositories with strictly more stars than this are requested
pub const DEFAULT_MIN_STARS: u64 = 27_500;

/// Largest page size the search API accepts
pub const MAX_PER_PAGE: u32 = 100;

/// The search API serves at most 1000 results, i.e. 10 full pages
pub const DEFAULT_MAX_PAGES: u32 = 10;

pub const DEFAULT_RAW_PATH: &str = "data/raw/github_repos.csv";
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed/github_repos_processed.csv";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Settings for the paginated repository search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Bearer token; required before any request is made
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// API root, without trailing slash
    pub api_base_url: String,

    /// Star threshold for the `stars:>N` search qualifier
    pub min_stars: u64,

    /// Results per page (1-100)
    pub per_page: u32,

    /// Upper bound on the number of page requests
    pub max_pages: u32,

    /// Per-request timeout; `None` leaves the client default in place
    pub timeout_secs: Option<u64>,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            min_stars: DEFAULT_MIN_STARS,
            per_page: MAX_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs: None,
            user_agent: format!("repometrics/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Create a builder for fluent configuration
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// - `GITHUB_TOKEN`: API token (an empty value counts as unset)
    /// - `GITHUB_API_URL`: API root override
    /// - `REPOMETRICS_MIN_STARS`: star threshold
    /// - `REPOMETRICS_HTTP_TIMEOUT_SECS`: request timeout
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty());

        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.api_base_url = url;
        }

        if let Some(stars) = parse_env::<u64>("REPOMETRICS_MIN_STARS")? {
            config.min_stars = stars;
        }

        config.timeout_secs = parse_env::<u64>("REPOMETRICS_HTTP_TIMEOUT_SECS")?;

        Ok(config)
    }

    /// Value of the `q` search parameter
    pub fn search_query(&self) -> String {
        format!("stars:>{}", self.min_stars)
    }

    /// Full URL of the repository search endpoint
    pub fn search_url(&self) -> String {
        format!("{}/search/repositories", self.api_base_url.trim_end_matches('/'))
    }

    /// Validate configuration
    ///
    /// The token is deliberately not checked here; its absence is reported
    /// by the fetcher so it can be logged with the right message.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(RepoMetricsError::config("API base URL cannot be empty"));
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(RepoMetricsError::config(format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }

        if self.max_pages == 0 {
            return Err(RepoMetricsError::config("max_pages must be greater than 0"));
        }

        if self.timeout_secs == Some(0) {
            return Err(RepoMetricsError::config("Timeout must be greater than 0"));
        }

        Ok(())
    }
}

/// Builder for FetchConfig
#[derive(Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn min_stars(mut self, stars: u64) -> Self {
        self.config.min_stars = stars;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.config.per_page = per_page;
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}

/// Locations of the flat files each stage reads and writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub raw_path: PathBuf,
    pub processed_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from(DEFAULT_RAW_PATH),
            processed_path: PathBuf::from(DEFAULT_PROCESSED_PATH),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl PathsConfig {
    /// Load from `REPOMETRICS_RAW_PATH`, `REPOMETRICS_PROCESSED_PATH` and `LOG_DIR`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("REPOMETRICS_RAW_PATH") {
            config.raw_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("REPOMETRICS_PROCESSED_PATH") {
            config.processed_path = PathBuf::from(path);
        }

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RepoMetricsError::config(format!("Invalid {}='{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
