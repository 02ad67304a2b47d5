//! Wire types for the repository search endpoint

use crate::records::RawRepoRecord;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Body of `GET /search/repositories`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Missing `items` is treated the same as an empty page
    #[serde(default)]
    pub items: Vec<RepoItem>,
}

/// The subset of a search result item that ends up in the raw table
#[derive(Debug, Clone, Deserialize)]
pub struct RepoItem {
    pub name: String,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    pub html_url: String,
}

impl From<RepoItem> for RawRepoRecord {
    fn from(item: RepoItem) -> Self {
        Self {
            name: item.name,
            language: item.language,
            stars: item.stargazers_count,
            forks: item.forks_count,
            creation_date: item.created_at,
            last_commit_date: item.pushed_at,
            repo_url: item.html_url,
        }
    }
}
