//! Row types for the raw and processed repository tables

use chrono::{DateTime, Utc};
use repometrics_common::table::TableRecord;
use serde::{Deserialize, Serialize};

/// Language sentinel written when the API reports no primary language
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Star count at or below which a repository is "Low Popularity"
pub const MODERATE_POPULARITY_STARS: u64 = 10_000;

/// Star count above which a repository is "High Popularity"
pub const HIGH_POPULARITY_STARS: u64 = 50_000;

/// One repository as returned by the search API, one row of the raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRepoRecord {
    pub name: String,

    /// Primary language; `None` when the API reports none
    pub language: Option<String>,

    pub stars: u64,

    pub forks: u64,

    pub creation_date: DateTime<Utc>,

    /// Time of the most recent push
    pub last_commit_date: DateTime<Utc>,

    pub repo_url: String,
}

impl TableRecord for RawRepoRecord {
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "language",
        "stars",
        "forks",
        "creation_date",
        "last_commit_date",
        "repo_url",
    ];
}

/// Popularity bucket derived from the star count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopularityCategory {
    #[serde(rename = "Low Popularity")]
    Low,
    #[serde(rename = "Moderate Popularity")]
    Moderate,
    #[serde(rename = "High Popularity")]
    High,
}

impl PopularityCategory {
    /// Bucket a star count into right-closed bins `(0, 10000]`,
    /// `(10000, 50000]` and `(50000, inf)`.
    ///
    /// Zero stars falls outside every bin and has no category.
    pub fn from_stars(stars: u64) -> Option<Self> {
        match stars {
            0 => None,
            s if s <= MODERATE_POPULARITY_STARS => Some(Self::Low),
            s if s <= HIGH_POPULARITY_STARS => Some(Self::Moderate),
            _ => Some(Self::High),
        }
    }
}

/// A raw row plus the metrics derived from it, one row of the processed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRepoRecord {
    pub name: String,
    /// Primary language, [`UNKNOWN_LANGUAGE`] when absent from the raw row
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub creation_date: DateTime<Utc>,
    pub last_commit_date: DateTime<Utc>,
    pub repo_url: String,

    pub repo_age_years: f64,
    pub repo_age_days: i64,
    pub days_since_last_commit: i64,
    pub is_active: bool,
    pub stars_per_year: f64,
    pub forks_per_year: f64,
    /// `stars + 2 * forks`
    pub popularity_score: u64,
    pub engagement_rate: f64,
    pub star_to_fork_ratio: f64,
    pub language_known: bool,
    pub category: Option<PopularityCategory>,
    /// `popularity_score` min-max scaled to `[0, 100]` across the batch
    pub popularity_score_normalized: f64,
}

impl TableRecord for ProcessedRepoRecord {
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "language",
        "stars",
        "forks",
        "creation_date",
        "last_commit_date",
        "repo_url",
        "repo_age_years",
        "repo_age_days",
        "days_since_last_commit",
        "is_active",
        "stars_per_year",
        "forks_per_year",
        "popularity_score",
        "engagement_rate",
        "star_to_fork_ratio",
        "language_known",
        "category",
        "popularity_score_normalized",
    ];
}
