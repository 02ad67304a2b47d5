//! Raw table → processed table
//!
//! Loads the raw repository table, derives per-row metrics and writes the
//! processed table. Every derived value is a pure function of its row, of a
//! single "now" captured once per batch, and of the batch-wide popularity
//! score range.

use crate::records::{
    PopularityCategory, ProcessedRepoRecord, RawRepoRecord, UNKNOWN_LANGUAGE,
};
use chrono::{DateTime, Utc};
use repometrics_common::table::{read_table, write_table};
use repometrics_common::Result;
use std::path::Path;
use tracing::{error, info};

/// A repository pushed to within this many days counts as active
pub const ACTIVE_WINDOW_DAYS: i64 = 180;

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_YEAR: f64 = 365.0;

/// Load the raw table at `input_path`
///
/// A missing file is returned as [`repometrics_common::RepoMetricsError::FileNotFound`]; a row
/// that fails to parse (including its timestamps) aborts the load.
pub fn load_raw_data(input_path: impl AsRef<Path>) -> Result<Vec<RawRepoRecord>> {
    let input_path = input_path.as_ref();
    info!("Loading raw data from {}...", input_path.display());

    read_table(input_path).map_err(|e| {
        error!("Error loading raw data: {}", e);
        e
    })
}

/// Derive metrics for every row, using the current time as "now"
pub fn process_data(rows: Vec<RawRepoRecord>) -> Vec<ProcessedRepoRecord> {
    process_data_at(rows, Utc::now())
}

/// Derive metrics for every row against a fixed capture point
pub fn process_data_at(
    rows: Vec<RawRepoRecord>,
    now: DateTime<Utc>,
) -> Vec<ProcessedRepoRecord> {
    info!("Processing data...");

    let scores: Vec<u64> = rows.iter().map(|r| popularity_score(r.stars, r.forks)).collect();
    let normalizer = MinMax::over(&scores);

    let processed = rows
        .into_iter()
        .zip(scores)
        .map(|(row, score)| derive(row, score, now, normalizer))
        .collect();

    info!("Data processing complete.");
    processed
}

/// Write the processed table to `output_path`
pub fn save_processed_data(
    rows: &[ProcessedRepoRecord],
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Saving processed data to {}...", output_path.display());

    write_table(output_path, rows).map_err(|e| {
        error!("Error saving processed data: {}", e);
        e
    })?;

    info!("Processed data saved successfully.");
    Ok(())
}

/// Load a previously saved processed table
pub fn load_processed_data(path: impl AsRef<Path>) -> Result<Vec<ProcessedRepoRecord>> {
    let path = path.as_ref();
    read_table(path).map_err(|e| {
        error!("Error loading processed data: {}", e);
        e
    })
}

/// Run load → process → save
pub fn run(input_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> Result<usize> {
    let raw = load_raw_data(input_path)?;
    let processed = process_data(raw);
    save_processed_data(&processed, output_path)?;
    Ok(processed.len())
}

/// `stars + 2 * forks`
pub fn popularity_score(stars: u64, forks: u64) -> u64 {
    stars.saturating_add(forks.saturating_mul(2))
}

/// Whole days from `from` to `now`, rounded towards negative infinity
fn whole_days_between(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn derive(
    row: RawRepoRecord,
    score: u64,
    now: DateTime<Utc>,
    normalizer: MinMax,
) -> ProcessedRepoRecord {
    // An empty language reads back from the raw table as missing
    let language = row
        .language
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
    let language_known = language != UNKNOWN_LANGUAGE;

    let repo_age_days = whole_days_between(row.creation_date, now);
    let repo_age_years = repo_age_days as f64 / DAYS_PER_YEAR;
    let days_since_last_commit = whole_days_between(row.last_commit_date, now);

    let stars = row.stars as f64;
    let forks = row.forks as f64;

    ProcessedRepoRecord {
        name: row.name,
        language,
        stars: row.stars,
        forks: row.forks,
        creation_date: row.creation_date,
        last_commit_date: row.last_commit_date,
        repo_url: row.repo_url,
        repo_age_years,
        repo_age_days,
        days_since_last_commit,
        is_active: days_since_last_commit <= ACTIVE_WINDOW_DAYS,
        stars_per_year: stars / repo_age_years,
        forks_per_year: forks / repo_age_years,
        popularity_score: score,
        engagement_rate: (stars + forks) / repo_age_years,
        star_to_fork_ratio: stars / row.forks.max(1) as f64,
        language_known,
        category: PopularityCategory::from_stars(row.stars),
        popularity_score_normalized: normalizer.scale(score),
    }
}

/// Batch-wide min-max scaling onto `[0, 100]`
#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: u64,
    max: u64,
}

impl MinMax {
    fn over(values: &[u64]) -> Self {
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        Self { min, max }
    }

    fn scale(self, value: u64) -> f64 {
        // Degenerate range: everything equal to the max scores 100
        if self.min == self.max {
            return if value == self.max { 100.0 } else { 0.0 };
        }
        100.0 * (value - self.min) as f64 / (self.max - self.min) as f64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn raw(name: &str, language: Option<&str>, stars: u64, forks: u64) -> RawRepoRecord {
        RawRepoRecord {
            name: name.to_string(),
            language: language.map(str::to_string),
            stars,
            forks,
            creation_date: at(2020, 1, 1),
            last_commit_date: at(2022, 1, 1),
            repo_url: format!("https://github.com/example/{}", name),
        }
    }

    #[test]
    fn test_popularity_score() {
        let now = at(2023, 1, 1);
        let out = process_data_at(vec![raw("repo1", Some("Python"), 100, 10)], now);
        assert_eq!(out[0].popularity_score, 120);
    }

    #[test]
    fn test_ages_share_one_capture_point() {
        let now = at(2021, 1, 1);
        let mut older = raw("older", Some("Go"), 10, 1);
        older.creation_date = at(2020, 1, 1);
        older.last_commit_date = at(2020, 12, 1);

        let out = process_data_at(vec![older.clone(), older], now);

        // 2020 is a leap year
        assert_eq!(out[0].repo_age_days, 366);
        assert!((out[0].repo_age_years - 366.0 / 365.0).abs() < 1e-12);
        assert_eq!(out[0].days_since_last_commit, 31);
        assert!(out[0].is_active);
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn test_partial_days_are_floored() {
        let now = Utc.with_ymd_and_hms(2021, 1, 2, 23, 59, 59).unwrap();
        let mut row = raw("r", Some("C"), 1, 1);
        row.creation_date = at(2021, 1, 1);
        row.last_commit_date = Utc.with_ymd_and_hms(2021, 1, 3, 0, 0, 1).unwrap();

        let out = process_data_at(vec![row], now);
        assert_eq!(out[0].repo_age_days, 1);
        assert_eq!(out[0].days_since_last_commit, -1);
    }

    #[test]
    fn test_activity_window_boundary() {
        let now = at(2022, 1, 1);
        let mut active = raw("active", Some("Rust"), 1, 1);
        active.last_commit_date = now - chrono::Duration::days(180);
        let mut stale = raw("stale", Some("Rust"), 1, 1);
        stale.last_commit_date = now - chrono::Duration::days(181);

        let out = process_data_at(vec![active, stale], now);
        assert!(out[0].is_active);
        assert!(!out[1].is_active);
    }

    #[test]
    fn test_rates() {
        let now = at(2022, 1, 1);
        let mut row = raw("r", Some("Rust"), 730, 365);
        row.creation_date = now - chrono::Duration::days(730);

        let out = &process_data_at(vec![row], now)[0];
        assert_eq!(out.repo_age_years, 2.0);
        assert_eq!(out.stars_per_year, 365.0);
        assert_eq!(out.forks_per_year, 182.5);
        assert_eq!(out.engagement_rate, 547.5);
        assert_eq!(out.star_to_fork_ratio, 2.0);
    }

    #[test]
    fn test_zero_forks_ratio_uses_one() {
        let out = process_data_at(vec![raw("r", Some("Rust"), 42, 0)], at(2023, 1, 1));
        assert_eq!(out[0].star_to_fork_ratio, 42.0);
    }

    #[test]
    fn test_zero_age_rates_are_infinite() {
        let now = at(2022, 1, 1);
        let mut row = raw("new", Some("Rust"), 5, 0);
        row.creation_date = now;

        let out = &process_data_at(vec![row], now)[0];
        assert_eq!(out.repo_age_days, 0);
        assert!(out.stars_per_year.is_infinite());
        assert!(out.forks_per_year.is_nan());
    }

    #[test]
    fn test_missing_language_becomes_unknown() {
        let out = process_data_at(
            vec![raw("repo1", Some("Python"), 100, 10), raw("repo2", None, 50, 5)],
            at(2023, 1, 1),
        );
        assert_eq!(out[1].language, UNKNOWN_LANGUAGE);
        assert!(!out[1].language_known);
        assert!(out[0].language_known);
    }

    #[test]
    fn test_literal_unknown_language_is_not_known() {
        let out = process_data_at(vec![raw("r", Some("Unknown"), 1, 1)], at(2023, 1, 1));
        assert!(!out[0].language_known);
    }

    #[test]
    fn test_empty_language_matches_raw_table_reload() {
        let out = process_data_at(vec![raw("r", Some(""), 1, 1)], at(2023, 1, 1));
        assert_eq!(out[0].language, UNKNOWN_LANGUAGE);
        assert!(!out[0].language_known);
    }

    #[test]
    fn test_normalization_spans_zero_to_hundred() {
        let out = process_data_at(
            vec![
                raw("a", Some("Rust"), 100, 10),
                raw("b", Some("Rust"), 50, 5),
                raw("c", Some("Rust"), 75, 7),
            ],
            at(2023, 1, 1),
        );

        assert_eq!(out[0].popularity_score_normalized, 100.0);
        assert_eq!(out[1].popularity_score_normalized, 0.0);
        // (89 - 60) / (120 - 60)
        assert!((out[2].popularity_score_normalized - 100.0 * 29.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_scores_normalize_to_hundred() {
        let out = process_data_at(
            vec![raw("a", None, 100, 10), raw("b", None, 100, 10), raw("c", None, 80, 20)],
            at(2023, 1, 1),
        );
        assert!(out.iter().all(|r| r.popularity_score == 120));
        assert!(out.iter().all(|r| r.popularity_score_normalized == 100.0));
    }

    #[test]
    fn test_category_from_stars() {
        let out = process_data_at(
            vec![
                raw("none", None, 0, 0),
                raw("low", None, 10_000, 0),
                raw("mid", None, 50_000, 0),
                raw("high", None, 50_001, 0),
            ],
            at(2023, 1, 1),
        );
        let categories: Vec<_> = out.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                None,
                Some(PopularityCategory::Low),
                Some(PopularityCategory::Moderate),
                Some(PopularityCategory::High),
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        assert!(process_data(Vec::new()).is_empty());
    }

    #[test]
    fn test_min_max_scale() {
        let mm = MinMax::over(&[10, 20, 30]);
        assert_eq!(mm.scale(10), 0.0);
        assert_eq!(mm.scale(20), 50.0);
        assert_eq!(mm.scale(30), 100.0);

        let flat = MinMax::over(&[7, 7]);
        assert_eq!(flat.scale(7), 100.0);
        assert_eq!(flat.scale(3), 0.0);
    }
}
