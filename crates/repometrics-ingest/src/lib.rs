//! repometrics Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Two batch stages that hand off through a CSV file:
//!
//! - **Fetch** ([`github`]): page through GitHub's repository search, sorted
//!   by stars, into a raw table of [`records::RawRepoRecord`]s
//! - **Process** ([`process`]): derive age, activity and popularity metrics
//!   into a table of [`records::ProcessedRepoRecord`]s
//!
//! # Example
//!
//! ```no_run
//! use repometrics_ingest::config::{FetchConfig, PathsConfig};
//! use repometrics_ingest::{github, process};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let paths = PathsConfig::from_env();
//!
//!     github::run(FetchConfig::from_env()?, &paths.raw_path).await?;
//!
//!     process::run(&paths.raw_path, &paths.processed_path)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod github;
pub mod process;
pub mod records;
