//! repometrics Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging, and flat-file table utilities for the
//! repometrics workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RepoMetricsError`] and the [`Result`] alias
//! - **Logging**: console + file `tracing` setup driven by [`logging::LogConfig`]
//! - **Tables**: CSV read/write for any [`table::TableRecord`]
//!
//! # Example
//!
//! ```no_run
//! use repometrics_common::table::{read_columns, ensure_parent_dir};
//! use repometrics_common::Result;
//!
//! fn inspect(path: &str) -> Result<()> {
//!     ensure_parent_dir(path)?;
//!     let columns = read_columns(path)?;
//!     tracing::info!(?columns, "Table columns");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod table;

// Re-export commonly used types
pub use error::{RepoMetricsError, Result};
