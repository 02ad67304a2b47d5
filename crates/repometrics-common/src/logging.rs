//! Logging setup for the pipeline stages
//!
//! Each stage logs to stdout and to its own file under the log directory
//! (`logs/fetch_data.log`, `logs/process_data.log`). Everything past the
//! stage defaults comes from `LOG_*` environment variables, see
//! [`LogConfig::merge_env`].
//!
//! Use the `tracing` macros, never `println!`:
//!
//! ```rust,ignore
//! info!("Fetched {} repositories from page {}.", count, page);
//! error!(error = %err, path = %path.display(), "Failed to read file");
//! ```
//!
//! # Example
//!
//! ```no_run
//! use repometrics_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::for_file("logs", "fetch_data.log").merge_env()?;
//!     let _guard = init_logging(&config)?;
//!
//!     tracing::info!("Fetching page 1...");
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    Console,
    File,
    #[default]
    Both,
}

impl LogOutput {
    fn includes_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn includes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            _ => anyhow::bail!("Invalid log output: {}", s),
        }
    }
}

/// Line format, shared by console and file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format: {}", s),
        }
    }
}

/// How the log file is rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRotation {
    /// Append to one file across runs
    #[default]
    Never,
    /// One file per day (`<name>.YYYY-MM-DD`)
    Daily,
}

impl FromStr for LogRotation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "never" => Ok(LogRotation::Never),
            "daily" => Ok(LogRotation::Daily),
            _ => anyhow::bail!("Invalid log rotation: {}", s),
        }
    }
}

/// Logging configuration for one stage
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    pub format: LogFormat,
    pub log_dir: PathBuf,
    pub log_file_name: String,
    pub rotation: LogRotation,

    /// Extra `EnvFilter` directives, e.g. `"reqwest=warn,hyper=info"`
    pub filter_directives: Option<String>,

    /// Add file and line number to each line
    pub include_location: bool,
}

impl LogConfig {
    /// Info level, console + `log_dir/log_file_name`, text format
    pub fn for_file(log_dir: impl Into<PathBuf>, log_file_name: impl Into<String>) -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::default(),
            format: LogFormat::default(),
            log_dir: log_dir.into(),
            log_file_name: log_file_name.into(),
            rotation: LogRotation::default(),
            filter_directives: None,
            include_location: false,
        }
    }

    /// Stage-independent defaults (`logs/repometrics.log`) merged with the environment
    pub fn from_env() -> Result<Self> {
        Self::for_file("logs", "repometrics.log").merge_env()
    }

    /// Override fields with any of these variables that are set:
    ///
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_OUTPUT`: console, file, both
    /// - `LOG_FORMAT`: text, json
    /// - `LOG_DIR`, `LOG_FILE_NAME`
    /// - `LOG_ROTATION`: never, daily
    /// - `LOG_FILTER`: extra filter directives
    /// - `LOG_INCLUDE_LOCATION`: true/false
    ///
    /// An unrecognised value is an error rather than silently ignored.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env_var("LOG_LEVEL") {
            self.level = level
                .parse()
                .with_context(|| format!("Invalid log level: {}", level))?;
        }
        if let Some(output) = env_var("LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = env_var("LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(name) = env_var("LOG_FILE_NAME") {
            self.log_file_name = name;
        }
        if let Some(rotation) = env_var("LOG_ROTATION") {
            self.rotation = rotation.parse()?;
        }
        if let Some(filter) = env_var("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        if let Some(val) = env_var("LOG_INCLUDE_LOCATION") {
            self.include_location = val
                .parse()
                .with_context(|| format!("Invalid LOG_INCLUDE_LOCATION: {}", val))?;
        }

        Ok(self)
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Install the global subscriber
///
/// Call once at startup. With file output enabled the returned guard owns
/// the background writer; keep it alive until exit so buffered lines reach
/// the file.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.output.includes_console() {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location);
        layers.push(match config.format {
            LogFormat::Text => layer.boxed(),
            LogFormat::Json => layer.json().boxed(),
        });
    }

    if config.output.includes_file() {
        let (layer, file_guard) = file_layer(config)?;
        layers.push(layer);
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(guard)
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());

    for directive in config
        .filter_directives
        .iter()
        .flat_map(|d| d.split(','))
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("Failed to parse filter directive: {}", directive))?,
        );
    }

    Ok(filter)
}

fn file_layer(config: &LogConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("Failed to create log directory {}", config.log_dir.display())
    })?;

    let appender = match config.rotation {
        LogRotation::Never => {
            tracing_appender::rolling::never(&config.log_dir, &config.log_file_name)
        },
        LogRotation::Daily => {
            tracing_appender::rolling::daily(&config.log_dir, &config.log_file_name)
        },
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let layer = match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    Ok((layer, guard))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const LOG_VARS: &[&str] = &[
        "LOG_LEVEL",
        "LOG_OUTPUT",
        "LOG_FORMAT",
        "LOG_DIR",
        "LOG_FILE_NAME",
        "LOG_ROTATION",
        "LOG_FILTER",
        "LOG_INCLUDE_LOCATION",
    ];

    fn clear_log_vars() {
        for var in LOG_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_stage_defaults() {
        let config = LogConfig::for_file("logs", "fetch_data.log");
        assert_eq!(config.level, Level::INFO);
        assert!(config.output.includes_console());
        assert!(config.output.includes_file());
        assert_eq!(config.rotation, LogRotation::Never);
        assert_eq!(config.log_file_path(), PathBuf::from("logs/fetch_data.log"));
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("Console".parse::<LogOutput>().unwrap(), LogOutput::Console);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Daily".parse::<LogRotation>().unwrap(), LogRotation::Daily);
        assert!("stderr".parse::<LogOutput>().is_err());
        assert!("hourly".parse::<LogRotation>().is_err());
    }

    #[test]
    #[serial]
    fn test_merge_env_overrides_stage_values() {
        clear_log_vars();
        std::env::set_var("LOG_LEVEL", "warn");
        std::env::set_var("LOG_OUTPUT", "file");
        std::env::set_var("LOG_FILE_NAME", "override.log");
        std::env::set_var("LOG_ROTATION", "daily");

        let config = LogConfig::for_file("logs", "process_data.log").merge_env().unwrap();
        clear_log_vars();

        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.rotation, LogRotation::Daily);
        assert_eq!(config.log_file_path(), PathBuf::from("logs/override.log"));
    }

    #[test]
    #[serial]
    fn test_merge_env_rejects_bad_values() {
        clear_log_vars();
        std::env::set_var("LOG_LEVEL", "loud");
        assert!(LogConfig::from_env().is_err());
        clear_log_vars();

        std::env::set_var("LOG_INCLUDE_LOCATION", "sometimes");
        assert!(LogConfig::from_env().is_err());
        clear_log_vars();
    }

    #[test]
    #[serial]
    fn test_blank_env_values_are_ignored() {
        clear_log_vars();
        std::env::set_var("LOG_LEVEL", "  ");

        let config = LogConfig::from_env().unwrap();
        clear_log_vars();

        assert_eq!(config.level, Level::INFO);
    }

    #[test]
    fn test_filter_rejects_bad_directive() {
        let mut config = LogConfig::for_file("logs", "x.log");
        config.filter_directives = Some("reqwest=warn, hyper=loudest".to_string());
        assert!(build_filter(&config).is_err());

        config.filter_directives = Some("reqwest=warn, hyper=info".to_string());
        assert!(build_filter(&config).is_ok());
    }
}
