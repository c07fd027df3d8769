//! Subscriber configuration
//!
//! Console output is compact text or JSON, with an optional non-blocking
//! log file next to it.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter directives, e.g. `debug` or `info,multiview::grid=trace`
pub const LOG_ENV: &str = "MULTIVIEW_LOG";
/// Set to `json` for JSON console output
pub const LOG_FORMAT_ENV: &str = "MULTIVIEW_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_enabled: bool,
    pub file_enabled: bool,
    /// Defaults to `multiview.log` in the working directory
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn log_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(|| PathBuf::from("multiview.log"))
    }
}

/// `MULTIVIEW_LOG`, then `RUST_LOG`, then the configured default
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level))
}

fn wants_json(config: &LogConfig) -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(config.json_format)
}

/// Install the global subscriber.
///
/// Keep the returned guard alive while logging to a file, dropping it
/// flushes the writer thread.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let use_json = wants_json(config);
    let subscriber = tracing_subscriber::registry().with(env_filter(config));
    let mut file_guard = None;

    if config.file_enabled {
        let log_path = config.log_path();
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&log_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        file_guard = Some(guard);

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        if config.console_enabled {
            let console_layer = fmt::layer().with_target(true).compact();
            subscriber.with(file_layer).with(console_layer).try_init()?;
        } else {
            subscriber.with(file_layer).try_init()?;
        }
    } else if config.console_enabled {
        if use_json {
            let json_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(json_layer).try_init()?;
        } else {
            subscriber.with(fmt::layer().with_target(true).compact()).try_init()?;
        }
    } else {
        subscriber.try_init()?;
    }

    tracing::info!(
        target: "multiview",
        version = env!("CARGO_PKG_VERSION"),
        json_format = use_json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(file_guard)
}

pub fn init_logging_default() -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    init_logging(&LogConfig::default())
}

pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.console_enabled);
        assert!(!config.file_enabled);
        assert!(!config.json_format);
        assert_eq!(config.default_level, "info");
        assert_eq!(config.log_path(), PathBuf::from("multiview.log"));
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LogConfig { console_enabled: false, ..Default::default() };
        // Whichever call wins the global slot, the other must fail cleanly
        let first = init_logging(&config);
        let second = init_logging(&config);
        assert!(first.is_err() || second.is_err());
    }
}
