//! Tracing setup for hosts embedding the grid
//!
//! Console output is pretty-printed, file output is JSON rolled daily.
//! `RUST_LOG` overrides the configured filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "rowsync.log";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory the JSON log files are written to
    pub log_dir: PathBuf,
    pub enable_json_logs: bool,
    pub enable_console_logs: bool,
    /// Include file and line in console output
    pub include_location: bool,
    /// Log span creation and close, for timing async operations
    pub enable_spans: bool,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl LoggingConfig {
    /// Verbose console output plus JSON files
    pub fn development() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "info,rowsync_core=debug,rowsync_services=debug".to_string(),
        }
    }

    /// JSON files only, info and above
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: false,
            include_location: false,
            enable_spans: false,
            default_filter: "warn,rowsync_core=info,rowsync_services=info".to_string(),
        }
    }

    /// Console only, nothing written to disk
    pub fn testing() -> Self {
        Self {
            log_dir: std::env::temp_dir().join("rowsync-tests"),
            enable_json_logs: false,
            enable_console_logs: true,
            include_location: true,
            enable_spans: false,
            default_filter: "debug".to_string(),
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes and stops
/// file logging.
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(config: LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // NEW/CLOSE only; ENTER fires on every re-poll of an instrumented future
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut file_writer = None;

    if config.enable_console_logs {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_span_events(span_events.clone())
                .with_ansi(true)
                .pretty()
                .with_filter(env_filter.clone())
                .boxed(),
        );
    }

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_writer = Some(guard);

        layers.push(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(span_events)
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer)
                .with_filter(env_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        console_enabled = config.enable_console_logs,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// Default location of the JSON log files
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rowsync")
        .join("logs")
}

/// Logs the elapsed time of an operation when dropped
pub(crate) struct TimingGuard {
    name: &'static str,
    start: std::time::Instant,
}

impl TimingGuard {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        tracing::debug!(
            operation = self.name,
            duration_ms = self.start.elapsed().as_millis() as u64,
            "Operation completed"
        );
    }
}
