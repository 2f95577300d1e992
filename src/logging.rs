use std::io;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::{self, fmt, prelude::*};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_DIR_NAME: &str = "dict-completion";
const SESSION_PREFIX: &str = "session-";

/// Logger settings, usually taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions<'a> {
    /// Disable ANSI colors in stderr output
    pub no_color: bool,
    /// Override log level (otherwise uses RUST_LOG or defaults to "info")
    pub log_level: Option<&'a str>,
    /// Write a DEBUG-level session log under the user cache directory
    pub file_logging: bool,
}

/// Get the log directory path in the user-specific OS cache directory
/// - Linux: ~/.cache/dict-completion/
/// - macOS: ~/Library/Caches/dict-completion/
/// - Windows: %LOCALAPPDATA%\dict-completion\
fn get_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory"))?;

    let log_dir = cache_dir.join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

fn is_session_log(name: &str) -> bool {
    name.starts_with(SESSION_PREFIX) && name.ends_with(".log")
}

/// Removes session logs older than `retention`. Returns how many were removed.
fn cleanup_old_logs(log_dir: &Path, retention: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() || !entry.file_name().to_str().is_some_and(is_session_log) {
            continue;
        }
        let expired = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        if expired {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e),
            }
        }
    }
    removed
}

fn session_log_name() -> io::Result<String> {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(format!("{}{}-{}.log", SESSION_PREFIX, timestamp, std::process::id()))
}

fn already_set(e: &dyn std::error::Error) -> bool {
    let message = e.to_string();
    message.contains("already been set") || message.contains("SetLoggerError")
}

/// Initialize logger with stderr output and, optionally, a session log file.
/// Returns a WorkerGuard that must be kept alive for the duration of the program.
///
/// # Logging Behavior
/// - **Stderr**: Logs at the configured level (default "info"). Stdout carries
///   the protocol and is never logged to.
/// - **Session File**: Logs at DEBUG level, including settings payloads and
///   per-request details.
pub fn init_logger(options: LoggingOptions<'_>) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_filter = match options.log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!options.no_color)
        .with_filter(stderr_filter);

    if !options.file_logging {
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());
        return match tracing_subscriber::registry().with(stderr_layer).try_init() {
            Ok(()) => Ok(guard),
            Err(e) if already_set(&e) => Ok(guard),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        };
    }

    let log_dir = get_log_dir()?;
    let removed = cleanup_old_logs(&log_dir, Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60));
    let log_path = log_dir.join(session_log_name()?);

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::EnvFilter::new("debug"));

    match tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        Ok(()) => {}
        Err(e) if already_set(&e) => {}
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
    }

    eprintln!("Logging to file: {:?}", log_path);
    if removed > 0 {
        tracing::debug!("Removed {} expired session logs", removed);
    }
    Ok(guard)
}
