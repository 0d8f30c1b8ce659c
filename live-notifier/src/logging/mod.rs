//! Logging setup.
//!
//! This module provides:
//! - `EnvFilter` based level control (`LOG_FILTER` / `RUST_LOG`)
//! - Local timezone timestamps for logs
//! - Optional JSON console output
//! - Optional daily rolling log file with retention cleanup

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogConfig, LogFormat};

/// Used when neither `LOG_FILTER` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "live_notifier=info,platforms_client=info";

/// File name prefix for the daily rolling log file.
pub const LOG_FILE_PREFIX: &str = "live-notifier.log";

/// Rotated files older than this many days are removed.
const LOG_RETENTION_DAYS: i64 = 7;

const RETENTION_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Local wall-clock timestamps with millisecond precision.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Keeps the background file writer alive; drop it only at shutdown.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory of the rolling log file, if file logging is enabled.
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Prune rotated log files once a day until `cancel` fires.
    ///
    /// Does nothing when file logging is off.
    pub fn start_retention_cleanup(&self, cancel: CancellationToken) {
        let Some(log_dir) = self.log_dir.clone() else {
            return;
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(RETENTION_CHECK_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS).await {
                            warn!(dir = %log_dir.display(), error = %e, "Log retention pass failed");
                        }
                    }
                }
            }
            debug!("Log retention stopped");
        });
    }
}

/// Build the filter from config, falling back to [`DEFAULT_LOG_FILTER`].
pub fn build_filter(config: &LogConfig) -> crate::Result<EnvFilter> {
    let directive = config.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directive)
        .map_err(|e| crate::Error::config(format!("Invalid log filter '{}': {}", directive, e)))
}

/// Initialize the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process, otherwise
/// buffered file output is lost.
pub fn init_logging(config: &LogConfig) -> crate::Result<LoggingGuard> {
    let filter = build_filter(config)?;

    let console = match config.format {
        LogFormat::Text => fmt::layer().with_ansi(true).with_timer(LocalTimer).boxed(),
        LogFormat::Json => fmt::layer().json().with_timer(LocalTimer).boxed(),
    };

    let (file_layer, file_guard) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Logging already initialized: {}", e))
        })?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_dir: config.dir.clone(),
    })
}

/// Name of the file the daily appender is writing to right now.
///
/// `tracing_appender` rolls over at UTC midnight and stamps files with the
/// UTC date, whatever the local timezone.
pub(crate) fn current_log_file_name() -> String {
    format!("{}.{}", LOG_FILE_PREFIX, Utc::now().format("%Y-%m-%d"))
}

/// Date stamp of a rotated log file, if `name` is one of ours.
fn rotated_log_date(name: &str) -> Option<NaiveDate> {
    let stamp = name.strip_prefix(LOG_FILE_PREFIX)?.strip_prefix('.')?;
    NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok()
}

/// Remove rotated log files dated more than `keep_days` before today.
async fn cleanup_old_logs(log_dir: &Path, keep_days: i64) -> std::io::Result<usize> {
    let oldest_kept = Utc::now().date_naive() - chrono::Duration::days(keep_days);
    let mut removed = 0;

    let mut dir = tokio::fs::read_dir(log_dir).await?;
    while let Some(entry) = dir.next_entry().await? {
        let expired = entry
            .file_name()
            .to_str()
            .and_then(rotated_log_date)
            .is_some_and(|date| date < oldest_kept);
        if !expired || !entry.file_type().await?.is_file() {
            continue;
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                removed += 1;
                debug!(path = %path.display(), "Removed expired log file");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Could not remove expired log file"),
        }
    }

    if removed > 0 {
        info!(removed, "Log retention pass finished");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("live_notifier=info"));
        assert!(build_filter(&LogConfig::default()).is_ok());
    }

    #[test]
    fn test_custom_filter() {
        let config = LogConfig {
            filter: Some("live_notifier=debug,reqwest=warn".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("live_notifier=debug"));

        let invalid = LogConfig {
            filter: Some("live_notifier=notalevel".to_string()),
            ..Default::default()
        };
        assert!(build_filter(&invalid).is_err());
    }

    #[test]
    fn test_rotated_log_date() {
        assert_eq!(
            rotated_log_date("live-notifier.log.2024-03-09"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
        assert_eq!(rotated_log_date("live-notifier.log"), None);
        assert_eq!(rotated_log_date("live-notifier.log.latest"), None);
        assert_eq!(rotated_log_date("other.log.2024-03-09"), None);
    }

    #[tokio::test]
    async fn test_cleanup_old_logs() {
        let dir = tempfile::tempdir().unwrap();
        let today = Utc::now().date_naive();
        let dated = |date: NaiveDate| {
            dir.path()
                .join(format!("{}.{}", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
        };

        let old = dir.path().join(format!("{}.2000-01-01", LOG_FILE_PREFIX));
        let fresh = dir.path().join(current_log_file_name());
        let oldest_kept = dated(today - chrono::Duration::days(LOG_RETENTION_DAYS));
        let just_expired = dated(today - chrono::Duration::days(LOG_RETENTION_DAYS + 1));
        let unrelated = dir.path().join("notes.txt");
        for path in [&old, &fresh, &oldest_kept, &just_expired, &unrelated] {
            std::fs::write(path, "x").unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).await.unwrap();
        assert_eq!(removed, 2);
        assert!(!old.exists());
        assert!(!just_expired.exists());
        assert!(fresh.exists());
        assert!(oldest_kept.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_current_log_file_matches_appender() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let mut appender = tracing_appender::rolling::daily(dir.path(), LOG_FILE_PREFIX);
        appender.write_all(b"line\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![current_log_file_name()]);
    }
}
