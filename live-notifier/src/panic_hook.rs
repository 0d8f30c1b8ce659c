use std::backtrace::Backtrace;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::logging::current_log_file_name;

/// Route panics through `tracing` before the default hook runs.
///
/// Release builds abort on panic, so the non-blocking file writer may never
/// flush; with a log directory the record is then also written to today's
/// log file synchronously.
pub fn install(log_dir: Option<&Path>) {
    let log_dir = log_dir.map(Path::to_path_buf);
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let _ = panic::catch_unwind(panic::AssertUnwindSafe(|| report(info, log_dir.as_ref())));
        default_hook(info);
    }));
}

fn report(info: &PanicHookInfo<'_>, log_dir: Option<&PathBuf>) {
    let record = PanicRecord::capture(info);
    tracing::error!(target: "live_notifier::panic", "{record}");

    if cfg!(panic = "abort") {
        if let Some(dir) = log_dir {
            let _ = append_to_todays_log(dir, &record.to_string());
        }
    }
}

struct PanicRecord {
    thread: String,
    location: String,
    message: String,
    backtrace: Backtrace,
}

impl PanicRecord {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| info.to_string());

        Self {
            thread: std::thread::current().name().unwrap_or("<unnamed>").to_string(),
            location: info
                .location()
                .map_or_else(|| "<unknown>".to_string(), |l| l.to_string()),
            message,
            backtrace: Backtrace::force_capture(),
        }
    }
}

impl fmt::Display for PanicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} panic in thread '{}' at {}: {}\n{}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"),
            self.thread,
            self.location,
            self.message,
            self.backtrace
        )
    }
}

fn append_to_todays_log(log_dir: &Path, record: &str) -> std::io::Result<()> {
    let path = log_dir.join(current_log_file_name());
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{record}")?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_todays_log() {
        let dir = tempfile::tempdir().unwrap();
        append_to_todays_log(dir.path(), "first").unwrap();
        append_to_todays_log(dir.path(), "second").unwrap();

        let name = format!(
            "{}.{}",
            crate::logging::LOG_FILE_PREFIX,
            chrono::Utc::now().format("%Y-%m-%d")
        );
        let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
