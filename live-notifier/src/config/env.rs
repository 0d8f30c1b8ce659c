use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use platforms_client::TwitchCredentials;

use crate::{Error, Result};

/// Polling interval used when `CHECK_INTERVAL` is unset.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
const ENV_CHANNELS: &str = "TWITCH_CHANNELS";
const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
const ENV_NOTIFY_URLS: &str = "NOTIFY_URLS";
const ENV_APPRISE_URLS: &str = "APPRISE_URLS";
const ENV_NOTIFY_ON_OFFLINE: &str = "NOTIFY_ON_OFFLINE";
const ENV_LOG_FILTER: &str = "LOG_FILTER";
const ENV_RUST_LOG: &str = "RUST_LOG";
const ENV_LOG_DIR: &str = "LOG_DIR";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!(
                "{ENV_LOG_FORMAT} must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `None` means the built-in default.
    pub filter: Option<String>,
    /// Directory for the daily rolling log file; `None` logs to stdout only.
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Channel names, lower-cased and de-duplicated, in configuration order.
    pub channels: Vec<String>,
    pub check_interval: Duration,
    /// Notification target URLs.
    pub notify_urls: Vec<String>,
    pub notify_on_offline: bool,
    pub log: LogConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("channels", &self.channels)
            .field("check_interval", &self.check_interval)
            .field("notify_urls", &self.notify_urls.len())
            .field("notify_on_offline", &self.notify_on_offline)
            .field("log", &self.log)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = required(&lookup, ENV_CLIENT_ID)?;
        let client_secret = required(&lookup, ENV_CLIENT_SECRET)?;

        let channels = parse_channels(&lookup(ENV_CHANNELS).unwrap_or_default());
        let check_interval = parse_interval(lookup(ENV_CHECK_INTERVAL).as_deref())?;

        let notify_urls = lookup(ENV_NOTIFY_URLS)
            .or_else(|| lookup(ENV_APPRISE_URLS))
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        let notify_on_offline = parse_flag(lookup(ENV_NOTIFY_ON_OFFLINE).as_deref());

        let log = LogConfig {
            filter: lookup(ENV_LOG_FILTER)
                .or_else(|| lookup(ENV_RUST_LOG))
                .filter(|v| !v.trim().is_empty()),
            dir: lookup(ENV_LOG_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            format: lookup(ENV_LOG_FORMAT)
                .as_deref()
                .map(LogFormat::from_str)
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            client_id,
            client_secret,
            channels,
            check_interval,
            notify_urls,
            notify_on_offline,
            log,
        })
    }

    pub fn credentials(&self) -> TwitchCredentials {
        TwitchCredentials::new(&self.client_id, &self.client_secret)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config(format!("{key} is required")))
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Channel names are case-insensitive; keep the first occurrence of each.
pub fn parse_channels(raw: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for name in parse_list(raw) {
        let name = name.to_lowercase();
        if !channels.contains(&name) {
            channels.push(name);
        }
    }
    channels
}

/// Parse the polling interval in whole seconds; must be positive.
pub fn parse_interval(raw: Option<&str>) -> Result<Duration> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS));
    };

    match raw.parse::<u64>() {
        Ok(0) => Err(Error::config(format!(
            "{ENV_CHECK_INTERVAL} must be a positive number of seconds"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(Error::config(format!(
            "{ENV_CHECK_INTERVAL} must be a positive integer, got '{raw}': {e}"
        ))),
    }
}

/// Only `true` (any case) enables a flag.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_CLIENT_ID, "cid"),
            (ENV_CLIENT_SECRET, "s3cr3t-value"),
            (ENV_CHANNELS, "Alice, bob"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&base())).unwrap();
        assert_eq!(config.channels, vec!["alice", "bob"]);
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert!(config.notify_urls.is_empty());
        assert!(!config.notify_on_offline);
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.log.filter.is_none());
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn test_missing_credentials() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_CLIENT_ID, "cid")])).unwrap_err();
        assert!(err.to_string().contains(ENV_CLIENT_SECRET));

        let err = AppConfig::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "  "),
            (ENV_CLIENT_SECRET, "s"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_full_config() {
        let mut pairs = base();
        pairs.extend([
            (ENV_CHECK_INTERVAL, "15"),
            (ENV_NOTIFY_URLS, "discord://1/abc, ,tgram://tok/42"),
            (ENV_NOTIFY_ON_OFFLINE, "TRUE"),
            (ENV_LOG_FILTER, "live_notifier=debug"),
            (ENV_LOG_DIR, "/var/log/live-notifier"),
            (ENV_LOG_FORMAT, "json"),
        ]);

        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(15));
        assert_eq!(config.notify_urls, vec!["discord://1/abc", "tgram://tok/42"]);
        assert!(config.notify_on_offline);
        assert_eq!(config.log.filter.as_deref(), Some("live_notifier=debug"));
        assert_eq!(
            config.log.dir.as_deref(),
            Some(std::path::Path::new("/var/log/live-notifier"))
        );
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_apprise_urls_alias() {
        let mut pairs = base();
        pairs.push((ENV_APPRISE_URLS, "json://example.com/hook"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.notify_urls, vec!["json://example.com/hook"]);

        pairs.push((ENV_NOTIFY_URLS, "tgram://tok/1"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.notify_urls, vec!["tgram://tok/1"]);
    }

    #[test]
    fn test_parse_channels() {
        assert_eq!(parse_channels(""), Vec::<String>::new());
        assert_eq!(parse_channels(" , ,"), Vec::<String>::new());
        assert_eq!(
            parse_channels("Alice,bob, ALICE ,carol"),
            vec!["alice", "bob", "carol"]
        );
    }

    #[rstest]
    #[case(None, Some(60))]
    #[case(Some(""), Some(60))]
    #[case(Some("5"), Some(5))]
    #[case(Some(" 120 "), Some(120))]
    #[case(Some("0"), None)]
    #[case(Some("-1"), None)]
    #[case(Some("1.5"), None)]
    #[case(Some("soon"), None)]
    fn test_parse_interval(#[case] raw: Option<&str>, #[case] expected: Option<u64>) {
        let parsed = parse_interval(raw).ok().map(|d| d.as_secs());
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("true"), true)]
    #[case(Some("True"), true)]
    #[case(Some(" TRUE "), true)]
    #[case(Some("false"), false)]
    #[case(Some("1"), false)]
    #[case(Some("yes"), false)]
    fn test_parse_flag(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[test]
    fn test_invalid_log_format() {
        let mut pairs = base();
        pairs.push((ENV_LOG_FORMAT, "xml"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AppConfig::from_lookup(lookup_from(&base())).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cr3t-value"));
        assert!(printed.contains("<redacted>"));
    }
}
