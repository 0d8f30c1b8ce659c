//! Notification target URL parsing.
//!
//! Targets use Apprise-style schemes so existing notifier configs carry over.
//! `discord://`, `tgram://`, `json://` and `jsons://` also read options from
//! the query string:
//!
//! | option | applies to | effect |
//! |---|---|---|
//! | `avatar_url=` | discord | avatar shown on the message |
//! | `format=html\|text` | tgram | message rendering |
//! | `method=post\|put` | json | HTTP method |
//! | `+Name=value` | json | extra request header |
//! | `rto=` | all | request timeout in seconds |
//!
//! Other `json://` query pairs stay on the target URL. Plain `http(s)://`
//! targets are used as given.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;
use url::{Url, form_urlencoded};

use super::channels::{
    ChannelConfig, DiscordConfig, TelegramConfig, TelegramFormat, WebhookConfig,
};
use crate::{Error, Result};

const DISCORD_WEBHOOK_BASE: &str = "https://discord.com/api/webhooks";
const DISCORD_HOSTS: &[&str] = &[
    "discord.com",
    "discordapp.com",
    "ptb.discord.com",
    "canary.discord.com",
];

const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Parse one target URL into channel configs.
///
/// Telegram URLs may name several chats and yield one config per chat.
pub fn parse_target(raw: &str) -> Result<Vec<ChannelConfig>> {
    let raw = raw.trim();
    let (scheme, rest) = raw
        .split_once("://")
        .ok_or_else(|| Error::config(format!("notification target has no scheme: {raw}")))?;

    match scheme.to_ascii_lowercase().as_str() {
        "discord" => parse_discord_scheme(raw).map(|c| vec![c]),
        // Bot tokens contain ':', which a URL parser reads as a port.
        "tgram" => parse_telegram(rest),
        "json" => parse_json(rest, "http").map(|c| vec![c]),
        "jsons" => parse_json(rest, "https").map(|c| vec![c]),
        "http" | "https" => {
            let url = Url::parse(raw)
                .map_err(|e| Error::config(format!("invalid notification target: {e}")))?;
            if is_discord_webhook(&url) {
                Ok(vec![ChannelConfig::Discord(discord_config(url.to_string(), None))])
            } else {
                webhook_url(raw).map(|url| {
                    vec![ChannelConfig::Webhook(WebhookConfig {
                        enabled: true,
                        url: url.to_string(),
                        ..Default::default()
                    })]
                })
            }
        }
        other => Err(Error::config(format!(
            "unsupported notification target scheme '{other}'"
        ))),
    }
}

/// Query options recognised on a target URL.
#[derive(Debug, Default)]
struct TargetOptions {
    method: Option<Method>,
    headers: HeaderMap,
    avatar_url: Option<String>,
    format: Option<TelegramFormat>,
    timeout_secs: Option<u64>,
    /// Pairs no option claimed, in order.
    passthrough: Vec<(String, String)>,
}

impl TargetOptions {
    fn parse(query: Option<&str>) -> Result<Self> {
        let mut options = Self::default();
        let segments = query.unwrap_or_default().split('&').filter(|s| !s.is_empty());

        for segment in segments {
            // '+' decodes to a space, so strip the header marker first.
            if let Some(header) = segment.strip_prefix('+') {
                let (name, value) = decode_pair(header);
                options.insert_header(&name, &value)?;
                continue;
            }

            let (key, value) = decode_pair(segment);
            match key.to_ascii_lowercase().as_str() {
                "method" => options.method = Some(parse_method(&value)?),
                "avatar_url" => options.avatar_url = Some(value).filter(|v| !v.is_empty()),
                "format" => options.format = Some(parse_format(&value)?),
                "rto" => options.timeout_secs = Some(parse_timeout(&value)?),
                _ => options.passthrough.push((key, value)),
            }
        }

        Ok(options)
    }

    fn insert_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::try_from(name)
            .map_err(|_| Error::config(format!("invalid header name '{name}' in target")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|_| Error::config(format!("invalid value for header '{name}' in target")))?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Log options that mean nothing for `scheme`.
    fn warn_unused(&self, scheme: &str) {
        for (key, _) in &self.passthrough {
            warn!(scheme, option = %key, "Ignoring unknown notification target option");
        }
        if self.method.is_some() || !self.headers.is_empty() {
            warn!(scheme, "Ignoring method/header options; they only apply to json targets");
        }
    }
}

fn decode_pair(segment: &str) -> (String, String) {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .unwrap_or_default()
}

fn parse_method(value: &str) -> Result<Method> {
    match value.to_ascii_uppercase().as_str() {
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        other => Err(Error::config(format!(
            "unsupported webhook method '{other}', expected POST or PUT"
        ))),
    }
}

fn parse_format(value: &str) -> Result<TelegramFormat> {
    match value.to_ascii_lowercase().as_str() {
        "html" => Ok(TelegramFormat::Html),
        "text" => Ok(TelegramFormat::Text),
        other => Err(Error::config(format!(
            "unsupported telegram format '{other}', expected html or text"
        ))),
    }
}

fn parse_timeout(value: &str) -> Result<u64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0 && *secs <= MAX_TIMEOUT_SECS)
        .map(|secs| secs.ceil() as u64)
        .ok_or_else(|| {
            Error::config(format!(
                "invalid rto '{value}', expected seconds in (0, {MAX_TIMEOUT_SECS}]"
            ))
        })
}

fn parse_discord_scheme(raw: &str) -> Result<ChannelConfig> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("invalid discord target: {e}")))?;

    let webhook_id = url.host_str().filter(|h| !h.is_empty());
    let webhook_token = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()));

    let (Some(webhook_id), Some(webhook_token)) = (webhook_id, webhook_token) else {
        return Err(Error::config(
            "discord target must look like discord://{webhook_id}/{webhook_token}",
        ));
    };

    let options = TargetOptions::parse(url.query())?;
    options.warn_unused("discord");
    if options.format.is_some() {
        warn!("Ignoring format option on discord target");
    }

    let username = Some(url.username())
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    let config = discord_config(
        format!("{DISCORD_WEBHOOK_BASE}/{webhook_id}/{webhook_token}"),
        username,
    );

    Ok(ChannelConfig::Discord(DiscordConfig {
        avatar_url: options.avatar_url,
        timeout_secs: options.timeout_secs.unwrap_or(config.timeout_secs),
        ..config
    }))
}

fn discord_config(webhook_url: String, username: Option<String>) -> DiscordConfig {
    let defaults = DiscordConfig::default();
    DiscordConfig {
        enabled: true,
        webhook_url,
        username: username.or(defaults.username),
        ..defaults
    }
}

fn is_discord_webhook(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| DISCORD_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
        && url.path().starts_with("/api/webhooks/")
}

fn parse_telegram(rest: &str) -> Result<Vec<ChannelConfig>> {
    let rest = rest.split('#').next().unwrap_or_default();
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    let mut parts = path.split('/').filter(|s| !s.is_empty());

    let bot_token = parts
        .next()
        .ok_or_else(|| Error::config("telegram target is missing the bot token"))?;
    let chat_ids: Vec<&str> = parts.collect();
    if chat_ids.is_empty() {
        return Err(Error::config(
            "telegram target must look like tgram://{bot_token}/{chat_id}",
        ));
    }

    let options = TargetOptions::parse(query)?;
    options.warn_unused("tgram");
    if options.avatar_url.is_some() {
        warn!("Ignoring avatar_url option on tgram target");
    }
    let defaults = TelegramConfig::default();

    Ok(chat_ids
        .into_iter()
        .map(|chat_id| {
            ChannelConfig::Telegram(TelegramConfig {
                enabled: true,
                bot_token: bot_token.to_string(),
                chat_id: chat_id.to_string(),
                format: options.format.unwrap_or(defaults.format),
                timeout_secs: options.timeout_secs.unwrap_or(defaults.timeout_secs),
            })
        })
        .collect())
}

/// `json://` / `jsons://`: options are consumed, other query pairs are kept.
fn parse_json(rest: &str, transport: &str) -> Result<ChannelConfig> {
    let rest = rest.split('#').next().unwrap_or_default();
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let options = TargetOptions::parse(query)?;
    if options.avatar_url.is_some() || options.format.is_some() {
        warn!("Ignoring avatar_url/format options on json target");
    }

    let mut url = webhook_url(&format!("{transport}://{path}"))?;
    if !options.passthrough.is_empty() {
        url.query_pairs_mut().extend_pairs(&options.passthrough);
    }

    let defaults = WebhookConfig::default();
    Ok(ChannelConfig::Webhook(WebhookConfig {
        enabled: true,
        url: url.to_string(),
        method: options.method.unwrap_or(defaults.method),
        headers: options.headers,
        timeout_secs: options.timeout_secs.unwrap_or(defaults.timeout_secs),
    }))
}

fn webhook_url(raw: &str) -> Result<Url> {
    let url =
        Url::parse(raw).map_err(|e| Error::config(format!("invalid webhook target: {e}")))?;
    if url.host_str().is_none() {
        return Err(Error::config("webhook target has no host"));
    }
    Ok(url)
}
