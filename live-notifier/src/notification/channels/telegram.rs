//! Telegram bot delivery through `sendMessage`.
//!
//! A `429` carries `parameters.retry_after` in its JSON body; that delay is
//! honoured a bounded number of times, up to
//! [`MAX_RATE_LIMIT_WAIT`](super::MAX_RATE_LIMIT_WAIT).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NotificationChannel, rate_limit_wait};
use crate::notification::events::Notification;
use crate::utils::http_client::build_client;
use crate::{Error, Result};

const RATE_LIMIT_ATTEMPTS: u32 = 3;

/// `sendMessage` rejects longer texts.
const MESSAGE_LIMIT: usize = 4096;

const TRUNCATION_MARK: &str = "\n\n[truncated]";

const API_BASE: &str = "https://api.telegram.org";

/// How message text is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TelegramFormat {
    /// Bold title, escaped body, sent with `parse_mode=HTML`.
    #[default]
    Html,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    /// User, group or channel id.
    pub chat_id: String,
    pub format: TelegramFormat,
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            format: TelegramFormat::Html,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    parameters: Option<ReplyParameters>,
}

#[derive(Debug, Deserialize)]
struct ReplyParameters {
    retry_after: Option<u64>,
}

pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        let client = build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    fn is_html(&self) -> bool {
        self.config.format == TelegramFormat::Html
    }

    fn render(&self, notification: &Notification) -> String {
        let text = if self.is_html() {
            format!(
                "<b>{}</b>\n\n{}",
                escape_html(&notification.title),
                escape_html(&notification.body)
            )
        } else {
            format!("{}\n\n{}", notification.title, notification.body)
        };
        truncate(&text, MESSAGE_LIMIT)
    }

    fn request<'a>(&'a self, notification: &Notification) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.config.chat_id,
            text: self.render(notification),
            parse_mode: self.is_html().then_some("HTML"),
        }
    }

    async fn post(&self, message: &SendMessage<'_>) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", API_BASE, self.config.bot_token);

        for attempt in 1..=RATE_LIMIT_ATTEMPTS {
            // The URL embeds the bot token; keep it out of error text.
            let response = self
                .client
                .post(&url)
                .json(message)
                .send()
                .await
                .map_err(|e| Error::notification(format!("Telegram request failed: {}", e.without_url())))?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            if status != StatusCode::TOO_MANY_REQUESTS {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::notification(format!(
                    "Telegram rejected message with {}: {}",
                    status, body
                )));
            }

            let reply: ErrorReply = response.json().await.unwrap_or_default();
            let wait = rate_limit_wait(
                "Telegram",
                reply
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map_or(Duration::from_secs(1), Duration::from_secs),
            )?;
            if attempt == RATE_LIMIT_ATTEMPTS {
                warn!(?wait, chat_id = %self.config.chat_id, "Telegram still rate limiting, giving up");
                break;
            }
            debug!(?wait, attempt, "Telegram rate limited");
            tokio::time::sleep(wait).await;
        }

        Err(Error::notification("Telegram rate limit not lifted"))
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        self.post(&self.request(notification)).await?;
        debug!(chat_id = %self.config.chat_id, title = %notification.title, "Delivered to Telegram");
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(TRUNCATION_MARK.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARK);
    out
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn chat(chat_id: &str) -> TelegramConfig {
        TelegramConfig {
            enabled: true,
            bot_token: "123456:bot-token".to_string(),
            chat_id: chat_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_enabled_needs_token_and_chat() {
        assert!(!TelegramChannel::new(TelegramConfig::default()).is_enabled());
        assert!(!TelegramChannel::new(chat("")).is_enabled());
        assert!(TelegramChannel::new(chat("-1001")).is_enabled());
    }

    #[test]
    fn test_html_request() {
        let channel = TelegramChannel::new(chat("-1001"));
        let notification = Notification::new(
            "🔴 alice is now LIVE!",
            "<3 Q&A\nGame: Just Chatting\nViewers: 7\nhttps://twitch.tv/alice",
        );

        let value: Value = serde_json::to_value(channel.request(&notification)).unwrap();

        assert_eq!(value["chat_id"], "-1001");
        assert_eq!(value["parse_mode"], "HTML");
        let text = value["text"].as_str().unwrap();
        assert!(text.starts_with("<b>🔴 alice is now LIVE!</b>\n\n"));
        assert!(text.contains("&lt;3 Q&amp;A"));
    }

    #[test]
    fn test_plain_request() {
        let channel = TelegramChannel::new(TelegramConfig {
            format: TelegramFormat::Text,
            ..chat("42")
        });

        let value: Value = serde_json::to_value(channel.request(&Notification::new("a < b", "c")))
            .unwrap();

        assert_eq!(value["text"], "a < b\n\nc");
        assert!(value.get("parse_mode").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");

        let out = truncate(&"é".repeat(MESSAGE_LIMIT + 1), MESSAGE_LIMIT);
        assert_eq!(out.chars().count(), MESSAGE_LIMIT);
        assert!(out.ends_with(TRUNCATION_MARK));
    }

    #[test]
    fn test_error_reply_retry_after() {
        let reply: ErrorReply =
            serde_json::from_str(r#"{"ok":false,"error_code":429,"parameters":{"retry_after":5}}"#)
                .unwrap();
        assert_eq!(reply.parameters.and_then(|p| p.retry_after), Some(5));

        let reply: ErrorReply = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(reply.parameters.is_none());
    }
}
