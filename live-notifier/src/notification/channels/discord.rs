//! Discord webhook delivery.
//!
//! Each notification becomes a single embed. A `429` is waited out using the
//! delay Discord reports, a bounded number of times and never longer than
//! [`MAX_RATE_LIMIT_WAIT`](super::MAX_RATE_LIMIT_WAIT).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use super::{NotificationChannel, rate_limit_wait};
use crate::notification::events::Notification;
use crate::utils::http_client::build_client;
use crate::{Error, Result};

const RATE_LIMIT_ATTEMPTS: u32 = 3;

/// Twitch purple.
const EMBED_COLOR: u32 = 0x9146ff;

const DESCRIPTION_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscordConfig {
    pub enabled: bool,
    /// Full webhook URL, including the token.
    pub webhook_url: String,
    /// Overrides the webhook's display name.
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            username: Some("live-notifier".to_string()),
            avatar_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: String,
    color: u32,
    timestamp: String,
}

pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Self {
        let client = build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    fn message<'a>(&'a self, notification: &'a Notification) -> WebhookMessage<'a> {
        WebhookMessage {
            username: self.config.username.as_deref(),
            avatar_url: self.config.avatar_url.as_deref(),
            embeds: [Embed {
                title: &notification.title,
                description: notification.body.chars().take(DESCRIPTION_LIMIT).collect(),
                color: EMBED_COLOR,
                timestamp: notification.timestamp.to_rfc3339(),
            }],
        }
    }

    async fn post(&self, message: &WebhookMessage<'_>) -> Result<()> {
        for attempt in 1..=RATE_LIMIT_ATTEMPTS {
            let response = self
                .client
                .post(&self.config.webhook_url)
                .json(message)
                .send()
                .await
                .map_err(|e| Error::notification(format!("Discord request failed: {}", e.without_url())))?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            if status != StatusCode::TOO_MANY_REQUESTS {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::notification(format!(
                    "Discord rejected webhook with {}: {}",
                    status, body
                )));
            }

            let wait = rate_limit_wait(
                "Discord",
                parse_retry_after(response.headers()).unwrap_or(Duration::from_secs(1)),
            )?;
            if attempt == RATE_LIMIT_ATTEMPTS {
                warn!(?wait, attempts = attempt, "Discord still rate limiting, giving up");
                break;
            }
            debug!(?wait, attempt, "Discord rate limited");
            tokio::time::sleep(wait).await;
        }

        Err(Error::notification("Discord rate limit not lifted"))
    }
}

/// Delay before retrying a rate-limited request, in fractional seconds.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    ["Retry-After", "X-RateLimit-Reset-After"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok()?.parse::<f64>().ok())
        .find_map(|secs| Duration::try_from_secs_f64(secs).ok())
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn channel_type(&self) -> &'static str {
        "discord"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.webhook_url.is_empty()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        self.post(&self.message(notification)).await?;
        debug!(title = %notification.title, "Delivered to Discord");
        Ok(())
    }
}
