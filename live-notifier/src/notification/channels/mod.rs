//! Delivery channels: Discord webhooks, Telegram bots and plain JSON webhooks.

mod discord;
mod telegram;
mod webhook;

pub use discord::{DiscordChannel, DiscordConfig};
pub use telegram::{TelegramChannel, TelegramConfig, TelegramFormat};
pub use webhook::{WebhookChannel, WebhookConfig};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::events::Notification;
use crate::{Error, Result};

/// Longest server-requested rate-limit pause a channel will sit out.
///
/// Deliveries run inside the poll cycle, so anything longer fails the
/// delivery instead.
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Accept a rate-limit pause requested by `service`, or fail the delivery.
fn rate_limit_wait(service: &str, requested: Duration) -> Result<Duration> {
    if requested > MAX_RATE_LIMIT_WAIT {
        return Err(Error::notification(format!(
            "{} asked to wait {:?}, more than the {:?} limit",
            service, requested, MAX_RATE_LIMIT_WAIT
        )));
    }
    Ok(requested)
}

/// One delivery target.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in logs, e.g. `"discord"`.
    fn channel_type(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Deliver once. Retrying is left to the caller.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Configuration of any supported channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    Discord(DiscordConfig),
    Telegram(TelegramConfig),
    Webhook(WebhookConfig),
}

impl ChannelConfig {
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Discord(_) => "discord",
            Self::Telegram(_) => "telegram",
            Self::Webhook(_) => "webhook",
        }
    }

    /// Log-safe description of the target; secrets are elided.
    pub fn describe(&self) -> String {
        match self {
            Self::Discord(c) => format!("discord webhook {}", redact_webhook_url(&c.webhook_url)),
            Self::Telegram(c) => format!("telegram chat {}", c.chat_id),
            Self::Webhook(c) => format!("webhook {}", redact_webhook_url(&c.url)),
        }
    }

    /// Instantiate the channel.
    pub fn into_channel(self) -> Arc<dyn NotificationChannel> {
        match self {
            Self::Discord(c) => Arc::new(DiscordChannel::new(c)),
            Self::Telegram(c) => Arc::new(TelegramChannel::new(c)),
            Self::Webhook(c) => Arc::new(WebhookChannel::new(c)),
        }
    }
}

/// Keep scheme, host and the first path segment; drop everything after.
fn redact_webhook_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(url) => {
            let first = url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty());
            match (url.host_str(), first) {
                (Some(host), Some(first)) => format!("{}://{}/{}/...", url.scheme(), host, first),
                (Some(host), None) => format!("{}://{}", url.scheme(), host),
                _ => "<invalid url>".to_string(),
            }
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
