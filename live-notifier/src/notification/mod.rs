//! Notification system module.
//!
//! Fans a (title, body) message out to every configured delivery target.
//! Targets are given as URLs and turned into channels by [`targets`]:
//!
//! - `discord://{webhook_id}/{webhook_token}` or a Discord webhook URL
//! - `tgram://{bot_token}/{chat_id}[/{chat_id}...]`
//! - `json://host/path`, `jsons://host/path` or any other `http(s)://` URL
//!   (generic JSON webhook)
//!
//! Delivery is best-effort: failures are retried with exponential backoff and
//! then logged. Callers of [`Notifier::notify`] never see them.
//!
//! # Example
//!
//! ```ignore
//! use live_notifier::notification::{NotificationService, NotificationServiceConfig, Notifier};
//!
//! let service = NotificationService::from_target_urls(
//!     &["discord://1234/abcd".to_string()],
//!     NotificationServiceConfig::default(),
//! );
//! service.notify("Hello", "World").await;
//! ```

pub mod channels;
pub mod events;
pub mod service;
pub mod targets;

use async_trait::async_trait;

pub use channels::{
    ChannelConfig, DiscordConfig, NotificationChannel, TelegramConfig, TelegramFormat,
    WebhookConfig,
};
pub use events::Notification;
pub use service::{DispatchReport, NotificationService, NotificationServiceConfig, NotificationStats};
pub use targets::parse_target;

/// Delivers rendered notifications. Fire-and-forget from the caller's side.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}
