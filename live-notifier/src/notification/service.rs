//! Notification service implementation.
//!
//! The NotificationService is responsible for:
//! - Building channels from the configured target URLs
//! - Dispatching each notification to every enabled channel concurrently
//! - Retrying failed deliveries with exponential backoff
//! - Keeping delivery counters for diagnostics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::Notifier;
use super::channels::NotificationChannel;
use super::events::Notification;
use super::targets::parse_target;
use crate::Result;

/// Configuration for the notification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationServiceConfig {
    /// Maximum retry attempts per delivery, after the first attempt.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_retry_delay_ms: 1000,
            max_retry_delay_ms: 30000,
        }
    }
}

/// Delivery counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    /// Notifications passed to the service.
    pub notifications: u64,
    /// Channel deliveries that succeeded.
    pub delivered: u64,
    /// Channel deliveries that failed after all retries.
    pub failed: u64,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// The notification service.
pub struct NotificationService {
    config: NotificationServiceConfig,
    channels: Vec<Arc<dyn NotificationChannel>>,
    notifications: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl NotificationService {
    /// Create a notification service without channels.
    pub fn new() -> Self {
        Self::with_config(NotificationServiceConfig::default())
    }

    /// Create a new notification service with custom configuration.
    pub fn with_config(config: NotificationServiceConfig) -> Self {
        Self {
            config,
            channels: Vec::new(),
            notifications: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Build channels from target URLs.
    ///
    /// Invalid or unsupported targets are logged and skipped.
    pub fn from_target_urls(urls: &[String], config: NotificationServiceConfig) -> Self {
        let mut service = Self::with_config(config);

        for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            match parse_target(url) {
                Ok(configs) => {
                    for channel_config in configs {
                        info!(target = %channel_config.describe(), "Added notification target");
                        service.add_channel(channel_config.into_channel());
                    }
                }
                Err(e) => {
                    let scheme = url.split_once("://").map(|(s, _)| s).unwrap_or("<none>");
                    warn!(scheme, error = %e, "Skipping notification target");
                }
            }
        }

        if service.channels.is_empty() {
            warn!("No notification targets configured; notifications will only be logged");
        }

        service
    }

    /// Register a channel.
    pub fn add_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    /// Number of registered channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            notifications: self.notifications.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Deliver to every enabled channel and wait for all of them.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        self.notifications.fetch_add(1, Ordering::Relaxed);

        let deliveries = self
            .channels
            .iter()
            .filter(|channel| channel.is_enabled())
            .map(|channel| async move {
                let result = self.deliver_with_retry(channel.as_ref(), notification).await;
                (channel.channel_type(), result)
            });

        let mut report = DispatchReport::default();
        for (channel_type, result) in join_all(deliveries).await {
            match result {
                Ok(()) => {
                    report.delivered += 1;
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    report.failed += 1;
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        channel = channel_type,
                        error = %e,
                        title = %notification.title,
                        "Notification delivery failed"
                    );
                }
            }
        }

        report
    }

    async fn deliver_with_retry(
        &self,
        channel: &dyn NotificationChannel,
        notification: &Notification,
    ) -> Result<()> {
        let mut attempt = 0;

        loop {
            match channel.send(notification).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    attempt += 1;
                    debug!(
                        channel = channel.channel_type(),
                        error = %e,
                        "Delivery failed, retrying in {:?} (attempt {}/{})",
                        delay,
                        attempt,
                        self.config.max_retries
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exponential backoff: `initial * 2^attempt`, capped at the maximum.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .initial_retry_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.config.max_retry_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, title: &str, body: &str) {
        info!("[NOTIFY] {}\n{}", title, body);
        let notification = Notification::new(title, body);
        let report = self.dispatch(&notification).await;
        debug!(
            delivered = report.delivered,
            failed = report.failed,
            "Notification dispatched"
        );
    }
}
