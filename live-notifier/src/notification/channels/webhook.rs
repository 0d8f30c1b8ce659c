//! Plain JSON webhook: `{"title", "body", "timestamp"}` sent to any URL.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use tracing::debug;

use super::NotificationChannel;
use crate::notification::events::Notification;
use crate::utils::http_client::build_client;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    /// `POST` unless the target asked for `PUT`.
    pub method: Method,
    /// Extra request headers, sent with every delivery.
    pub headers: HeaderMap,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            method: Method::POST,
            headers: HeaderMap::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    title: &'a str,
    body: &'a str,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a Notification> for Payload<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            title: &notification.title,
            body: &notification.body,
            timestamp: notification.timestamp,
        }
    }
}

pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> Self {
        let client = build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    fn request(&self, notification: &Notification) -> RequestBuilder {
        self.client
            .request(self.config.method.clone(), &self.config.url)
            .headers(self.config.headers.clone())
            .json(&Payload::from(notification))
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.url.is_empty()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let response = self
            .request(notification)
            .send()
            .await
            .map_err(|e| Error::notification(format!("Webhook request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::notification(format!(
                "Webhook endpoint answered {}: {}",
                status, body
            )));
        }

        debug!(title = %notification.title, "Delivered to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_payload_shape() {
        let notification =
            Notification::new("⚫ bob has gone offline.", "bob is no longer streaming.");

        let value: Value = serde_json::to_value(Payload::from(&notification)).unwrap();

        assert_eq!(value["title"], "⚫ bob has gone offline.");
        assert_eq!(value["body"], "bob is no longer streaming.");
        assert!(value["timestamp"].is_string());
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_request_uses_method_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: "http://localhost:8080/hook".to_string(),
            method: Method::PUT,
            headers,
            ..Default::default()
        });

        let request = channel
            .request(&Notification::new("title", "body"))
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::PUT);
        assert_eq!(request.url().as_str(), "http://localhost:8080/hook");
        assert_eq!(request.headers()["authorization"], "Bearer abc");
        assert_eq!(request.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_default_request_is_post() {
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: "http://localhost:8080/hook".to_string(),
            ..Default::default()
        });

        let request = channel
            .request(&Notification::new("title", "body"))
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_enabled_needs_url() {
        assert!(!WebhookChannel::new(WebhookConfig::default()).is_enabled());
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: "http://localhost:8080/hook".to_string(),
            ..Default::default()
        });
        assert!(channel.is_enabled());
    }
}
