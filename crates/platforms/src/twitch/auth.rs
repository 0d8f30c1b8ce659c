//! App access tokens via the OAuth client-credentials grant.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{debug, info};

use super::models::TokenResponse;
use crate::error::PlatformError;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Application credentials registered with Twitch.
#[derive(Clone)]
pub struct TwitchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl TwitchCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for TwitchCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AppToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at)
    }
}

pub(crate) async fn request_app_token(
    client: &Client,
    token_url: &str,
    credentials: &TwitchCredentials,
) -> Result<AppToken, PlatformError> {
    info!("Requesting Twitch app token");

    let response = client
        .post(token_url)
        .query(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PlatformError::Auth(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    let token: TokenResponse = response.json().await?;
    if token.access_token.is_empty() {
        return Err(PlatformError::Auth(
            "token endpoint returned an empty access token".to_string(),
        ));
    }

    debug!(token_type = ?token.token_type, "Token response parsed");
    info!(expires_in = ?token.expires_in, "Twitch token received");

    let now = Utc::now();
    Ok(AppToken {
        access_token: token.access_token,
        expires_at: token
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| now + Duration::seconds(secs)),
    })
}
