//! Twitch Helix client.
//!
//! Uses an app access token (client-credentials grant). Every Helix request
//! carries `Client-ID` and `Authorization: Bearer` headers; a `401` triggers
//! one token refresh and one retry of the same request.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::auth::{AppToken, TwitchCredentials, request_app_token};
use super::models::{HelixResponse, HelixStream, HelixUser};
use crate::client::PlatformClient;
use crate::error::PlatformError;
use crate::http::create_client_builder;
use crate::stream::LiveStream;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Helix caps repeated `login` / `user_id` parameters at 100 per request.
pub const MAX_IDS_PER_REQUEST: usize = 100;

pub struct TwitchClient {
    client: Client,
    credentials: TwitchCredentials,
    token: RwLock<Option<AppToken>>,
    api_base: String,
    token_url: String,
}

impl TwitchClient {
    const CHANNEL_BASE_URL: &str = "https://twitch.tv";

    /// Create a client with the default HTTP configuration.
    pub fn new(credentials: TwitchCredentials) -> Result<Self, PlatformError> {
        let client = create_client_builder(None).build()?;
        Ok(Self::with_client(client, credentials))
    }

    pub fn with_client(client: Client, credentials: TwitchCredentials) -> Self {
        Self {
            client,
            credentials,
            token: RwLock::new(None),
            api_base: HELIX_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Point the client at different Helix / token endpoints.
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }

    /// Acquire (or replace) the app access token.
    pub async fn authenticate(&self) -> Result<(), PlatformError> {
        let token = request_app_token(&self.client, &self.token_url, &self.credentials).await?;
        *self.token.write() = Some(token);
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    async fn access_token(&self) -> Result<String, PlatformError> {
        let current = self.token.read().clone();
        match current {
            Some(token) if !token.is_expired(Utc::now()) => Ok(token.access_token),
            Some(_) => {
                debug!("Twitch app token about to expire, refreshing");
                self.authenticate().await?;
                self.token
                    .read()
                    .as_ref()
                    .map(|token| token.access_token.clone())
                    .ok_or(PlatformError::MissingToken)
            }
            None => Err(PlatformError::MissingToken),
        }
    }

    async fn helix_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, PlatformError> {
        let url = format!("{}/{}", self.api_base.trim_end_matches('/'), endpoint);
        let token = self.access_token().await?;

        match self.send_helix(&url, query, &token).await {
            Err(e) if e.is_unauthorized() => {
                warn!(endpoint, "Twitch rejected the app token, re-authenticating");
                self.authenticate().await?;
                let token = self.access_token().await?;
                self.send_helix(&url, query, &token).await.map_err(|e| {
                    if e.is_unauthorized() {
                        PlatformError::Unauthorized
                    } else {
                        e
                    }
                })
            }
            other => other,
        }
    }

    async fn send_helix<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> Result<Vec<T>, PlatformError> {
        let response = self
            .client
            .get(url)
            .header("Client-ID", &self.credentials.client_id)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Status {
                status,
                url: url.to_string(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: HelixResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }
}

/// Build `key=v1&key=v2...` query pairs.
fn repeated_query<'a>(key: &'a str, values: &'a [String]) -> Vec<(&'a str, &'a str)> {
    values.iter().map(|value| (key, value.as_str())).collect()
}

#[async_trait]
impl PlatformClient for TwitchClient {
    fn platform_name(&self) -> &'static str {
        "Twitch"
    }

    fn channel_url(&self, name: &str) -> String {
        format!("{}/{}", Self::CHANNEL_BASE_URL, name)
    }

    async fn connect(&self) -> Result<(), PlatformError> {
        self.authenticate().await
    }

    async fn resolve_ids(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, String>, PlatformError> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        info!(count = names.len(), "Getting Twitch user IDs");

        let mut ids = HashMap::with_capacity(names.len());
        for chunk in names.chunks(MAX_IDS_PER_REQUEST) {
            let query = repeated_query("login", chunk);
            let users: Vec<HelixUser> = self.helix_get("users", &query).await?;
            for user in users {
                info!(login = %user.login, id = %user.id, "Resolved Twitch user");
                ids.insert(user.login.to_lowercase(), user.id);
            }
        }

        Ok(ids)
    }

    async fn fetch_live(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, LiveStream>, PlatformError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(count = ids.len(), "Polling Twitch live streams");

        let mut live = HashMap::new();
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let mut query = repeated_query("user_id", chunk);
            query.push(("first", "100"));
            let streams: Vec<HelixStream> = self.helix_get("streams", &query).await?;
            for stream in streams {
                live.insert(stream.user_id.clone(), LiveStream::from(stream));
            }
        }

        Ok(live)
    }
}
