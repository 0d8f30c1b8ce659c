use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::stream::LiveStream;

/// OAuth token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Envelope shared by every Helix endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixResponse<T> {
    pub data: Vec<T>,
}

/// `GET /helix/users` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixUser {
    pub id: String,
    pub login: String,
}

/// `GET /helix/streams` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixStream {
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl From<HelixStream> for LiveStream {
    fn from(stream: HelixStream) -> Self {
        Self {
            title: stream.title,
            game_name: stream.game_name,
            viewer_count: stream.viewer_count,
            started_at: stream.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_streams_response() {
        let json = r#"{
            "data": [{
                "id": "40952121085",
                "user_id": "101051819",
                "user_login": "afro",
                "user_name": "Afro",
                "game_id": "32982",
                "game_name": "Grand Theft Auto V",
                "type": "live",
                "title": "Jacob: Digital Den Laptops & Routers",
                "tags": [],
                "viewer_count": 1490,
                "started_at": "2021-03-10T03:18:11Z",
                "language": "en",
                "thumbnail_url": "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-{width}x{height}.jpg",
                "is_mature": false
            }],
            "pagination": {}
        }"#;

        let response: HelixResponse<HelixStream> = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);

        let stream = response.data.into_iter().next().unwrap();
        assert_eq!(stream.user_id, "101051819");
        assert_eq!(stream.user_login, "afro");

        let live: LiveStream = stream.into();
        assert_eq!(live.title, "Jacob: Digital Den Laptops & Routers");
        assert_eq!(live.game_name, "Grand Theft Auto V");
        assert_eq!(live.viewer_count, 1490);
        assert!(live.started_at.is_some());
    }

    #[test]
    fn test_parse_users_response() {
        let json = r#"{"data":[{"id":"141981764","login":"twitchdev","display_name":"TwitchDev","type":"","broadcaster_type":"partner"}]}"#;
        let response: HelixResponse<HelixUser> = serde_json::from_str(json).unwrap();
        assert_eq!(response.data[0].id, "141981764");
        assert_eq!(response.data[0].login, "twitchdev");
    }

    #[test]
    fn test_parse_empty_streams_response() {
        let response: HelixResponse<HelixStream> =
            serde_json::from_str(r#"{"data":[],"pagination":{}}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token":"jostpf5q0uzmxmkba9iyug38kjtgh","expires_in":5011271,"token_type":"bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "jostpf5q0uzmxmkba9iyug38kjtgh");
        assert_eq!(token.expires_in, Some(5011271));
        assert_eq!(token.token_type.as_deref(), Some("bearer"));
    }
}
