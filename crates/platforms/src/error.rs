use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },
    #[error("access token rejected by platform")]
    Unauthorized,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("no access token, authenticate first")]
    MissingToken,
}

impl PlatformError {
    /// Whether retrying with a fresh token could succeed.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::Status { status, .. } => *status == reqwest::StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unauthorized() {
        assert!(PlatformError::Unauthorized.is_unauthorized());
        assert!(
            PlatformError::Status {
                status: reqwest::StatusCode::UNAUTHORIZED,
                url: "https://api.twitch.tv/helix/streams".to_string(),
                body: String::new(),
            }
            .is_unauthorized()
        );
        assert!(
            !PlatformError::Status {
                status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                url: "https://api.twitch.tv/helix/streams".to_string(),
                body: String::new(),
            }
            .is_unauthorized()
        );
        assert!(!PlatformError::MissingToken.is_unauthorized());
    }
}
