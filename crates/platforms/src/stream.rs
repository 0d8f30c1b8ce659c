use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a channel that is currently broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStream {
    /// Stream title.
    pub title: String,
    /// Game or category being streamed.
    pub game_name: String,
    /// Concurrent viewers at fetch time.
    pub viewer_count: u64,
    /// When the broadcast started, if reported.
    pub started_at: Option<DateTime<Utc>>,
}

impl LiveStream {
    pub fn new(title: impl Into<String>, game_name: impl Into<String>, viewer_count: u64) -> Self {
        Self {
            title: title.into(),
            game_name: game_name.into(),
            viewer_count,
            started_at: None,
        }
    }
}
