//! Monitor events and their notification text.

use platforms_client::LiveStream;

use super::tracker::{Transition, TransitionKind};

/// Something the monitor tells the notifier about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Sent once, before anything is polled.
    Startup {
        platform: String,
        channels: Vec<String>,
    },
    /// Live when monitoring began.
    AlreadyLive {
        name: String,
        url: String,
        stream: LiveStream,
    },
    /// Went live between two cycles.
    WentLive {
        name: String,
        url: String,
        stream: LiveStream,
    },
    WentOffline {
        name: String,
        url: String,
    },
}

impl MonitorEvent {
    /// Event for a steady-state transition.
    pub fn from_transition(transition: Transition, url: String) -> Self {
        match transition.kind {
            TransitionKind::WentLive(stream) => Self::WentLive {
                name: transition.name,
                url,
                stream,
            },
            TransitionKind::WentOffline => Self::WentOffline {
                name: transition.name,
                url,
            },
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Startup { platform, .. } => format!("🟡 {} Notifier Started", platform),
            Self::AlreadyLive { name, .. } => format!("🟢 {} is already LIVE!", name),
            Self::WentLive { name, .. } => format!("🔴 {} is now LIVE!", name),
            Self::WentOffline { name, .. } => format!("⚫ {} has gone offline.", name),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Startup { channels, .. } => format!("Monitoring: {}", channels.join(", ")),
            Self::AlreadyLive { url, stream, .. } | Self::WentLive { url, stream, .. } => {
                format!(
                    "{}\nGame: {}\nViewers: {}\n{}",
                    stream.title, stream.game_name, stream.viewer_count, url
                )
            }
            Self::WentOffline { name, url } => {
                format!("{} is no longer streaming.\n{}", name, url)
            }
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Startup { .. } => "startup",
            Self::AlreadyLive { .. } => "already_live",
            Self::WentLive { .. } => "went_live",
            Self::WentOffline { .. } => "went_offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> LiveStream {
        LiveStream::new("Speedrun any%", "Celeste", 1234)
    }

    #[test]
    fn test_startup_text() {
        let event = MonitorEvent::Startup {
            platform: "Twitch".to_string(),
            channels: vec!["alice".to_string(), "bob".to_string()],
        };
        assert_eq!(event.title(), "🟡 Twitch Notifier Started");
        assert_eq!(event.body(), "Monitoring: alice, bob");
    }

    #[test]
    fn test_live_texts() {
        let url = "https://twitch.tv/alice".to_string();
        let already = MonitorEvent::AlreadyLive {
            name: "alice".to_string(),
            url: url.clone(),
            stream: stream(),
        };
        let went = MonitorEvent::WentLive {
            name: "alice".to_string(),
            url,
            stream: stream(),
        };

        assert_eq!(already.title(), "🟢 alice is already LIVE!");
        assert_eq!(went.title(), "🔴 alice is now LIVE!");
        let body = "Speedrun any%\nGame: Celeste\nViewers: 1234\nhttps://twitch.tv/alice";
        assert_eq!(already.body(), body);
        assert_eq!(went.body(), body);
    }

    #[test]
    fn test_offline_from_transition() {
        let transition = Transition {
            id: "1".to_string(),
            name: "alice".to_string(),
            kind: TransitionKind::WentOffline,
        };
        let event = MonitorEvent::from_transition(transition, "https://twitch.tv/alice".to_string());

        assert_eq!(event.kind(), "went_offline");
        assert_eq!(event.title(), "⚫ alice has gone offline.");
        assert_eq!(
            event.body(),
            "alice is no longer streaming.\nhttps://twitch.tv/alice"
        );
    }
}
