//! Startup reconciliation.

use std::collections::HashMap;

use platforms_client::{LiveStream, PlatformClient, PlatformError};
use tracing::{debug, info};

use super::events::MonitorEvent;
use super::tracker::{LivenessState, MonitoredChannels};
use crate::notification::Notifier;

/// Fetch the live subset of `channels`.
///
/// An empty monitored set short-circuits without asking the platform.
pub(super) async fn fetch_snapshot<P>(
    platform: &P,
    channels: &MonitoredChannels,
) -> Result<HashMap<String, LiveStream>, PlatformError>
where
    P: PlatformClient + ?Sized,
{
    if channels.is_empty() {
        debug!("No channels monitored, skipping fetch");
        return Ok(HashMap::new());
    }
    platform.fetch_live(&channels.ids()).await
}

/// Take the initial snapshot, announce channels that are already live and
/// return the seed state.
///
/// Errors are returned as-is: without a trustworthy seed the first steady
/// cycle would report every already-live channel as newly live.
pub async fn bootstrap<P, N>(
    platform: &P,
    notifier: &N,
    channels: &MonitoredChannels,
) -> Result<LivenessState, PlatformError>
where
    P: PlatformClient + ?Sized,
    N: Notifier + ?Sized,
{
    info!(channels = channels.len(), "Checking initial stream status");

    let snapshot = fetch_snapshot(platform, channels).await?;

    for channel in channels.iter() {
        if let Some(stream) = snapshot.get(&channel.id) {
            info!(channel = %channel.name, viewers = stream.viewer_count, "Channel already live");
            let event = MonitorEvent::AlreadyLive {
                name: channel.name.clone(),
                url: platform.channel_url(&channel.name),
                stream: stream.clone(),
            };
            notifier.notify(&event.title(), &event.body()).await;
        }
    }

    let state = LivenessState::seeded(channels, &snapshot);
    info!(live = state.live_count(), total = state.len(), "Initial status recorded");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use platforms_client::MockPlatformClient;

    use super::*;
    use crate::monitor::test_util::RecordingNotifier;
    use crate::monitor::tracker::ChannelIdentity;

    fn channels() -> MonitoredChannels {
        MonitoredChannels::from(vec![
            ChannelIdentity::new("alice", "1"),
            ChannelIdentity::new("bob", "2"),
        ])
    }

    #[tokio::test]
    async fn test_bootstrap_announces_already_live() {
        let mut platform = MockPlatformClient::new();
        platform.expect_fetch_live().times(1).returning(|ids| {
            assert_eq!(ids.to_vec(), vec!["1".to_string(), "2".to_string()]);
            Ok(HashMap::from([(
                "2".to_string(),
                LiveStream::new("late night", "Chess", 7),
            )]))
        });
        platform
            .expect_channel_url()
            .returning(|name| format!("https://twitch.tv/{}", name));
        let notifier = RecordingNotifier::default();

        let state = bootstrap(&platform, &notifier, &channels()).await.unwrap();

        assert!(!state.is_live("1"));
        assert!(state.is_live("2"));
        assert_eq!(
            notifier.messages(),
            vec![(
                "🟢 bob is already LIVE!".to_string(),
                "late night\nGame: Chess\nViewers: 7\nhttps://twitch.tv/bob".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_bootstrap_failure_propagates() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_live()
            .returning(|_| Err(PlatformError::MissingToken));
        let notifier = RecordingNotifier::default();

        let result = bootstrap(&platform, &notifier, &channels()).await;

        assert!(matches!(result, Err(PlatformError::MissingToken)));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_empty_set_skips_fetch() {
        let mut platform = MockPlatformClient::new();
        platform.expect_fetch_live().never();
        let notifier = RecordingNotifier::default();

        let state = bootstrap(&platform, &notifier, &MonitoredChannels::default())
            .await
            .unwrap();

        assert!(state.is_empty());
        assert!(notifier.messages().is_empty());
    }
}
