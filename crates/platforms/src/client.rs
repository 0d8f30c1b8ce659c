use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::stream::LiveStream;

/// A streaming platform that can report which channels are live.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Human readable platform name, e.g. "Twitch".
    fn platform_name(&self) -> &'static str;

    /// Canonical public URL of a channel.
    fn channel_url(&self, name: &str) -> String;

    /// Acquire whatever credentials later calls need.
    async fn connect(&self) -> Result<(), PlatformError>;

    /// Resolve channel names to stable platform ids.
    ///
    /// Names the platform does not know are omitted from the returned map
    /// rather than reported as errors. An empty input never hits the network.
    async fn resolve_ids(&self, names: &[String])
    -> Result<HashMap<String, String>, PlatformError>;

    /// Fetch metadata for every id in `ids` that is currently live.
    ///
    /// Offline ids are simply absent. An empty input never hits the network.
    async fn fetch_live(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, LiveStream>, PlatformError>;
}
