//! Live-status lookups against streaming platform APIs.
//!
//! The [`PlatformClient`] trait is the only surface the monitor depends on:
//! resolve channel names to stable ids, then fetch the live subset of those
//! ids in batches. [`twitch::TwitchClient`] implements it over the Helix API.

pub mod client;
pub mod error;
pub mod http;
pub mod stream;
pub mod twitch;

#[cfg(any(test, feature = "mock"))]
pub use client::MockPlatformClient;
pub use client::PlatformClient;
pub use error::PlatformError;
pub use stream::LiveStream;
pub use twitch::{TwitchClient, TwitchCredentials};
