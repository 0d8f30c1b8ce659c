mod auth;
mod client;
mod models;

pub use auth::TwitchCredentials;
pub use client::{HELIX_BASE_URL, MAX_IDS_PER_REQUEST, TOKEN_URL, TwitchClient};
