use std::time::Duration;

use tracing::warn;

pub use platforms_client::http::install_rustls_provider;

/// Build a `reqwest::Client` for outbound notification deliveries.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    platforms_client::http::create_client_builder(Some(timeout))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            reqwest::Client::default()
        })
}
