use std::sync::OnceLock;
use std::time::Duration;

use tracing::debug;

pub const DEFAULT_UA: &str = concat!("live-notifier/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for platform calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// A `reqwest::ClientBuilder` with the shared user agent and timeout.
pub fn create_client_builder(timeout: Option<Duration>) -> reqwest::ClientBuilder {
    install_rustls_provider();

    reqwest::Client::builder()
        .user_agent(DEFAULT_UA)
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
}
