use std::sync::Arc;

use anyhow::Context;
use live_notifier::config::AppConfig;
use live_notifier::logging::init_logging;
use live_notifier::monitor::{StreamMonitor, StreamMonitorConfig};
use live_notifier::notification::{NotificationService, NotificationServiceConfig};
use live_notifier::panic_hook;
use live_notifier::utils::http_client::install_rustls_provider;
use platforms_client::TwitchClient;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the real environment still applies.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let logging_guard = init_logging(&config.log).context("Failed to initialize logging")?;
    panic_hook::install(logging_guard.log_dir());

    let result = run(config, &logging_guard).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(
    config: AppConfig,
    logging_guard: &live_notifier::logging::LoggingGuard,
) -> anyhow::Result<()> {
    install_rustls_provider();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        channels = config.channels.len(),
        interval_secs = config.check_interval.as_secs(),
        notify_on_offline = config.notify_on_offline,
        "Starting live-notifier"
    );

    let cancel = CancellationToken::new();
    logging_guard.start_retention_cleanup(cancel.child_token());

    let platform = Arc::new(
        TwitchClient::new(config.credentials()).context("Failed to build Twitch client")?,
    );
    let notifier = Arc::new(NotificationService::from_target_urls(
        &config.notify_urls,
        NotificationServiceConfig::default(),
    ));

    let mut monitor = StreamMonitor::new(StreamMonitorConfig::from(&config), platform, notifier);
    monitor
        .start()
        .await
        .context("Failed to start stream monitor")?;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    monitor.run(cancel).await?;
    info!("live-notifier stopped");
    Ok(())
}
