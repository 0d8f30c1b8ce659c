//! Stream Monitor service implementation.
//!
//! The StreamMonitor owns the monitored channel set and its liveness state.
//! It announces itself, resolves names, seeds state from one snapshot and
//! then polls on a fixed interval until cancelled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use platforms_client::{PlatformClient, PlatformError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bootstrap::{bootstrap, fetch_snapshot};
use super::events::MonitorEvent;
use super::tracker::{LivenessState, MonitoredChannels, reconcile};
use crate::config::{AppConfig, DEFAULT_CHECK_INTERVAL_SECS};
use crate::notification::Notifier;
use crate::{Error, Result};

/// Configuration for the stream monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMonitorConfig {
    /// Channel names in configuration order.
    pub channels: Vec<String>,
    /// Sleep between two polls.
    pub check_interval: Duration,
    /// Notify when a live channel goes offline.
    pub notify_on_offline: bool,
}

impl Default for StreamMonitorConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            notify_on_offline: false,
        }
    }
}

impl From<&AppConfig> for StreamMonitorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            channels: config.channels.clone(),
            check_interval: config.check_interval,
            notify_on_offline: config.notify_on_offline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Not started yet, or `start` failed.
    Bootstrapping,
    /// Seeded; polling on the interval.
    SteadyPolling,
}

/// A steady-state poll that failed. State was left untouched.
#[derive(Debug, Error)]
#[error("poll cycle failed: {0}")]
pub struct CycleError(#[from] pub PlatformError);

/// Result of a completed poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Notifications sent this cycle.
    pub notified: usize,
    /// Channels live after this cycle.
    pub live: usize,
}

/// The stream monitor.
pub struct StreamMonitor<P, N> {
    config: StreamMonitorConfig,
    platform: Arc<P>,
    notifier: Arc<N>,
    channels: MonitoredChannels,
    state: LivenessState,
    phase: MonitorPhase,
    consecutive_failures: u32,
}

impl<P, N> StreamMonitor<P, N>
where
    P: PlatformClient,
    N: Notifier,
{
    pub fn new(config: StreamMonitorConfig, platform: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            config,
            platform,
            notifier,
            channels: MonitoredChannels::default(),
            state: LivenessState::default(),
            phase: MonitorPhase::Bootstrapping,
            consecutive_failures: 0,
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn channels(&self) -> &MonitoredChannels {
        &self.channels
    }

    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    /// Failed polls since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Announce, connect, resolve channel ids and seed the liveness state.
    ///
    /// Every error here is fatal; the monitor stays in
    /// [`MonitorPhase::Bootstrapping`].
    pub async fn start(&mut self) -> Result<()> {
        if self.phase != MonitorPhase::Bootstrapping {
            return Err(Error::Other("stream monitor already started".to_string()));
        }

        let banner = MonitorEvent::Startup {
            platform: self.platform.platform_name().to_string(),
            channels: self.config.channels.clone(),
        };
        self.notifier.notify(&banner.title(), &banner.body()).await;

        self.platform.connect().await?;

        let resolved = if self.config.channels.is_empty() {
            HashMap::new()
        } else {
            self.platform.resolve_ids(&self.config.channels).await?
        };
        let channels = MonitoredChannels::from_resolved(&self.config.channels, &resolved);
        info!(
            platform = self.platform.platform_name(),
            monitored = channels.len(),
            configured = self.config.channels.len(),
            "Resolved monitored channels"
        );

        let state = bootstrap(self.platform.as_ref(), self.notifier.as_ref(), &channels).await?;

        self.channels = channels;
        self.state = state;
        self.phase = MonitorPhase::SteadyPolling;
        Ok(())
    }

    /// Run one steady-state cycle.
    ///
    /// On error the liveness state is exactly what it was before the call.
    pub async fn poll_once(&mut self) -> std::result::Result<CycleOutcome, CycleError> {
        info!(
            time = %Local::now().format("%Y-%m-%d %H:%M:%S"),
            "Polling for stream updates"
        );

        let snapshot = match fetch_snapshot(self.platform.as_ref(), &self.channels).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                return Err(CycleError(e));
            }
        };
        self.consecutive_failures = 0;

        let (transitions, next) = reconcile(&self.state, &snapshot, self.config.notify_on_offline);
        let notified = transitions.len();

        for transition in transitions {
            let url = self.platform.channel_url(&transition.name);
            let event = MonitorEvent::from_transition(transition, url);
            info!(kind = event.kind(), "{}", event.title());
            self.notifier.notify(&event.title(), &event.body()).await;
        }

        self.state = next;
        Ok(CycleOutcome {
            notified,
            live: self.state.live_count(),
        })
    }

    /// Poll, then sleep for the check interval, until `cancel` fires.
    ///
    /// A cycle in progress always completes; cancellation is observed
    /// between cycles and during the sleep.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if self.phase != MonitorPhase::SteadyPolling {
            return Err(Error::Other("stream monitor not started".to_string()));
        }

        info!(
            interval_secs = self.config.check_interval.as_secs(),
            channels = self.channels.len(),
            "Stream monitor running"
        );

        while !cancel.is_cancelled() {
            match self.poll_once().await {
                Ok(outcome) => {
                    debug!(notified = outcome.notified, live = outcome.live, "Poll complete");
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        consecutive_failures = self.consecutive_failures,
                        "Error checking streams"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.check_interval) => {}
            }
        }

        info!("Stream monitor stopped");
        Ok(())
    }
}
