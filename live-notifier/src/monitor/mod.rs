//! Stream Monitor module for detecting live status.
//!
//! The Stream Monitor is responsible for:
//! - Resolving configured channel names to platform ids
//! - Seeding liveness from one snapshot at startup ("already live")
//! - Polling on a fixed interval and reconciling against the last state
//! - Rendering notifications for the transitions worth reporting

mod bootstrap;
mod events;
mod service;
mod tracker;

#[cfg(test)]
mod test_util;

pub use bootstrap::bootstrap;
pub use events::MonitorEvent;
pub use service::{CycleError, CycleOutcome, MonitorPhase, StreamMonitor, StreamMonitorConfig};
pub use tracker::{
    ChannelIdentity, LivenessState, MonitoredChannels, Transition, TransitionKind, reconcile,
};
