//! Liveness tracking.
//!
//! [`reconcile`] compares the previous cycle's [`LivenessState`] with the
//! ids reported live in the current snapshot and returns the transitions
//! worth notifying about together with the next state. It performs no I/O.

use std::collections::{HashMap, HashSet};

use platforms_client::LiveStream;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A configured channel name bound to its stable platform id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelIdentity {
    /// Lower-cased channel login.
    pub name: String,
    /// Opaque platform id.
    pub id: String,
}

impl ChannelIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// The monitored set, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitoredChannels {
    channels: Vec<ChannelIdentity>,
}

impl MonitoredChannels {
    /// Build the monitored set from configured names and the resolver's answer.
    ///
    /// Names missing from `resolved` are logged and dropped. Repeated names
    /// or ids are kept once, at their first position.
    pub fn from_resolved(names: &[String], resolved: &HashMap<String, String>) -> Self {
        let mut seen_names = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut channels = Vec::with_capacity(names.len());

        for name in names {
            let name = name.to_lowercase();
            if !seen_names.insert(name.clone()) {
                continue;
            }
            match resolved.get(&name) {
                Some(id) if seen_ids.insert(id.clone()) => {
                    channels.push(ChannelIdentity::new(name, id.clone()));
                }
                Some(id) => warn!(channel = %name, id = %id, "Channel id already monitored, skipping"),
                None => warn!(channel = %name, "Channel could not be resolved, skipping"),
            }
        }

        Self { channels }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelIdentity> {
        self.channels.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl From<Vec<ChannelIdentity>> for MonitoredChannels {
    fn from(channels: Vec<ChannelIdentity>) -> Self {
        Self { channels }
    }
}

/// Last known live flag of every monitored channel.
///
/// The key set and its order are fixed when the state is created; later
/// states are only ever derived from earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessState {
    entries: Vec<(ChannelIdentity, bool)>,
}

impl LivenessState {
    /// Every channel starts offline.
    pub fn new(channels: &MonitoredChannels) -> Self {
        Self {
            entries: channels.iter().map(|c| (c.clone(), false)).collect(),
        }
    }

    /// Seed from a snapshot: channels present in `live` start online.
    pub fn seeded<V>(channels: &MonitoredChannels, live: &HashMap<String, V>) -> Self {
        Self {
            entries: channels
                .iter()
                .map(|c| (c.clone(), live.contains_key(&c.id)))
                .collect(),
        }
    }

    /// Unknown ids read as offline.
    pub fn is_live(&self, id: &str) -> bool {
        self.entries
            .iter()
            .find(|(channel, _)| channel.id == id)
            .is_some_and(|(_, live)| *live)
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|(_, live)| *live).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelIdentity, bool)> {
        self.entries.iter().map(|(channel, live)| (channel, *live))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    WentLive(LiveStream),
    WentOffline,
}

/// A notify-worthy change of one channel between two cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub kind: TransitionKind,
}

/// Compute this cycle's transitions and the state to carry forward.
///
/// Transitions follow the order of `previous`, never the snapshot's. A
/// channel absent from `snapshot` is offline. Going offline is always
/// recorded in the next state but only reported when `notify_on_offline`.
pub fn reconcile(
    previous: &LivenessState,
    snapshot: &HashMap<String, LiveStream>,
    notify_on_offline: bool,
) -> (Vec<Transition>, LivenessState) {
    let mut transitions = Vec::new();
    let mut entries = Vec::with_capacity(previous.entries.len());

    for (channel, was_live) in previous.iter() {
        let current = snapshot.get(&channel.id);
        let is_live = current.is_some();

        match current {
            Some(stream) if !was_live => transitions.push(Transition {
                id: channel.id.clone(),
                name: channel.name.clone(),
                kind: TransitionKind::WentLive(stream.clone()),
            }),
            None if was_live && notify_on_offline => transitions.push(Transition {
                id: channel.id.clone(),
                name: channel.name.clone(),
                kind: TransitionKind::WentOffline,
            }),
            _ => {}
        }

        entries.push((channel.clone(), is_live));
    }

    (transitions, LivenessState { entries })
}
