//! Local view of which peers share the scene and when each joined.
use std::{collections::BTreeMap, fmt};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::election::elect_leader;

/// Logical join time in milliseconds. Lower means more senior.
pub type JoinTimestamp = u64;

/// Identifier of a connected client (the host's user id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presence set replicated independently by every peer.
#[derive(Resource, Debug, Default, Clone)]
pub struct PresenceRoster {
    local: Option<PeerId>,
    peers: BTreeMap<PeerId, JoinTimestamp>,
}

impl PresenceRoster {
    /// Records the local peer and its own join time.
    pub fn join_locally(&mut self, peer: PeerId, joined_at: JoinTimestamp) {
        self.peers.insert(peer.clone(), joined_at);
        self.local = Some(peer);
    }

    pub fn local(&self) -> Option<&PeerId> {
        self.local.as_ref()
    }

    pub fn local_joined_at(&self) -> Option<JoinTimestamp> {
        self.local.as_ref().and_then(|peer| self.joined_at(peer))
    }

    /// Inserts or overwrites a peer; returns `true` when the peer was unknown.
    pub fn observe(&mut self, peer: PeerId, joined_at: JoinTimestamp) -> bool {
        self.peers.insert(peer, joined_at).is_none()
    }

    /// Removes a peer; returns `true` when it was present.
    pub fn remove(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer).is_some()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn joined_at(&self, peer: &PeerId) -> Option<JoinTimestamp> {
        self.peers.get(peer).copied()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn leader(&self) -> Option<&PeerId> {
        elect_leader(self.peers.iter())
    }

    /// Leader among known peers, ignoring `excluded` (used when a newcomer appears).
    pub fn leader_excluding(&self, excluded: &PeerId) -> Option<&PeerId> {
        elect_leader(self.peers.iter().filter(|(peer, _)| *peer != excluded))
    }

    pub fn is_leader(&self, peer: &PeerId) -> bool {
        self.leader() == Some(peer)
    }

    /// Whether the local peer is the leader once the departed/new peer is set aside.
    pub fn local_leads_excluding(&self, excluded: &PeerId) -> bool {
        match self.local.as_ref() {
            Some(local) => self.leader_excluding(excluded) == Some(local),
            None => false,
        }
    }
}
