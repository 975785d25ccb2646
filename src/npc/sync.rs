//! State-sync responder: the leader hands newcomers a full snapshot, and inbound
//! appearance updates and snapshots are folded into the registry.
use bevy::prelude::*;

use crate::{
    diagnostics::SyncDiagnostic,
    net::{
        events::{AppearanceReceived, JoinAnnounced, OutboundMessage, SnapshotReceived},
        messages::{SceneMessage, StateSnapshot},
    },
    presence::{JoinTimestamp, PeerId, PresenceRoster},
};

use super::registry::NpcRegistry;

/// Tracks which sender's snapshot is currently applied. Only a sender at least as senior
/// (earlier join, then lower id) may overwrite it. Snapshots without a seniority key
/// fall back to last write wins.
#[derive(Resource, Debug, Default, Clone)]
pub struct SnapshotGate {
    accepted_from: Option<(JoinTimestamp, PeerId)>,
}

impl SnapshotGate {
    /// Records the sender when its snapshot may be applied.
    pub fn admit(&mut self, seniority: Option<(JoinTimestamp, &PeerId)>) -> Result<(), String> {
        let Some((joined_at, sender)) = seniority else {
            return Ok(());
        };
        if let Some((accepted_at, accepted_peer)) = self.accepted_from.as_ref() {
            if (joined_at, sender) > (*accepted_at, accepted_peer) {
                return Err(format!(
                    "already holding a snapshot from more senior {accepted_peer} (joined at {accepted_at})"
                ));
            }
        }
        self.accepted_from = Some((joined_at, sender.clone()));
        Ok(())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn accepted_from(&self) -> Option<&PeerId> {
        self.accepted_from.as_ref().map(|(_, peer)| peer)
    }
}

/// Sends the registry to each fresh newcomer when the local peer leads the others.
pub fn respond_to_join_announcements(
    mut joins: MessageReader<JoinAnnounced>,
    roster: Res<PresenceRoster>,
    registry: Res<NpcRegistry>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let (Some(local), Some(local_joined_at)) = (roster.local(), roster.local_joined_at()) else {
        return;
    };

    for JoinAnnounced(join) in joins.read() {
        if join.reply || join.peer_id == *local {
            continue;
        }
        if !roster.local_leads_excluding(&join.peer_id) {
            continue;
        }

        let npcs = registry.snapshot_entries();
        let count = npcs.len();
        info!(
            target: "scene_sync",
            "Sending {} NPCs to newcomer {}",
            count,
            join.peer_id
        );
        outbound.write(OutboundMessage(SceneMessage::Snapshot(StateSnapshot {
            target_peer_id: join.peer_id.clone(),
            sender_peer_id: Some(local.clone()),
            sender_joined_at: Some(local_joined_at),
            npcs,
        })));
        diagnostics.write(SyncDiagnostic::SnapshotSent {
            target: join.peer_id.clone(),
            npcs: count,
        });
    }
}

/// Mirrors remote binds and releases into the local registry.
pub fn apply_remote_appearance(
    mut updates: MessageReader<AppearanceReceived>,
    roster: Res<PresenceRoster>,
    mut registry: ResMut<NpcRegistry>,
) {
    let Some(local) = roster.local() else {
        return;
    };

    for AppearanceReceived(update) in updates.read() {
        if update.owner_id.as_ref() == Some(local) {
            continue;
        }
        trace!(
            target: "scene_sync",
            "Appearance update for {} (owner {:?})",
            update.npc_id,
            update.owner_id
        );
        registry.apply_appearance(update);
    }
}

/// Applies snapshots addressed to the local peer, subject to the seniority gate.
pub fn apply_snapshots(
    mut snapshots: MessageReader<SnapshotReceived>,
    roster: Res<PresenceRoster>,
    mut gate: ResMut<SnapshotGate>,
    mut registry: ResMut<NpcRegistry>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let Some(local) = roster.local() else {
        return;
    };

    for SnapshotReceived(snapshot) in snapshots.read() {
        if snapshot.target_peer_id != *local {
            continue;
        }

        let sender = snapshot
            .sender_peer_id
            .as_ref()
            .map_or("an unnamed sender", PeerId::as_str);
        match gate.admit(snapshot.seniority()) {
            Ok(()) => {
                let applied = registry.apply_snapshot(&snapshot.npcs);
                info!(
                    target: "scene_sync",
                    "Applied snapshot of {} NPCs from {}",
                    applied,
                    sender
                );
                diagnostics.write(SyncDiagnostic::SnapshotApplied {
                    sender: snapshot.sender_peer_id.clone(),
                    npcs: applied,
                });
            }
            Err(reason) => {
                warn!(
                    target: "scene_sync",
                    "Ignoring snapshot from {}: {}",
                    sender,
                    reason
                );
                diagnostics.write(SyncDiagnostic::SnapshotRejected {
                    sender: snapshot.sender_peer_id.clone(),
                    reason,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(joined_at: JoinTimestamp, peer: &PeerId) -> Option<(JoinTimestamp, &PeerId)> {
        Some((joined_at, peer))
    }

    #[test]
    fn gate_prefers_earliest_sender() {
        let (a, b) = (PeerId::new("a"), PeerId::new("b"));
        let mut gate = SnapshotGate::default();
        assert!(gate.admit(key(200, &b)).is_ok());
        assert!(gate.admit(key(100, &a)).is_ok());
        assert_eq!(gate.accepted_from(), Some(&a));

        assert!(gate.admit(key(200, &b)).is_err());
        assert_eq!(gate.accepted_from(), Some(&a));
    }

    #[test]
    fn gate_breaks_timestamp_ties_by_peer_id() {
        let (a, b, c) = (PeerId::new("a"), PeerId::new("b"), PeerId::new("c"));
        let mut gate = SnapshotGate::default();
        assert!(gate.admit(key(100, &b)).is_ok());
        assert!(gate.admit(key(100, &c)).is_err());
        assert!(gate.admit(key(100, &a)).is_ok());
    }

    #[test]
    fn gate_accepts_repeat_from_same_sender() {
        let a = PeerId::new("a");
        let mut gate = SnapshotGate::default();
        assert!(gate.admit(key(100, &a)).is_ok());
        assert!(gate.admit(key(100, &a)).is_ok());
    }

    #[test]
    fn snapshots_without_seniority_always_apply() {
        let a = PeerId::new("a");
        let mut gate = SnapshotGate::default();
        assert!(gate.admit(None).is_ok());
        assert!(gate.accepted_from().is_none());

        assert!(gate.admit(key(100, &a)).is_ok());
        assert!(gate.admit(None).is_ok());
        assert_eq!(gate.accepted_from(), Some(&a));
    }
}
