//! Systems maintaining the presence roster and reacting to departures.
use bevy::prelude::*;

use crate::{
    core::SimulationClock,
    diagnostics::SyncDiagnostic,
    host::{components::LocalPlayer, events::PeerLeftScene},
    net::{
        events::{JoinAnnounced, OutboundMessage, ResetReceived},
        messages::{JoinAnnouncement, ResetForDeparted, SceneMessage},
    },
    npc::{components::AppearancePalette, registry::NpcRegistry},
    scene::phase::SceneEntered,
};

use super::roster::{PeerId, PresenceRoster};

/// Inserts the local peer with its join time and announces it to the scene.
pub fn announce_local_join(
    mut entered: MessageReader<SceneEntered>,
    local_player: Res<LocalPlayer>,
    clock: Res<SimulationClock>,
    mut roster: ResMut<PresenceRoster>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    for _ in entered.read() {
        let Some(user_id) = local_player.user_id().cloned() else {
            warn!(target: "scene_sync", "Scene entered without a local player; not announcing");
            continue;
        };

        let joined_at = clock.timestamp_millis();
        roster.join_locally(user_id.clone(), joined_at);
        info!(target: "scene_sync", "Announcing {} (joined at {})", user_id, joined_at);

        outbound.write(OutboundMessage(SceneMessage::Join(JoinAnnouncement {
            peer_id: user_id.clone(),
            join_timestamp: joined_at,
            reply: false,
        })));
        diagnostics.write(SyncDiagnostic::PeerJoined {
            peer: user_id,
            joined_at,
            reply: false,
        });
    }
}

/// Merges announced peers into the roster and answers newcomers once.
pub fn record_join_announcements(
    mut joins: MessageReader<JoinAnnounced>,
    mut roster: ResMut<PresenceRoster>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let Some(local) = roster.local().cloned() else {
        return;
    };

    for JoinAnnounced(join) in joins.read() {
        if join.peer_id == local {
            continue;
        }

        let is_new = roster.observe(join.peer_id.clone(), join.join_timestamp);
        debug!(
            target: "scene_sync",
            "Join from {} at {} (new: {}, reply: {}, roster size {})",
            join.peer_id,
            join.join_timestamp,
            is_new,
            join.reply,
            roster.len()
        );
        diagnostics.write(SyncDiagnostic::PeerJoined {
            peer: join.peer_id.clone(),
            joined_at: join.join_timestamp,
            reply: join.reply,
        });

        if is_new && !join.reply {
            if let Some(joined_at) = roster.local_joined_at() {
                outbound.write(OutboundMessage(SceneMessage::Join(JoinAnnouncement {
                    peer_id: local.clone(),
                    join_timestamp: joined_at,
                    reply: true,
                })));
            }
        }
    }
}

/// Removes departed peers; the leader among the remaining peers broadcasts the reset and
/// applies it immediately. Resets broadcast by others are applied as they arrive.
pub fn handle_peer_departures(
    mut left: MessageReader<PeerLeftScene>,
    mut remote_resets: MessageReader<ResetReceived>,
    mut roster: ResMut<PresenceRoster>,
    mut registry: ResMut<NpcRegistry>,
    palette: Res<AppearancePalette>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let Some(local) = roster.local().cloned() else {
        return;
    };

    for notification in left.read() {
        let departed = &notification.peer;
        if *departed == local {
            continue;
        }

        roster.remove(departed);
        let acted_as_leader = roster.is_leader(&local);
        info!(
            target: "scene_sync",
            "{} left the scene; {} peers remain (leader: {})",
            departed,
            roster.len(),
            acted_as_leader
        );

        if acted_as_leader {
            outbound.write(OutboundMessage(SceneMessage::Reset(ResetForDeparted {
                departed_peer_id: departed.clone(),
            })));
            apply_reset(departed, &mut registry, &palette, &mut diagnostics);
        }

        diagnostics.write(SyncDiagnostic::PeerDeparted {
            peer: departed.clone(),
            acted_as_leader,
        });
    }

    for ResetReceived(reset) in remote_resets.read() {
        let departed = &reset.departed_peer_id;
        if *departed == local {
            continue;
        }
        roster.remove(departed);
        apply_reset(departed, &mut registry, &palette, &mut diagnostics);
    }
}

fn apply_reset(
    departed: &PeerId,
    registry: &mut NpcRegistry,
    palette: &AppearancePalette,
    diagnostics: &mut MessageWriter<SyncDiagnostic>,
) {
    let reverted = registry.reset_owned_by(departed, palette);
    if !reverted.is_empty() {
        info!(
            target: "scene_sync",
            "Released {} NPCs bound to {}",
            reverted.len(),
            departed
        );
    }
    diagnostics.write(SyncDiagnostic::ResetApplied {
        departed: departed.clone(),
        reverted,
    });
}
