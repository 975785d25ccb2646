//! Binds the local player's look onto NPCs they walk up to, and turns influenced NPCs
//! towards them.
use bevy::prelude::*;

use crate::{
    diagnostics::SyncDiagnostic,
    host::components::{LocalPlayer, Player},
    net::{
        events::OutboundMessage,
        messages::{AppearanceUpdate, SceneMessage},
    },
    presence::PeerId,
    scene::config::SceneConfig,
};

use super::{
    components::{AppearancePalette, NpcRecord},
    registry::NpcRegistry,
};

/// Planar (XZ) radius test. The per-axis reject only skips NPCs whose exact squared
/// distance would exceed `radius²` anyway.
pub fn within_planar_radius(player: Vec3, npc: Vec3, radius: f32) -> bool {
    let dx = player.x - npc.x;
    let dz = player.z - npc.z;
    if dx.abs() > radius || dz.abs() > radius {
        return false;
    }
    dx * dx + dz * dz <= radius * radius
}

/// Rotation facing `target` from `from`, ignoring height. `None` when directly above/below.
pub fn facing_rotation(from: Vec3, target: Vec3) -> Option<Quat> {
    let mut direction = target - from;
    direction.y = 0.0;
    if direction.length_squared() <= f32::EPSILON {
        return None;
    }
    let direction = direction.normalize();
    Some(Quat::from_rotation_y(direction.x.atan2(direction.z)))
}

/// What one proximity evaluation did to an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityTransition {
    Bound,
    Released,
    /// Lost influence over an NPC someone else now owns; nothing to broadcast.
    Withdrawn,
    Unchanged,
}

/// Evaluates one NPC against the local player and mutates it accordingly.
pub fn evaluate_proximity(
    record: &mut NpcRecord,
    local: &PeerId,
    wearables: &[String],
    display_name: &str,
    in_radius: bool,
    palette: &AppearancePalette,
) -> ProximityTransition {
    match (in_radius, record.influenced) {
        (true, false) => {
            let bindable = record.owner.is_none() || record.is_owned_by(local);
            if !bindable {
                return ProximityTransition::Unchanged;
            }
            record.owner = Some(local.clone());
            record.appearance = palette.bound(wearables, display_name);
            record.influenced = true;
            ProximityTransition::Bound
        }
        (false, true) => {
            record.influenced = false;
            if !record.is_owned_by(local) {
                return ProximityTransition::Withdrawn;
            }
            record.owner = None;
            record.appearance = palette.neutral();
            ProximityTransition::Released
        }
        _ => ProximityTransition::Unchanged,
    }
}

/// Per-tick binding pass over every NPC.
pub fn bind_nearby_npcs(
    local_player: Res<LocalPlayer>,
    players: Query<&Transform, With<Player>>,
    config: Res<SceneConfig>,
    palette: Res<AppearancePalette>,
    mut registry: ResMut<NpcRegistry>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let Some(profile) = local_player.profile() else {
        return;
    };
    let Ok(player_transform) = players.single() else {
        return;
    };
    let player_position = player_transform.translation;
    let radius = config.proximity.bind_radius;

    for record in registry.iter_mut() {
        let in_radius = within_planar_radius(player_position, record.pose.position, radius);
        let transition = evaluate_proximity(
            record,
            &profile.user_id,
            &profile.wearables,
            &profile.name,
            in_radius,
            &palette,
        );

        match transition {
            ProximityTransition::Bound => {
                if let Some(rotation) = facing_rotation(record.pose.position, player_position) {
                    record.pose.rotation = rotation;
                }
                info!(target: "scene_sync", "{} now mirrors {}", record.id, profile.user_id);
                outbound.write(OutboundMessage(SceneMessage::Appearance(
                    AppearanceUpdate::from_record(record),
                )));
                diagnostics.write(SyncDiagnostic::NpcBound {
                    npc: record.id,
                    owner: profile.user_id.clone(),
                });
            }
            ProximityTransition::Released => {
                info!(target: "scene_sync", "{} released by {}", record.id, profile.user_id);
                outbound.write(OutboundMessage(SceneMessage::Appearance(
                    AppearanceUpdate::from_record(record),
                )));
                diagnostics.write(SyncDiagnostic::NpcReleased { npc: record.id });
            }
            ProximityTransition::Withdrawn | ProximityTransition::Unchanged => {}
        }
    }
}

/// Keeps every influenced NPC facing the local player.
pub fn face_local_player(
    players: Query<&Transform, With<Player>>,
    mut registry: ResMut<NpcRegistry>,
) {
    let Ok(player_transform) = players.single() else {
        return;
    };
    let player_position = player_transform.translation;

    for record in registry.iter_mut().filter(|record| record.influenced) {
        if let Some(rotation) = facing_rotation(record.pose.position, player_position) {
            record.pose.rotation = rotation;
        }
    }
}
