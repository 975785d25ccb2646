//! Host-side systems standing in for the avatar and teleport actions.
use bevy::prelude::*;

use crate::scene::config::SceneConfig;

use super::{
    components::{LocalPlayer, Player},
    events::{TeleportCompleted, TeleportRequested},
};

/// Spawns the local player's avatar at the configured entry point.
pub fn spawn_local_avatar(
    mut commands: Commands,
    config: Res<SceneConfig>,
    local_player: Res<LocalPlayer>,
    existing: Query<(), With<Player>>,
) {
    if !existing.is_empty() {
        return;
    }

    let label = local_player
        .profile()
        .map(|profile| profile.name.clone())
        .unwrap_or_else(|| "guest".to_string());

    commands.spawn((
        Transform::from_translation(config.entry.spawn_position),
        Player,
        Name::new(format!("Player ({})", label)),
    ));
}

/// Moves the avatar for every pending teleport. Without an avatar the request never resolves.
pub fn resolve_teleports(
    mut requests: MessageReader<TeleportRequested>,
    mut completed: MessageWriter<TeleportCompleted>,
    mut players: Query<&mut Transform, With<Player>>,
) {
    for request in requests.read() {
        let Ok(mut transform) = players.single_mut() else {
            warn!(
                "Teleport to {:?} requested but no local avatar exists",
                request.destination
            );
            continue;
        };

        transform.translation = request.destination;
        info!("Teleported local player to {:?}", request.destination);
        completed.write(TeleportCompleted {
            position: request.destination,
        });
    }
}
