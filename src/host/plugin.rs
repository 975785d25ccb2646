//! Host plugin wiring the local avatar, peer-left notifications and teleports.
use bevy::prelude::*;

use crate::scene::SceneSet;

use super::{
    components::LocalPlayer,
    events::{PeerLeftScene, TeleportCompleted, TeleportRequested},
    systems::{resolve_teleports, spawn_local_avatar},
};

pub struct HostPlugin;

impl Plugin for HostPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LocalPlayer>()
            .add_message::<PeerLeftScene>()
            .add_message::<TeleportRequested>()
            .add_message::<TeleportCompleted>()
            .add_systems(Startup, (spawn_local_avatar, log_local_player))
            .add_systems(Update, resolve_teleports.in_set(SceneSet::Host));
    }
}

fn log_local_player(local_player: Res<LocalPlayer>) {
    match local_player.profile() {
        Some(profile) => info!(
            "HostPlugin initialised for {} ({}, {} wearables)",
            profile.name,
            profile.user_id,
            profile.wearables.len()
        ),
        None => warn!("HostPlugin initialised without a local player; scene systems stay idle"),
    }
}
