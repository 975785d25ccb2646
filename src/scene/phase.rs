//! Scene entry gate: NPCs are only spawned and synced once the player reached the platform.
use bevy::prelude::*;

use crate::host::events::{TeleportCompleted, TeleportRequested};

use super::config::SceneConfig;

/// Where the local client is in the scene entry flow.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenePhase {
    #[default]
    AwaitingEntry,
    Entering,
    Active,
}

/// Fired once when the local client becomes an active participant.
#[derive(Message, Debug, Clone, Copy)]
pub struct SceneEntered {
    pub position: Vec3,
}

/// Run condition for systems that only make sense inside an active session.
pub fn scene_active(phase: Res<ScenePhase>) -> bool {
    *phase == ScenePhase::Active
}

/// Issues the entry teleport at startup when configured to do so.
pub fn request_scene_entry(
    config: Res<SceneConfig>,
    mut phase: ResMut<ScenePhase>,
    mut teleports: MessageWriter<TeleportRequested>,
) {
    if !config.entry.auto_enter || *phase != ScenePhase::AwaitingEntry {
        return;
    }

    teleports.write(TeleportRequested {
        destination: config.entry.teleport_destination,
    });
    *phase = ScenePhase::Entering;
}

/// Activates the scene when the entry teleport lands.
pub fn complete_scene_entry(
    mut completed: MessageReader<TeleportCompleted>,
    mut phase: ResMut<ScenePhase>,
    mut entered: MessageWriter<SceneEntered>,
) {
    for teleport in completed.read() {
        if *phase != ScenePhase::Entering {
            continue;
        }
        *phase = ScenePhase::Active;
        info!("Scene entered at {:?}", teleport.position);
        entered.write(SceneEntered {
            position: teleport.position,
        });
    }
}
