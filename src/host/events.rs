//! Notifications exchanged with the host runtime.
use bevy::prelude::*;

use crate::presence::PeerId;

/// The host reports that another player left the scene.
#[derive(Message, Debug, Clone)]
pub struct PeerLeftScene {
    pub peer: PeerId,
}

/// Ask the host to move the local player.
#[derive(Message, Debug, Clone, Copy)]
pub struct TeleportRequested {
    pub destination: Vec3,
}

/// The host finished moving the local player.
#[derive(Message, Debug, Clone, Copy)]
pub struct TeleportCompleted {
    pub position: Vec3,
}
