//! Presence plugin wiring the roster and membership systems.
use bevy::prelude::*;

use crate::scene::{phase::scene_active, SceneSet};

use super::{
    roster::PresenceRoster,
    systems::{announce_local_join, handle_peer_departures, record_join_announcements},
};

pub struct PresencePlugin;

impl Plugin for PresencePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PresenceRoster>().add_systems(
            Update,
            (
                announce_local_join,
                (record_join_announcements, handle_peer_departures).run_if(scene_active),
            )
                .chain()
                .in_set(SceneSet::Presence),
        );
    }
}
