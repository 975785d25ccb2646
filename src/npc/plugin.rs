//! NPC plugin wiring the registry, proximity binding and state sync.
use bevy::prelude::*;

use crate::{
    npc::{
        appearance::{watch_local_cosmetics, CosmeticWatch},
        components::AppearancePalette,
        proximity::{bind_nearby_npcs, face_local_player},
        registry::NpcRegistry,
        sync::{
            apply_remote_appearance, apply_snapshots, respond_to_join_announcements, SnapshotGate,
        },
        systems::populate_npcs,
    },
    scene::{
        config::SceneConfig,
        phase::{complete_scene_entry, scene_active},
        SceneSet,
    },
};

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<SceneConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(AppearancePalette::from(&config.appearance))
            .insert_resource(CosmeticWatch::new(config.appearance.check_interval_seconds))
            .init_resource::<NpcRegistry>()
            .init_resource::<SnapshotGate>()
            .add_systems(
                Update,
                populate_npcs
                    .after(complete_scene_entry)
                    .in_set(SceneSet::Entry),
            )
            .add_systems(
                Update,
                (
                    respond_to_join_announcements,
                    apply_remote_appearance,
                    apply_snapshots,
                    bind_nearby_npcs,
                    face_local_player,
                    watch_local_cosmetics,
                )
                    .chain()
                    .run_if(scene_active)
                    .in_set(SceneSet::Npc),
            );
    }
}
