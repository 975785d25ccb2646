//! Systems related to NPC population.
use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    npc::{
        components::{AppearancePalette, NpcIdGenerator, NpcPose, NpcRecord},
        registry::NpcRegistry,
    },
    scene::{
        config::{NpcPopulationConfig, SceneConfig},
        phase::SceneEntered,
    },
};

/// Deterministically scatters the configured population uniformly over a disc.
pub fn scatter_population(
    population: &NpcPopulationConfig,
    palette: &AppearancePalette,
) -> Vec<NpcRecord> {
    let mut rng = SmallRng::seed_from_u64(population.seed);
    let mut ids = NpcIdGenerator::starting_at(population.first_id);

    (0..population.count)
        .map(|_| {
            let angle = rng.gen::<f32>() * TAU;
            let distance = population.spawn_radius * rng.gen::<f32>().sqrt();
            let offset = Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);
            NpcRecord::neutral(
                ids.next_id(),
                NpcPose::at(population.spawn_center + offset),
                palette,
            )
        })
        .collect()
}

/// Fills the registry once the local player is in the scene.
pub fn populate_npcs(
    mut entered: MessageReader<SceneEntered>,
    config: Res<SceneConfig>,
    palette: Res<AppearancePalette>,
    mut registry: ResMut<NpcRegistry>,
) {
    if entered.read().count() == 0 || !registry.is_empty() {
        return;
    }

    for record in scatter_population(&config.npcs, &palette) {
        registry.insert(record);
    }
    info!(
        target: "scene_sync",
        "Spawned {} neutral NPCs around {:?}",
        registry.len(),
        config.npcs.spawn_center
    );
}
