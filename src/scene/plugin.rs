//! ScenePlugin loads configuration and installs the host, bus, presence and NPC plugins.
use bevy::prelude::*;

use crate::{
    core::CorePlugin, diagnostics::DiagnosticsPlugin, host::HostPlugin, net::NetPlugin,
    npc::NpcPlugin, presence::PresencePlugin,
};

use super::{
    config::SceneConfig,
    phase::{complete_scene_entry, request_scene_entry, SceneEntered, ScenePhase},
};

/// Per-frame ordering of the scene systems.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneSet {
    /// Host actions (teleports).
    Host,
    /// Scene entry gate and NPC population.
    Entry,
    /// Inbound bus traffic decoded into messages.
    Ingest,
    Presence,
    Npc,
    /// Outbound bus traffic published.
    Flush,
    Telemetry,
}

/// Installs every scene plugin with one configuration.
#[derive(Default)]
pub struct ScenePlugin {
    config: Option<SceneConfig>,
}

impl ScenePlugin {
    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        let config = self
            .config
            .clone()
            .unwrap_or_else(SceneConfig::load_or_default);
        info!(
            "Scene configured: {} NPCs from {} within {:.1} of {:?}, bind radius {:.1}",
            config.npcs.count,
            config.npcs.first_id,
            config.npcs.spawn_radius,
            config.npcs.spawn_center,
            config.proximity.bind_radius
        );

        app.insert_resource(config.clone())
            .init_resource::<ScenePhase>()
            .add_message::<SceneEntered>()
            .configure_sets(
                Update,
                (
                    SceneSet::Host,
                    SceneSet::Entry,
                    SceneSet::Ingest,
                    SceneSet::Presence,
                    SceneSet::Npc,
                    SceneSet::Flush,
                    SceneSet::Telemetry,
                )
                    .chain(),
            )
            .add_plugins((
                CorePlugin::with_time_scale(config.time_scale),
                DiagnosticsPlugin,
                HostPlugin,
                NetPlugin,
                PresencePlugin,
                NpcPlugin,
            ))
            .add_systems(Startup, request_scene_entry)
            .add_systems(Update, complete_scene_entry.in_set(SceneSet::Entry));
    }
}
