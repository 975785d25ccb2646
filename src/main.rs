use std::{path::Path, time::Duration};

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};

mod core;
mod diagnostics;
mod host;
mod net;
mod npc;
mod presence;
mod scene;

use crate::{
    host::components::{LocalPlayer, PlayerProfile},
    net::{bus::ActiveSceneBus, loopback::LoopbackHub},
    scene::{config::SceneConfig, ScenePlugin},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn main() {
    load_scene_env();

    let config = SceneConfig::load_or_default();
    let hub = LoopbackHub::new();
    let profile =
        PlayerProfile::from_env().unwrap_or_else(|| PlayerProfile::new("local-player", "Guest"));

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(FRAME_INTERVAL)),
            LogPlugin::default(),
        ))
        .insert_resource(ActiveSceneBus::new(Box::new(hub.endpoint())))
        .insert_resource(LocalPlayer::new(profile))
        .add_plugins(ScenePlugin::with_config(config))
        .run();
}

fn load_scene_env() {
    const SCENE_ENV_FILE: &str = "scene.env";

    let path = Path::new(SCENE_ENV_FILE);
    if !path.exists() {
        return;
    }

    if let Err(err) = dotenvy::from_filename(path) {
        eprintln!("Failed to load {}: {}", SCENE_ENV_FILE, err);
    }
}
