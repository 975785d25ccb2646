use std::{fs, path::Path, path::PathBuf};

use bevy::prelude::*;
use serde::Deserialize;

const CONFIG_PATH: &str = "config/scene.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawSceneConfig {
    #[serde(default)]
    clock: RawClock,
    #[serde(default)]
    npcs: RawNpcs,
    #[serde(default)]
    proximity: RawProximity,
    #[serde(default)]
    appearance: RawAppearance,
    #[serde(default)]
    entry: RawEntry,
    #[serde(default)]
    telemetry: RawTelemetry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawClock {
    time_scale: f32,
}

impl Default for RawClock {
    fn default() -> Self {
        Self { time_scale: 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawNpcs {
    count: u32,
    first_id: u32,
    spawn_center: [f32; 3],
    spawn_radius: f32,
    seed: u64,
}

impl Default for RawNpcs {
    fn default() -> Self {
        Self {
            count: 100,
            first_id: 1000,
            spawn_center: [16.0, 35.4, 16.0],
            spawn_radius: 15.0,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawProximity {
    bind_radius: f32,
}

impl Default for RawProximity {
    fn default() -> Self {
        Self { bind_radius: 2.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawAppearance {
    check_interval_seconds: f32,
    default_wearables: Vec<String>,
    idle_expression: String,
    bound_expression: String,
}

impl Default for RawAppearance {
    fn default() -> Self {
        Self {
            check_interval_seconds: 3.0,
            default_wearables: vec!["base-avatar-default".to_string()],
            idle_expression: "idle".to_string(),
            bound_expression: "clap".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawEntry {
    auto_enter: bool,
    spawn_position: [f32; 3],
    teleport_destination: [f32; 3],
}

impl Default for RawEntry {
    fn default() -> Self {
        Self {
            auto_enter: true,
            spawn_position: [8.0, 1.0, 8.0],
            teleport_destination: [8.0, 40.0, 8.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawTelemetry {
    log_path: String,
    capacity: usize,
}

impl Default for RawTelemetry {
    fn default() -> Self {
        Self {
            log_path: "logs/scene_sync.jsonl".to_string(),
            capacity: 128,
        }
    }
}

/// Runtime configuration derived from `config/scene.toml`.
#[derive(Resource, Debug, Clone)]
pub struct SceneConfig {
    pub time_scale: f32,
    pub npcs: NpcPopulationConfig,
    pub proximity: ProximityConfig,
    pub appearance: AppearanceConfig,
    pub entry: EntryConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct NpcPopulationConfig {
    pub count: u32,
    pub first_id: u32,
    pub spawn_center: Vec3,
    pub spawn_radius: f32,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    pub bind_radius: f32,
}

#[derive(Debug, Clone)]
pub struct AppearanceConfig {
    pub check_interval_seconds: f32,
    pub default_wearables: Vec<String>,
    pub idle_expression: String,
    pub bound_expression: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EntryConfig {
    pub auto_enter: bool,
    pub spawn_position: Vec3,
    pub teleport_destination: Vec3,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `None` disables the on-disk log.
    pub log_path: Option<PathBuf>,
    pub capacity: usize,
}

impl SceneConfig {
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_PATH);
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<RawSceneConfig>(&raw) {
                Ok(parsed) => parsed.into(),
                Err(err) => {
                    warn!(
                        "Failed to parse {} ({}). Falling back to defaults.",
                        CONFIG_PATH, err
                    );
                    RawSceneConfig::default().into()
                }
            },
            Err(err) => {
                warn!(
                    "Failed to read {} ({}). Falling back to defaults.",
                    CONFIG_PATH, err
                );
                RawSceneConfig::default().into()
            }
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawSceneConfig>(raw).map(Into::into)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        RawSceneConfig::default().into()
    }
}

impl From<RawSceneConfig> for SceneConfig {
    fn from(value: RawSceneConfig) -> Self {
        let id_room = (u32::MAX - value.npcs.first_id).saturating_add(1);
        if value.npcs.count > id_room {
            warn!(
                "npcs.count {} does not fit above first_id {}; spawning {}",
                value.npcs.count, value.npcs.first_id, id_room
            );
        }
        let npcs = NpcPopulationConfig {
            count: value.npcs.count.min(id_room),
            first_id: value.npcs.first_id,
            spawn_center: Vec3::from_array(value.npcs.spawn_center),
            spawn_radius: value.npcs.spawn_radius.max(0.0),
            seed: value.npcs.seed,
        };

        let proximity = ProximityConfig {
            bind_radius: value.proximity.bind_radius.max(0.0),
        };

        let mut default_wearables = normalise_urns(&value.appearance.default_wearables);
        if default_wearables.is_empty() {
            default_wearables = RawAppearance::default().default_wearables;
        }

        let appearance = AppearanceConfig {
            check_interval_seconds: value.appearance.check_interval_seconds.max(0.1),
            default_wearables,
            idle_expression: non_empty_or(value.appearance.idle_expression, "idle"),
            bound_expression: non_empty_or(value.appearance.bound_expression, "clap"),
        };

        let entry = EntryConfig {
            auto_enter: value.entry.auto_enter,
            spawn_position: Vec3::from_array(value.entry.spawn_position),
            teleport_destination: Vec3::from_array(value.entry.teleport_destination),
        };

        let log_path = value.telemetry.log_path.trim();
        let telemetry = TelemetryConfig {
            log_path: (!log_path.is_empty()).then(|| PathBuf::from(log_path)),
            capacity: value.telemetry.capacity.max(1),
        };

        Self {
            time_scale: value.clock.time_scale,
            npcs,
            proximity,
            appearance,
            entry,
            telemetry,
        }
    }
}

fn normalise_urns(urns: &[String]) -> Vec<String> {
    urns.iter()
        .map(|urn| urn.trim().to_string())
        .filter(|urn| !urn.is_empty())
        .collect()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
