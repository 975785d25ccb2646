//! Diagnostics plugin wiring telemetry resources and flush systems.
use bevy::prelude::*;

use crate::scene::{config::SceneConfig, SceneSet};

use super::{
    events::SyncDiagnostic,
    telemetry::{flush_sync_telemetry_log, record_sync_telemetry, SyncTelemetry, SyncTelemetryLog},
};

pub struct DiagnosticsPlugin;

impl Plugin for DiagnosticsPlugin {
    fn build(&self, app: &mut App) {
        let telemetry = app
            .world()
            .get_resource::<SceneConfig>()
            .map(|config| config.telemetry.clone())
            .unwrap_or_else(|| SceneConfig::default().telemetry);

        match telemetry.log_path.as_ref() {
            Some(path) => info!("Sync telemetry log: {}", path.display()),
            None => info!("Sync telemetry log disabled"),
        }

        app.insert_resource(SyncTelemetry::new(telemetry.capacity))
            .insert_resource(SyncTelemetryLog::new(telemetry.log_path, telemetry.capacity))
            .add_message::<SyncDiagnostic>()
            .add_systems(
                Update,
                (record_sync_telemetry, flush_sync_telemetry_log)
                    .chain()
                    .in_set(SceneSet::Telemetry),
            );
    }
}
