//! Net plugin wiring the active transport, topic subscriptions and message pumps.
use bevy::prelude::*;

use crate::{diagnostics::SyncDiagnostic, scene::SceneSet};

use super::{
    bus::ActiveSceneBus,
    events::{
        AppearanceReceived, JoinAnnounced, OutboundMessage, ResetReceived, SnapshotReceived,
    },
    loopback::LoopbackHub,
    systems::{flush_outbound_messages, pump_inbound_messages, subscribe_scene_topics},
};

pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ActiveSceneBus>() {
            warn!("No scene bus provided; running on an isolated loopback transport");
            app.insert_resource(ActiveSceneBus::new(Box::new(LoopbackHub::new().endpoint())));
        }

        app.add_message::<OutboundMessage>()
            .add_message::<JoinAnnounced>()
            .add_message::<AppearanceReceived>()
            .add_message::<SnapshotReceived>()
            .add_message::<ResetReceived>()
            .add_message::<SyncDiagnostic>()
            .add_systems(Startup, subscribe_scene_topics)
            .add_systems(Update, pump_inbound_messages.in_set(SceneSet::Ingest))
            .add_systems(Update, flush_outbound_messages.in_set(SceneSet::Flush));
    }
}
