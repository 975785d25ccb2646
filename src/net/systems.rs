//! Systems moving messages between the scene bus and the ECS.
use bevy::prelude::*;

use crate::diagnostics::SyncDiagnostic;

use super::{
    bus::ActiveSceneBus,
    events::{
        AppearanceReceived, JoinAnnounced, OutboundMessage, ResetReceived, SnapshotReceived,
    },
    messages::{SceneMessage, Topic},
};

/// Subscribes the active transport to every scene topic.
pub fn subscribe_scene_topics(mut bus: ResMut<ActiveSceneBus>) {
    for topic in Topic::ALL {
        if let Err(err) = bus.subscribe(topic) {
            warn!(target: "scene_sync", "Could not subscribe to {}: {}", topic, err);
        }
    }
    info!(
        "Scene bus ready on {} transport ({} topics)",
        bus.transport(),
        bus.subscriptions().len()
    );
}

/// Drains every subscription and re-emits decoded payloads as typed messages.
pub fn pump_inbound_messages(
    bus: Res<ActiveSceneBus>,
    mut joins: MessageWriter<JoinAnnounced>,
    mut appearances: MessageWriter<AppearanceReceived>,
    mut snapshots: MessageWriter<SnapshotReceived>,
    mut resets: MessageWriter<ResetReceived>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    for subscription in bus.subscriptions() {
        let payloads = match subscription.drain() {
            Ok(payloads) => payloads,
            Err(err) => {
                warn!(target: "scene_sync", "{} subscription unavailable: {}", subscription.topic(), err);
                continue;
            }
        };

        for payload in payloads {
            match SceneMessage::decode(subscription.topic(), &payload) {
                Ok(SceneMessage::Join(body)) => {
                    joins.write(JoinAnnounced(body));
                }
                Ok(SceneMessage::Appearance(body)) => {
                    appearances.write(AppearanceReceived(body));
                }
                Ok(SceneMessage::Snapshot(body)) => {
                    snapshots.write(SnapshotReceived(body));
                }
                Ok(SceneMessage::Reset(body)) => {
                    resets.write(ResetReceived(body));
                }
                Err(err) => {
                    warn!(target: "scene_sync", "Dropping inbound message: {}", err);
                    diagnostics.write(SyncDiagnostic::DecodeFailed {
                        topic: subscription.topic(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}

/// Encodes and publishes everything queued this frame. Fire-and-forget: failures are logged.
pub fn flush_outbound_messages(
    bus: Res<ActiveSceneBus>,
    mut outbound: MessageReader<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    for OutboundMessage(message) in outbound.read() {
        let topic = message.topic();
        let result = message
            .encode()
            .and_then(|payload| bus.publish(topic, payload));

        if let Err(err) = result {
            warn!(target: "scene_sync", "Failed to publish on {}: {}", topic, err);
            diagnostics.write(SyncDiagnostic::PublishFailed {
                topic,
                error: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        net::{
            bus::SceneBus,
            loopback::LoopbackHub,
            messages::{JoinAnnouncement, ResetForDeparted},
        },
        presence::PeerId,
    };

    fn bus_app(hub: &LoopbackHub) -> App {
        let mut app = App::new();
        app.insert_resource(ActiveSceneBus::new(Box::new(hub.endpoint())))
            .add_message::<OutboundMessage>()
            .add_message::<JoinAnnounced>()
            .add_message::<AppearanceReceived>()
            .add_message::<SnapshotReceived>()
            .add_message::<ResetReceived>()
            .add_message::<SyncDiagnostic>()
            .add_systems(Startup, subscribe_scene_topics)
            .add_systems(Update, (pump_inbound_messages, flush_outbound_messages).chain());
        app
    }

    #[test]
    fn outbound_messages_reach_other_peers_as_typed_messages() {
        let hub = LoopbackHub::new();
        let mut sender = bus_app(&hub);
        let mut receiver = bus_app(&hub);
        sender.update();
        receiver.update();

        sender
            .world_mut()
            .write_message(OutboundMessage(SceneMessage::Reset(ResetForDeparted {
                departed_peer_id: PeerId::new("gone"),
            })));
        sender.update();
        receiver.update();

        let resets = receiver.world().resource::<Messages<ResetReceived>>();
        let received: Vec<_> = resets.iter_current_update_messages().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0.departed_peer_id, PeerId::new("gone"));
    }

    #[test]
    fn malformed_payloads_become_diagnostics() {
        let hub = LoopbackHub::new();
        let raw = hub.endpoint();
        let mut receiver = bus_app(&hub);
        receiver.update();

        raw.publish(Topic::Join, "{\"peerId\":".to_string())
            .expect("publish");
        raw.publish(
            Topic::Join,
            serde_json::to_string(&JoinAnnouncement {
                peer_id: PeerId::new("ok"),
                join_timestamp: 1,
                reply: false,
            })
            .expect("encode"),
        )
        .expect("publish");
        receiver.update();

        let world = receiver.world();
        let joins = world.resource::<Messages<JoinAnnounced>>();
        assert_eq!(joins.iter_current_update_messages().count(), 1);
        let diagnostics = world.resource::<Messages<SyncDiagnostic>>();
        assert!(diagnostics
            .iter_current_update_messages()
            .any(|diagnostic| matches!(diagnostic, SyncDiagnostic::DecodeFailed { .. })));
    }
}
