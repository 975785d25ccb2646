//! Multi-peer scenarios: several scene apps wired to one loopback hub.
use std::time::Duration;

use bevy::{prelude::*, time::TimeUpdateStrategy};

use crate::{
    core::SimulationClock,
    diagnostics::{telemetry::SyncTelemetry, SyncDiagnostic},
    host::{
        components::{LocalPlayer, Player, PlayerProfile},
        events::PeerLeftScene,
    },
    net::{
        bus::{ActiveSceneBus, SceneBus},
        loopback::LoopbackHub,
        messages::{
            AppearanceUpdate, JoinAnnouncement, NpcSnapshotEntry, ResetForDeparted,
            SceneMessage, StateSnapshot, Topic,
        },
    },
    npc::{
        components::{NpcId, NpcRecord},
        registry::NpcRegistry,
    },
    presence::{PeerId, PresenceRoster},
    scene::{config::SceneConfig, ScenePlugin},
};

const SETTLE_ROUNDS: usize = 4;
const FAR_AWAY: Vec3 = Vec3::new(200.0, 40.0, 200.0);

fn scene_config() -> SceneConfig {
    let mut config = SceneConfig::default();
    config.npcs.count = 6;
    config.appearance.check_interval_seconds = 0.1;
    config.entry.teleport_destination = FAR_AWAY;
    config.telemetry.log_path = None;
    config.telemetry.capacity = 512;
    config
}

fn scene_app(
    hub: &LoopbackHub,
    local_player: LocalPlayer,
    epoch_millis: u64,
    config: SceneConfig,
) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(33)))
        .insert_resource(SimulationClock::new(1.0, epoch_millis))
        .insert_resource(ActiveSceneBus::new(Box::new(hub.endpoint())))
        .insert_resource(local_player)
        .add_plugins(ScenePlugin::with_config(config));
    app
}

fn profile(id: &str) -> LocalPlayer {
    LocalPlayer::new(
        PlayerProfile::new(id, id.to_uppercase()).with_wearables([format!("urn:{id}:jacket")]),
    )
}

fn peer_app(hub: &LoopbackHub, id: &str, epoch_millis: u64) -> App {
    scene_app(hub, profile(id), epoch_millis, scene_config())
}

fn publish(hub: &LoopbackHub, message: SceneMessage) {
    hub.endpoint()
        .publish(message.topic(), message.encode().expect("encode"))
        .expect("publish");
}

fn step(peers: &mut [&mut App], rounds: usize) {
    for _ in 0..rounds {
        for app in peers.iter_mut() {
            app.update();
        }
    }
}

fn npc(app: &App, id: u32) -> NpcRecord {
    app.world()
        .resource::<NpcRegistry>()
        .get(NpcId::new(id))
        .cloned()
        .expect("npc should be registered")
}

fn move_player(app: &mut App, position: Vec3) {
    let world = app.world_mut();
    let mut players = world.query_filtered::<&mut Transform, With<Player>>();
    let mut transform = players.single_mut(world).expect("local avatar");
    transform.translation = position;
}

fn diagnostics(app: &App) -> Vec<SyncDiagnostic> {
    app.world()
        .resource::<SyncTelemetry>()
        .records()
        .map(|record| record.event.clone())
        .collect()
}

fn assert_neutral(record: &NpcRecord) {
    assert!(record.owner.is_none());
    assert!(!record.influenced);
    assert_eq!(record.appearance.wearables, vec!["base-avatar-default"]);
    assert_eq!(record.appearance.expression.as_deref(), Some("idle"));
}

#[test]
fn presence_converges_and_oldest_peer_leads() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut b = peer_app(&hub, "b", 200_000);
    let mut c = peer_app(&hub, "c", 300_000);
    step(&mut [&mut a, &mut b, &mut c], SETTLE_ROUNDS);

    for app in [&a, &b, &c] {
        let roster = app.world().resource::<PresenceRoster>();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.leader(), Some(&PeerId::new("a")));
        assert_eq!(app.world().resource::<NpcRegistry>().len(), 6);
    }
}

#[test]
fn entering_and_leaving_radius_binds_then_releases() {
    let hub = LoopbackHub::new();
    let mut p = peer_app(&hub, "p", 100_000);
    let mut q = peer_app(&hub, "q", 200_000);
    step(&mut [&mut p, &mut q], SETTLE_ROUNDS);

    let target = npc(&p, 1000).pose.position;
    move_player(&mut p, target);
    step(&mut [&mut p, &mut q], 3);

    let bound = npc(&p, 1000);
    assert!(bound.influenced);
    assert_eq!(bound.owner, Some(PeerId::new("p")));
    assert_eq!(bound.appearance.wearables, vec!["urn:p:jacket"]);
    assert_eq!(bound.appearance.expression.as_deref(), Some("clap"));

    let mirrored = npc(&q, 1000);
    assert_eq!(mirrored.owner, Some(PeerId::new("p")));
    assert_eq!(mirrored.appearance.wearables, vec!["urn:p:jacket"]);
    assert!(!mirrored.influenced);

    let binds = diagnostics(&p)
        .into_iter()
        .filter(|event| {
            matches!(event, SyncDiagnostic::NpcBound { npc, .. } if *npc == NpcId::new(1000))
        })
        .count();
    assert_eq!(binds, 1);

    move_player(&mut p, FAR_AWAY);
    step(&mut [&mut p, &mut q], 2);

    assert_neutral(&npc(&p, 1000));
    assert_neutral(&npc(&q, 1000));
    assert!(diagnostics(&p).iter().any(|event| {
        matches!(event, SyncDiagnostic::NpcReleased { npc } if *npc == NpcId::new(1000))
    }));
}

#[test]
fn leader_resets_npcs_of_departed_peer() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut b = peer_app(&hub, "b", 200_000);
    step(&mut [&mut a, &mut b], SETTLE_ROUNDS);

    let target = npc(&b, 1000).pose.position;
    move_player(&mut b, target);
    step(&mut [&mut b, &mut a], 2);
    assert_eq!(npc(&a, 1000).owner, Some(PeerId::new("b")));

    a.world_mut().write_message(PeerLeftScene {
        peer: PeerId::new("b"),
    });
    a.update();

    assert_neutral(&npc(&a, 1000));
    assert!(!a
        .world()
        .resource::<PresenceRoster>()
        .contains(&PeerId::new("b")));
    assert!(diagnostics(&a).iter().any(|event| matches!(
        event,
        SyncDiagnostic::PeerDeparted { peer, acted_as_leader: true } if *peer == PeerId::new("b")
    )));
}

#[test]
fn broadcast_reset_is_idempotent_on_followers() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut b = peer_app(&hub, "b", 200_000);
    let mut c = peer_app(&hub, "c", 300_000);
    step(&mut [&mut a, &mut b, &mut c], SETTLE_ROUNDS);

    let target = npc(&b, 1000).pose.position;
    move_player(&mut b, target);
    step(&mut [&mut b, &mut a, &mut c], 2);
    assert_eq!(npc(&c, 1000).owner, Some(PeerId::new("b")));

    for app in [&mut a, &mut c] {
        app.world_mut().write_message(PeerLeftScene {
            peer: PeerId::new("b"),
        });
    }
    step(&mut [&mut a, &mut c], 2);

    assert!(diagnostics(&c).iter().any(|event| matches!(
        event,
        SyncDiagnostic::PeerDeparted { acted_as_leader: false, .. }
    )));
    assert_neutral(&npc(&c, 1000));
    let settled: Vec<NpcRecord> = c.world().resource::<NpcRegistry>().iter().cloned().collect();

    publish(
        &hub,
        SceneMessage::Reset(ResetForDeparted {
            departed_peer_id: PeerId::new("b"),
        }),
    );
    c.update();

    let replayed: Vec<NpcRecord> = c.world().resource::<NpcRegistry>().iter().cloned().collect();
    assert_eq!(settled, replayed);
}

#[test]
fn newcomer_gets_one_snapshot_from_the_leader() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut b = peer_app(&hub, "b", 200_000);
    step(&mut [&mut a, &mut b], SETTLE_ROUNDS);

    let target = npc(&a, 1000).pose.position;
    move_player(&mut a, target);
    step(&mut [&mut a, &mut b], 2);

    let mut c = peer_app(&hub, "c", 300_000);
    step(&mut [&mut a, &mut b, &mut c], SETTLE_ROUNDS);

    let sent_by = |app: &App| {
        diagnostics(app)
            .into_iter()
            .filter(|event| {
                matches!(event, SyncDiagnostic::SnapshotSent { target, .. } if *target == PeerId::new("c"))
            })
            .count()
    };
    assert_eq!(sent_by(&a), 1);
    assert_eq!(sent_by(&b), 0);

    assert!(diagnostics(&c).iter().any(|event| matches!(
        event,
        SyncDiagnostic::SnapshotApplied { sender, .. } if *sender == Some(PeerId::new("a"))
    )));
    let synced = npc(&c, 1000);
    assert_eq!(synced.owner, Some(PeerId::new("a")));
    assert_eq!(synced.appearance.wearables, vec!["urn:a:jacket"]);
}

#[test]
fn snapshots_for_others_or_from_juniors_are_ignored() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut c = peer_app(&hub, "c", 300_000);
    step(&mut [&mut a, &mut c], SETTLE_ROUNDS);
    let before = npc(&c, 1001);

    let mut forged = NpcSnapshotEntry::from_record(&before);
    forged.owner_id = Some(PeerId::new("z"));
    forged.wearables = vec!["urn:z:cape".to_string()];

    for (target, sender, sender_joined_at) in [("someone-else", "z", 0), ("c", "b", 250_000)] {
        publish(
            &hub,
            SceneMessage::Snapshot(StateSnapshot {
                target_peer_id: PeerId::new(target),
                sender_peer_id: Some(PeerId::new(sender)),
                sender_joined_at: Some(sender_joined_at),
                npcs: vec![forged.clone()],
            }),
        );
    }
    c.update();

    assert_eq!(npc(&c, 1001), before);
    let z = Some(PeerId::new("z"));
    let events = diagnostics(&c);
    assert!(events.iter().any(|event| matches!(
        event,
        SyncDiagnostic::SnapshotRejected { sender, .. } if *sender == Some(PeerId::new("b"))
    )));
    assert!(!events.iter().any(|event| match event {
        SyncDiagnostic::SnapshotApplied { sender, .. } => *sender == z,
        SyncDiagnostic::SnapshotRejected { sender, .. } => *sender == z,
        _ => false,
    }));
}

#[test]
fn snapshot_without_sender_fields_still_syncs_newcomer() {
    let hub = LoopbackHub::new();
    let mut c = peer_app(&hub, "c", 300_000);
    step(&mut [&mut c], SETTLE_ROUNDS);
    let position = npc(&c, 1000).pose.position;

    let raw = format!(
        r#"{{"targetPeerId":"c","npcs":[
            {{"npcId":1000,"wearables":["urn:a:hat"],"name":"A","expressionTag":"clap",
              "position":{{"x":{x},"y":{y},"z":{z}}},"ownerId":"a"}},
            {{"npcId":1001,"wearables":["base-avatar-default"],"name":"","expressionTag":"idle",
              "position":{{"x":{x},"y":{y},"z":{z}}},"ownerId":"undefined"}}
        ]}}"#,
        x = position.x,
        y = position.y,
        z = position.z
    );
    hub.endpoint()
        .publish(Topic::Snapshot, raw)
        .expect("publish");
    c.update();

    let synced = npc(&c, 1000);
    assert_eq!(synced.owner, Some(PeerId::new("a")));
    assert_eq!(synced.appearance.wearables, vec!["urn:a:hat"]);
    assert!(npc(&c, 1001).owner.is_none());
    assert!(diagnostics(&c).iter().any(|event| matches!(
        event,
        SyncDiagnostic::SnapshotApplied { sender: None, npcs: 2 }
    )));
    assert!(!diagnostics(&c)
        .iter()
        .any(|event| matches!(event, SyncDiagnostic::DecodeFailed { .. })));
}

#[test]
fn session_without_local_player_stays_silent() {
    let hub = LoopbackHub::new();
    let mut a = peer_app(&hub, "a", 100_000);
    let mut ghost = scene_app(&hub, LocalPlayer::default(), 50_000, scene_config());
    step(&mut [&mut a, &mut ghost], SETTLE_ROUNDS);

    let ghost_roster = ghost.world().resource::<PresenceRoster>();
    assert!(ghost_roster.local().is_none());
    assert!(ghost_roster.is_empty());
    let a_roster = a.world().resource::<PresenceRoster>();
    assert_eq!(a_roster.len(), 1);
    assert_eq!(a_roster.leader(), Some(&PeerId::new("a")));

    let target = npc(&ghost, 1000).pose.position;
    move_player(&mut ghost, target);
    let b_hat = NpcRecord {
        owner: Some(PeerId::new("b")),
        ..npc(&ghost, 1001)
    };
    publish(
        &hub,
        SceneMessage::Appearance(AppearanceUpdate::from_record(&b_hat)),
    );
    publish(
        &hub,
        SceneMessage::Join(JoinAnnouncement {
            peer_id: PeerId::new("c"),
            join_timestamp: 300_000,
            reply: false,
        }),
    );
    publish(
        &hub,
        SceneMessage::Reset(ResetForDeparted {
            departed_peer_id: PeerId::new("b"),
        }),
    );
    ghost.world_mut().write_message(PeerLeftScene {
        peer: PeerId::new("a"),
    });
    step(&mut [&mut ghost, &mut a], 3);

    assert!(npc(&ghost, 1000).owner.is_none());
    assert!(!npc(&ghost, 1000).influenced);
    assert!(npc(&ghost, 1001).owner.is_none());
    assert!(npc(&a, 1000).owner.is_none());
    assert!(diagnostics(&ghost).iter().all(|event| !matches!(
        event,
        SyncDiagnostic::PeerJoined { .. }
            | SyncDiagnostic::PeerDeparted { .. }
            | SyncDiagnostic::ResetApplied { .. }
            | SyncDiagnostic::SnapshotSent { .. }
            | SyncDiagnostic::SnapshotApplied { .. }
            | SyncDiagnostic::NpcBound { .. }
    )));
    assert!(diagnostics(&a)
        .iter()
        .all(|event| !matches!(event, SyncDiagnostic::NpcBound { .. })));
    assert_eq!(a.world().resource::<PresenceRoster>().len(), 2);
}

#[test]
fn outfit_change_before_first_interval_reaches_bound_npcs() {
    let hub = LoopbackHub::new();
    let mut config = scene_config();
    config.appearance.check_interval_seconds = 3.0;
    let mut p = scene_app(&hub, profile("p"), 100_000, config.clone());
    let mut q = scene_app(&hub, profile("q"), 200_000, config);
    step(&mut [&mut p, &mut q], SETTLE_ROUNDS);

    let target = npc(&p, 1000).pose.position;
    move_player(&mut p, target);
    step(&mut [&mut p, &mut q], 2);
    assert_eq!(npc(&p, 1000).appearance.wearables, vec!["urn:p:jacket"]);

    if let Some(profile) = p.world_mut().resource_mut::<LocalPlayer>().profile_mut() {
        profile.wearables = vec!["urn:p:raincoat".to_string()];
    }
    step(&mut [&mut p, &mut q], 120);

    assert_eq!(npc(&p, 1000).appearance.wearables, vec!["urn:p:raincoat"]);
    assert_eq!(npc(&q, 1000).appearance.wearables, vec!["urn:p:raincoat"]);
}

#[test]
fn bound_npcs_follow_outfit_changes() {
    let hub = LoopbackHub::new();
    let mut p = peer_app(&hub, "p", 100_000);
    let mut q = peer_app(&hub, "q", 200_000);
    step(&mut [&mut p, &mut q], SETTLE_ROUNDS);

    let target = npc(&p, 1000).pose.position;
    move_player(&mut p, target);
    step(&mut [&mut p, &mut q], 8);

    if let Some(profile) = p.world_mut().resource_mut::<LocalPlayer>().profile_mut() {
        profile.wearables = vec!["urn:p:raincoat".to_string()];
    }
    step(&mut [&mut p, &mut q], 8);

    assert_eq!(npc(&p, 1000).appearance.wearables, vec!["urn:p:raincoat"]);
    assert_eq!(npc(&p, 1000).appearance.expression.as_deref(), Some("clap"));
    assert_eq!(npc(&q, 1000).appearance.wearables, vec!["urn:p:raincoat"]);
    assert!(diagnostics(&p).iter().any(|event| matches!(
        event,
        SyncDiagnostic::CosmeticsChanged { rebroadcast } if *rebroadcast >= 1
    )));
}
