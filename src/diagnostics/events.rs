//! Protocol decisions surfaced for logging and telemetry.
use bevy::prelude::Message;
use serde::Serialize;

use crate::{
    net::messages::Topic,
    npc::components::NpcId,
    presence::{JoinTimestamp, PeerId},
};

/// Emitted whenever a sync decision is taken or a message is dropped.
#[derive(Message, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SyncDiagnostic {
    PeerJoined {
        peer: PeerId,
        joined_at: JoinTimestamp,
        reply: bool,
    },
    PeerDeparted {
        peer: PeerId,
        acted_as_leader: bool,
    },
    ResetApplied {
        departed: PeerId,
        reverted: Vec<NpcId>,
    },
    SnapshotSent {
        target: PeerId,
        npcs: usize,
    },
    SnapshotApplied {
        sender: Option<PeerId>,
        npcs: usize,
    },
    SnapshotRejected {
        sender: Option<PeerId>,
        reason: String,
    },
    NpcBound {
        npc: NpcId,
        owner: PeerId,
    },
    NpcReleased {
        npc: NpcId,
    },
    CosmeticsChanged {
        rebroadcast: usize,
    },
    DecodeFailed {
        topic: Topic,
        error: String,
    },
    PublishFailed {
        topic: Topic,
        error: String,
    },
}

impl SyncDiagnostic {
    /// Short label used by log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PeerJoined { .. } => "peer_joined",
            Self::PeerDeparted { .. } => "peer_departed",
            Self::ResetApplied { .. } => "reset_applied",
            Self::SnapshotSent { .. } => "snapshot_sent",
            Self::SnapshotApplied { .. } => "snapshot_applied",
            Self::SnapshotRejected { .. } => "snapshot_rejected",
            Self::NpcBound { .. } => "npc_bound",
            Self::NpcReleased { .. } => "npc_released",
            Self::CosmeticsChanged { .. } => "cosmetics_changed",
            Self::DecodeFailed { .. } => "decode_failed",
            Self::PublishFailed { .. } => "publish_failed",
        }
    }
}
