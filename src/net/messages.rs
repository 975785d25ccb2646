//! Message contracts carried on the scene broadcast channel.
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    npc::components::{Appearance, NpcId, NpcPose, NpcRecord},
    presence::{JoinTimestamp, PeerId},
};

use super::errors::BusError;

/// Channel names on the scene bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Join,
    Appearance,
    Snapshot,
    Reset,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Join, Topic::Appearance, Topic::Snapshot, Topic::Reset];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::Join => "scene/join",
            Topic::Appearance => "scene/npc-appearance",
            Topic::Snapshot => "scene/npc-snapshot",
            Topic::Reset => "scene/npc-reset",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(value: WireVec3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl From<Quat> for WireQuat {
    fn from(value: Quat) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
            w: value.w,
        }
    }
}

impl From<WireQuat> for Quat {
    fn from(value: WireQuat) -> Self {
        let quat = Quat::from_xyzw(value.x, value.y, value.z, value.w);
        if quat.length_squared() > f32::EPSILON {
            quat.normalize()
        } else {
            Quat::IDENTITY
        }
    }
}

/// A peer announcing itself (or answering a newcomer's announcement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAnnouncement {
    pub peer_id: PeerId,
    pub join_timestamp: JoinTimestamp,
    /// Set on answers to a newcomer; answers never trigger answers or snapshots.
    #[serde(default)]
    pub reply: bool,
}

/// Full cosmetic and pose state of one NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceUpdate {
    pub npc_id: NpcId,
    pub wearables: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_tag: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<PeerId>,
    pub position: WireVec3,
    pub rotation: WireQuat,
}

impl AppearanceUpdate {
    pub fn from_record(record: &NpcRecord) -> Self {
        Self {
            npc_id: record.id,
            wearables: record.appearance.wearables.clone(),
            name: record.appearance.display_name.clone(),
            expression_tag: record.appearance.expression.clone(),
            owner_id: record.owner.clone(),
            position: record.pose.position.into(),
            rotation: record.pose.rotation.into(),
        }
    }

    pub fn appearance(&self) -> Appearance {
        Appearance {
            wearables: self.wearables.clone(),
            display_name: self.name.clone(),
            expression: self.expression_tag.clone(),
        }
    }

    pub fn pose(&self) -> NpcPose {
        NpcPose {
            position: self.position.into(),
            rotation: self.rotation.into(),
        }
    }
}

/// One NPC inside a full-state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcSnapshotEntry {
    pub npc_id: NpcId,
    pub wearables: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_tag: Option<String>,
    pub position: WireVec3,
    #[serde(
        default,
        deserialize_with = "deserialize_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<PeerId>,
}

impl NpcSnapshotEntry {
    pub fn from_record(record: &NpcRecord) -> Self {
        Self {
            npc_id: record.id,
            wearables: record.appearance.wearables.clone(),
            name: record.appearance.display_name.clone(),
            expression_tag: record.appearance.expression.clone(),
            position: record.pose.position.into(),
            owner_id: record.owner.clone(),
        }
    }

    pub fn appearance(&self) -> Appearance {
        Appearance {
            wearables: self.wearables.clone(),
            display_name: self.name.clone(),
            expression: self.expression_tag.clone(),
        }
    }
}

/// Registry state sent by the most senior peer to a newcomer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub target_peer_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_peer_id: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_joined_at: Option<JoinTimestamp>,
    pub npcs: Vec<NpcSnapshotEntry>,
}

impl StateSnapshot {
    /// `(senderJoinedAt, senderPeerId)` when the sender supplied both.
    pub fn seniority(&self) -> Option<(JoinTimestamp, &PeerId)> {
        self.sender_joined_at.zip(self.sender_peer_id.as_ref())
    }
}

/// Reads `ownerId`; `"undefined"`, blank strings and `null` mean unowned.
fn deserialize_owner<'de, D>(deserializer: D) -> Result<Option<PeerId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|owner| owner.trim().to_string())
        .filter(|owner| !owner.is_empty() && owner != "undefined")
        .map(PeerId::new))
}

/// Ask every peer to release NPCs bound to a player who left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetForDeparted {
    pub departed_peer_id: PeerId,
}

/// Any message that travels on the scene bus.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMessage {
    Join(JoinAnnouncement),
    Appearance(AppearanceUpdate),
    Snapshot(StateSnapshot),
    Reset(ResetForDeparted),
}

impl SceneMessage {
    pub fn topic(&self) -> Topic {
        match self {
            SceneMessage::Join(_) => Topic::Join,
            SceneMessage::Appearance(_) => Topic::Appearance,
            SceneMessage::Snapshot(_) => Topic::Snapshot,
            SceneMessage::Reset(_) => Topic::Reset,
        }
    }

    pub fn encode(&self) -> Result<String, BusError> {
        let encoded = match self {
            SceneMessage::Join(body) => serde_json::to_string(body),
            SceneMessage::Appearance(body) => serde_json::to_string(body),
            SceneMessage::Snapshot(body) => serde_json::to_string(body),
            SceneMessage::Reset(body) => serde_json::to_string(body),
        };
        encoded.map_err(|err| BusError::encode(self.topic(), err))
    }

    pub fn decode(topic: Topic, payload: &str) -> Result<Self, BusError> {
        let decoded = match topic {
            Topic::Join => serde_json::from_str(payload).map(SceneMessage::Join),
            Topic::Appearance => serde_json::from_str(payload).map(SceneMessage::Appearance),
            Topic::Snapshot => serde_json::from_str(payload).map(SceneMessage::Snapshot),
            Topic::Reset => serde_json::from_str(payload).map(SceneMessage::Reset),
        };
        decoded.map_err(|err| BusError::decode(topic, err))
    }
}
