//! NPC records and supporting resources.
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{presence::PeerId, scene::config::AppearanceConfig};

/// Stable identifier for an NPC, shared by every peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(u32);

impl NpcId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[allow(dead_code)]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NPC-{:04}", self.0)
    }
}

/// Position and orientation of an NPC avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl NpcPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Cosmetic descriptor rendered by the host avatar system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub wearables: Vec<String>,
    pub display_name: String,
    pub expression: Option<String>,
}

/// One NPC actor as seen by the local peer.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcRecord {
    pub id: NpcId,
    pub pose: NpcPose,
    pub appearance: Appearance,
    /// `None` is the unowned sentinel.
    pub owner: Option<PeerId>,
    /// Whether the local player currently stands in this NPC's radius.
    pub influenced: bool,
}

impl NpcRecord {
    pub fn neutral(id: NpcId, pose: NpcPose, palette: &AppearancePalette) -> Self {
        Self {
            id,
            pose,
            appearance: palette.neutral(),
            owner: None,
            influenced: false,
        }
    }

    pub fn is_owned_by(&self, peer: &PeerId) -> bool {
        self.owner.as_ref() == Some(peer)
    }
}

/// Looks applied to NPCs when they are released or bound.
#[derive(Resource, Debug, Clone)]
pub struct AppearancePalette {
    pub default_wearables: Vec<String>,
    pub idle_expression: String,
    pub bound_expression: String,
}

impl AppearancePalette {
    pub fn neutral(&self) -> Appearance {
        Appearance {
            wearables: self.default_wearables.clone(),
            display_name: String::new(),
            expression: Some(self.idle_expression.clone()),
        }
    }

    pub fn bound(&self, wearables: &[String], display_name: &str) -> Appearance {
        Appearance {
            wearables: wearables.to_vec(),
            display_name: display_name.to_string(),
            expression: Some(self.bound_expression.clone()),
        }
    }
}

impl From<&AppearanceConfig> for AppearancePalette {
    fn from(config: &AppearanceConfig) -> Self {
        Self {
            default_wearables: config.default_wearables.clone(),
            idle_expression: config.idle_expression.clone(),
            bound_expression: config.bound_expression.clone(),
        }
    }
}

impl Default for AppearancePalette {
    fn default() -> Self {
        Self::from(&AppearanceConfig {
            check_interval_seconds: 3.0,
            default_wearables: vec!["base-avatar-default".to_string()],
            idle_expression: "idle".to_string(),
            bound_expression: "clap".to_string(),
        })
    }
}

/// Issues sequential NPC ids starting at the configured base.
#[derive(Debug, Clone, Copy)]
pub struct NpcIdGenerator {
    next: u32,
}

impl NpcIdGenerator {
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> NpcId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        NpcId::new(id)
    }
}
